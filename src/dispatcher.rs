use crate::errors::LedgerError;
use crate::ledger::{Ledger, TransactionOutcome};

use std::sync::Arc;

/// The five transactions a client may request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transaction {
    /// Insert a new stock with a starting balance.
    Create,
    /// Subtract the amount from a stock's balance.
    Buy,
    /// Add the amount to a stock's balance.
    Sell,
    /// Report a stock's balance.
    Status,
    /// Discard every stock.
    Reset,
}

impl Transaction {
    /// Decodes an operation token. Matching is exact and case-sensitive.
    ///
    /// # Example
    ///
    /// ```
    /// use stock_exchange::dispatcher::Transaction;
    /// assert_eq!(Transaction::parse("buy"), Some(Transaction::Buy));
    /// assert_eq!(Transaction::parse("BUY"), None);
    /// ```
    pub fn parse(operation: &str) -> Option<Self> {
        match operation {
            "create" => Some(Transaction::Create),
            "buy" => Some(Transaction::Buy),
            "sell" => Some(Transaction::Sell),
            "status" => Some(Transaction::Status),
            "reset" => Some(Transaction::Reset),
            _ => None,
        }
    }

    /// Runs this transaction against `ledger`. `amount` is ignored by
    /// `Status` and `Reset`.
    pub fn execute(
        self,
        ledger: &Ledger,
        stock: &str,
        amount: i64,
    ) -> Result<TransactionOutcome, LedgerError> {
        match self {
            Transaction::Create => ledger.create(stock, amount),
            Transaction::Buy => ledger.debit(stock, amount),
            Transaction::Sell => ledger.credit(stock, amount),
            Transaction::Status => ledger.status(stock),
            Transaction::Reset => ledger.reset(),
        }
    }
}

/// Maps operation tokens onto [`Ledger`] calls.
///
/// Holds nothing but a handle to the ledger and takes no lock of its own,
/// so one dispatcher may be cloned into every connection thread.
#[derive(Clone, Debug)]
pub struct TransactionDispatcher {
    ledger: Arc<Ledger>,
}

impl TransactionDispatcher {
    /// Creates a dispatcher working on `ledger`.
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self { ledger }
    }

    /// Decodes `operation` and applies it, returning the typed outcome.
    ///
    /// Unknown operations yield [`TransactionOutcome::InvalidRequest`]
    /// without touching the ledger.
    pub fn dispatch(
        &self,
        operation: &str,
        stock: &str,
        amount: i64,
    ) -> Result<TransactionOutcome, LedgerError> {
        match Transaction::parse(operation) {
            Some(transaction) => {
                log::debug!(
                    "Dispatching {:?} for stock '{}' amount {}",
                    transaction,
                    stock,
                    amount
                );
                transaction.execute(&self.ledger, stock, amount)
            }
            None => {
                log::debug!("Unknown operation '{}'", operation);
                Ok(TransactionOutcome::InvalidRequest)
            }
        }
    }

    /// Decodes `operation`, applies it, and returns the outcome text.
    ///
    /// Not-found, already-exists and unknown operations are all `Ok` text.
    /// `Err` only means a ledger lock was poisoned by a panicking thread;
    /// the transaction outcome is then unknown.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use stock_exchange::dispatcher::TransactionDispatcher;
    /// use stock_exchange::ledger::Ledger;
    ///
    /// let dispatcher = TransactionDispatcher::new(Arc::new(Ledger::new()));
    /// dispatcher.process("create", "X", 10).unwrap();
    /// assert_eq!(dispatcher.process("status", "X", 0).unwrap(), "Balance for stock X = 10");
    /// assert_eq!(dispatcher.process("bogus", "X", 5).unwrap(), "Invalid request");
    /// ```
    pub fn process(&self, operation: &str, stock: &str, amount: i64) -> Result<String, LedgerError> {
        Ok(self.dispatch(operation, stock, amount)?.to_string())
    }
}
