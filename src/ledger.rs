use crate::errors::LedgerError;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Informational result of a single transaction.
///
/// Every ledger operation "succeeds" at the call level; whether the stock
/// existed, was created, or was missing is reported through this value.
/// Its [`Display`](fmt::Display) form is the exact text sent back to clients.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionOutcome {
    /// A new stock was inserted with its starting balance.
    Created {
        /// Stock name.
        name: String,
        /// Starting balance.
        balance: i64,
    },
    /// `create` was called for a stock that is already in the ledger.
    AlreadyExists {
        /// Stock name.
        name: String,
    },
    /// A buy or sell was applied to the stock's balance.
    Updated {
        /// Stock name.
        name: String,
    },
    /// Current balance of a stock.
    Balance {
        /// Stock name.
        name: String,
        /// Balance observed under the entry guard.
        balance: i64,
    },
    /// The requested stock is not in the ledger.
    NotFound,
    /// All stocks were discarded.
    Reset,
    /// The operation token was not recognized.
    InvalidRequest,
}

impl fmt::Display for TransactionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionOutcome::Created { name, balance } => {
                write!(f, "Stock {} created with balance = {}", name, balance)
            }
            TransactionOutcome::AlreadyExists { name } => write!(f, "Stock {} already exists", name),
            TransactionOutcome::Updated { name } => write!(f, "Stock {}'s balance updated", name),
            TransactionOutcome::Balance { name, balance } => {
                write!(f, "Balance for stock {} = {}", name, balance)
            }
            TransactionOutcome::NotFound => f.write_str("Stock not found"),
            TransactionOutcome::Reset => f.write_str("Stocks reset"),
            TransactionOutcome::InvalidRequest => f.write_str(crate::defs::INVALID_REQUEST),
        }
    }
}

/// One named balance together with its own guard.
#[derive(Debug)]
struct StockEntry {
    name: String,
    balance: Mutex<i64>,
}

impl StockEntry {
    fn new(name: &str, balance: i64) -> Self {
        Self {
            name: name.to_string(),
            balance: Mutex::new(balance),
        }
    }

    fn lock_balance(&self) -> Result<MutexGuard<'_, i64>, LedgerError> {
        self.balance
            .lock()
            .map_err(|_| LedgerError::LockPoisoned(format!("entry {}", self.name)))
    }
}

/// Shared registry of named stock balances.
///
/// Locking is two-tiered:
///
/// - the map sits behind an [`RwLock`]; its write side is the structural
///   guard, taken only to insert a new stock or to reset the ledger;
/// - every entry carries its own [`Mutex`], taken while the balance is read
///   or mutated.
///
/// Buy, sell, and status hold the *shared* side of the map lock while they
/// work on one entry, so operations on different stocks never contend, while
/// a reset cannot clear the map until they have finished and no new one can
/// start once the reset holds the write side. An entry is never handed out of
/// the ledger, so nothing can mutate it after it has been discarded.
///
/// # Example
///
/// ```
/// use stock_exchange::ledger::{Ledger, TransactionOutcome};
///
/// let ledger = Ledger::new();
/// ledger.create("MSFT", 10).unwrap();
/// ledger.debit("MSFT", 3).unwrap();
/// assert_eq!(
///     ledger.status("MSFT").unwrap(),
///     TransactionOutcome::Balance { name: "MSFT".into(), balance: 7 }
/// );
/// ```
#[derive(Debug, Default)]
pub struct Ledger {
    entries: RwLock<HashMap<String, StockEntry>>,
}

impl Ledger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `name` with a starting balance of `amount`.
    ///
    /// The existence check and the insertion happen under the structural
    /// guard, so of several concurrent creators of the same new name exactly
    /// one observes [`TransactionOutcome::Created`] and the rest observe
    /// [`TransactionOutcome::AlreadyExists`]. An existing stock is never
    /// overwritten.
    pub fn create(&self, name: &str, amount: i64) -> Result<TransactionOutcome, LedgerError> {
        // Existing names are answered without touching the structural guard.
        if self.read_entries()?.contains_key(name) {
            log::debug!("create: stock {} already exists", name);
            return Ok(TransactionOutcome::AlreadyExists {
                name: name.to_string(),
            });
        }

        let mut entries = self.write_entries()?;
        match entries.entry(name.to_string()) {
            Entry::Occupied(_) => {
                log::debug!("create: stock {} created concurrently by another caller", name);
                Ok(TransactionOutcome::AlreadyExists {
                    name: name.to_string(),
                })
            }
            Entry::Vacant(slot) => {
                slot.insert(StockEntry::new(name, amount));
                log::info!("Stock {} created with balance {}", name, amount);
                Ok(TransactionOutcome::Created {
                    name: name.to_string(),
                    balance: amount,
                })
            }
        }
    }

    /// Subtracts `amount` from the balance of `name` (a buy).
    ///
    /// No lower bound is enforced; the balance may go negative.
    pub fn debit(&self, name: &str, amount: i64) -> Result<TransactionOutcome, LedgerError> {
        self.update(name, |balance| balance.wrapping_sub(amount))
    }

    /// Adds `amount` to the balance of `name` (a sell).
    pub fn credit(&self, name: &str, amount: i64) -> Result<TransactionOutcome, LedgerError> {
        self.update(name, |balance| balance.wrapping_add(amount))
    }

    /// Reports the current balance of `name`.
    pub fn status(&self, name: &str) -> Result<TransactionOutcome, LedgerError> {
        let entries = self.read_entries()?;
        let Some(entry) = entries.get(name) else {
            return Ok(TransactionOutcome::NotFound);
        };
        let balance = *entry.lock_balance()?;
        Ok(TransactionOutcome::Balance {
            name: entry.name.clone(),
            balance,
        })
    }

    /// Discards every stock.
    ///
    /// Always yields [`TransactionOutcome::Reset`]; `Err` only reports a
    /// poisoned structural guard.
    pub fn reset(&self) -> Result<TransactionOutcome, LedgerError> {
        let mut entries = self.write_entries()?;
        let discarded = entries.len();
        entries.clear();
        log::info!("Ledger reset, {} stocks discarded", discarded);
        Ok(TransactionOutcome::Reset)
    }

    /// Number of stocks currently in the ledger.
    pub fn len(&self) -> Result<usize, LedgerError> {
        Ok(self.read_entries()?.len())
    }

    /// Returns `true` if the ledger holds no stocks.
    pub fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.read_entries()?.is_empty())
    }

    /// Applies `apply` to the balance of `name` under its entry guard.
    fn update<F>(&self, name: &str, apply: F) -> Result<TransactionOutcome, LedgerError>
    where
        F: FnOnce(i64) -> i64,
    {
        let entries = self.read_entries()?;
        let Some(entry) = entries.get(name) else {
            log::debug!("update: stock {} not found", name);
            return Ok(TransactionOutcome::NotFound);
        };

        let mut balance = entry.lock_balance()?;
        *balance = apply(*balance);
        log::debug!("Stock {} balance now {}", entry.name, *balance);

        Ok(TransactionOutcome::Updated {
            name: entry.name.clone(),
        })
    }

    fn read_entries(&self) -> Result<RwLockReadGuard<'_, HashMap<String, StockEntry>>, LedgerError> {
        self.entries
            .read()
            .map_err(|_| LedgerError::LockPoisoned("ledger entries".into()))
    }

    fn write_entries(
        &self,
    ) -> Result<RwLockWriteGuard<'_, HashMap<String, StockEntry>>, LedgerError> {
        self.entries
            .write()
            .map_err(|_| LedgerError::LockPoisoned("ledger entries".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn balance_of(ledger: &Ledger, name: &str) -> i64 {
        match ledger.status(name).unwrap() {
            TransactionOutcome::Balance { balance, .. } => balance,
            other => panic!("Expected balance for {}, got {:?}", name, other),
        }
    }

    #[test]
    fn test_create_then_status() {
        let ledger = Ledger::new();
        let outcome = ledger.create("AAPL", 10).unwrap();
        assert_eq!(outcome.to_string(), "Stock AAPL created with balance = 10");
        assert_eq!(
            ledger.status("AAPL").unwrap().to_string(),
            "Balance for stock AAPL = 10"
        );
    }

    #[test]
    fn test_create_twice_keeps_first_balance() {
        let ledger = Ledger::new();
        ledger.create("AAPL", 10).unwrap();

        let second = ledger.create("AAPL", 99).unwrap();
        assert_eq!(second.to_string(), "Stock AAPL already exists");
        assert_eq!(balance_of(&ledger, "AAPL"), 10);
        assert_eq!(ledger.len().unwrap(), 1);
    }

    #[test]
    fn test_debit_and_credit() {
        let ledger = Ledger::new();
        ledger.create("MSFT", 5).unwrap();

        let outcome = ledger.debit("MSFT", 3).unwrap();
        assert_eq!(outcome.to_string(), "Stock MSFT's balance updated");
        assert_eq!(balance_of(&ledger, "MSFT"), 2);

        ledger.credit("MSFT", 10).unwrap();
        assert_eq!(balance_of(&ledger, "MSFT"), 12);
    }

    #[test]
    fn test_balance_may_go_negative() {
        let ledger = Ledger::new();
        ledger.create("TSLA", 1).unwrap();
        ledger.debit("TSLA", 5).unwrap();
        assert_eq!(balance_of(&ledger, "TSLA"), -4);
    }

    #[test]
    fn test_negative_amounts_are_applied_as_given() {
        let ledger = Ledger::new();
        ledger.create("TSLA", 0).unwrap();
        ledger.debit("TSLA", -7).unwrap();
        assert_eq!(balance_of(&ledger, "TSLA"), 7);
    }

    #[test]
    fn test_overflow_wraps_instead_of_panicking() {
        let ledger = Ledger::new();
        ledger.create("BIG", i64::MAX).unwrap();
        ledger.credit("BIG", 1).unwrap();
        assert_eq!(balance_of(&ledger, "BIG"), i64::MIN);
    }

    #[test]
    fn test_missing_stock_reports_not_found() {
        let ledger = Ledger::new();
        assert_eq!(ledger.status("NOPE").unwrap(), TransactionOutcome::NotFound);
        assert_eq!(ledger.debit("NOPE", 1).unwrap(), TransactionOutcome::NotFound);
        assert_eq!(ledger.credit("NOPE", 1).unwrap(), TransactionOutcome::NotFound);
        assert_eq!(TransactionOutcome::NotFound.to_string(), "Stock not found");
        assert!(ledger.is_empty().unwrap());
    }

    #[test]
    fn test_reset_discards_all_stocks() {
        let ledger = Ledger::new();
        ledger.create("AAPL", 1).unwrap();
        ledger.create("GOOG", 2).unwrap();

        assert_eq!(ledger.reset().unwrap().to_string(), "Stocks reset");
        assert_eq!(ledger.status("AAPL").unwrap(), TransactionOutcome::NotFound);
        assert_eq!(ledger.status("GOOG").unwrap(), TransactionOutcome::NotFound);
        assert!(ledger.is_empty().unwrap());

        // A name can be created afresh after a reset.
        ledger.create("AAPL", 42).unwrap();
        assert_eq!(balance_of(&ledger, "AAPL"), 42);
    }

    #[test]
    fn test_concurrent_debits_lose_no_updates() {
        const THREADS: i64 = 64;
        const PER_THREAD: i64 = 250;

        let ledger = Arc::new(Ledger::new());
        ledger.create("AAPL", THREADS * PER_THREAD).unwrap();
        let barrier = Arc::new(Barrier::new(THREADS as usize));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let ledger = ledger.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    for _ in 0..PER_THREAD {
                        ledger.debit("AAPL", 1).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(balance_of(&ledger, "AAPL"), 0);
    }

    #[test]
    fn test_concurrent_create_has_single_winner() {
        const THREADS: usize = 32;

        let ledger = Arc::new(Ledger::new());
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let ledger = ledger.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    ledger.create("NEW", i as i64).unwrap()
                })
            })
            .collect();

        let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let winners: Vec<_> = outcomes
            .iter()
            .filter_map(|o| match o {
                TransactionOutcome::Created { balance, .. } => Some(*balance),
                _ => None,
            })
            .collect();
        assert_eq!(winners.len(), 1);

        let losers = outcomes
            .iter()
            .filter(|o| matches!(o, TransactionOutcome::AlreadyExists { .. }))
            .count();
        assert_eq!(losers, THREADS - 1);

        assert_eq!(ledger.len().unwrap(), 1);
        assert_eq!(balance_of(&ledger, "NEW"), winners[0]);
    }

    #[test]
    fn test_distinct_keys_are_independent() {
        const ROUNDS: i64 = 5_000;

        let ledger = Arc::new(Ledger::new());
        ledger.create("BUY", 0).unwrap();
        ledger.create("SELL", 0).unwrap();

        let buyer = {
            let ledger = ledger.clone();
            thread::spawn(move || {
                for _ in 0..ROUNDS {
                    ledger.debit("BUY", 1).unwrap();
                    assert!(balance_of(&ledger, "SELL") >= 0);
                }
            })
        };
        let seller = {
            let ledger = ledger.clone();
            thread::spawn(move || {
                for _ in 0..ROUNDS {
                    ledger.credit("SELL", 1).unwrap();
                    assert!(balance_of(&ledger, "BUY") <= 0);
                }
            })
        };

        buyer.join().unwrap();
        seller.join().unwrap();

        assert_eq!(balance_of(&ledger, "BUY"), -ROUNDS);
        assert_eq!(balance_of(&ledger, "SELL"), ROUNDS);
    }

    #[test]
    fn test_create_racing_reset_leaves_consistent_ledger() {
        const CREATORS: usize = 8;
        const NAMES_PER_CREATOR: usize = 200;

        let ledger = Arc::new(Ledger::new());
        let barrier = Arc::new(Barrier::new(CREATORS + 1));
        let starting_balance = |t: usize, i: usize| (t * 1_000 + i) as i64;

        let creators: Vec<_> = (0..CREATORS)
            .map(|t| {
                let ledger = ledger.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    for i in 0..NAMES_PER_CREATOR {
                        let outcome = ledger
                            .create(&format!("S{}_{}", t, i), starting_balance(t, i))
                            .unwrap();
                        assert!(matches!(outcome, TransactionOutcome::Created { .. }));
                    }
                })
            })
            .collect();

        let resetter = {
            let ledger = ledger.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..50 {
                    assert_eq!(ledger.reset().unwrap(), TransactionOutcome::Reset);
                    thread::yield_now();
                }
            })
        };

        for handle in creators {
            handle.join().unwrap();
        }
        resetter.join().unwrap();

        let mut found = 0;
        for t in 0..CREATORS {
            for i in 0..NAMES_PER_CREATOR {
                match ledger.status(&format!("S{}_{}", t, i)).unwrap() {
                    TransactionOutcome::NotFound => {}
                    TransactionOutcome::Balance { balance, .. } => {
                        assert_eq!(balance, starting_balance(t, i));
                        found += 1;
                    }
                    other => panic!("Unexpected outcome {:?}", other),
                }
            }
        }
        assert_eq!(ledger.len().unwrap(), found);
    }

    #[test]
    fn test_reset_during_updates_does_not_resurrect_stock() {
        const THREADS: usize = 8;

        let ledger = Arc::new(Ledger::new());
        ledger.create("AAPL", 1_000).unwrap();
        let barrier = Arc::new(Barrier::new(THREADS + 1));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let ledger = ledger.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    for _ in 0..500 {
                        let outcome = ledger.debit("AAPL", 1).unwrap();
                        assert!(matches!(
                            outcome,
                            TransactionOutcome::Updated { .. } | TransactionOutcome::NotFound
                        ));
                    }
                })
            })
            .collect();

        barrier.wait();
        ledger.reset().unwrap();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(ledger.status("AAPL").unwrap(), TransactionOutcome::NotFound);
        assert!(ledger.is_empty().unwrap());
    }
}
