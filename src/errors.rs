use thiserror::Error;

/// Errors returned from the [`Ledger`](crate::ledger::Ledger).
///
/// Informational outcomes such as an unknown stock are not errors; they are
/// reported through [`TransactionOutcome`](crate::ledger::TransactionOutcome).
/// The only failure is a guard left poisoned by a thread that panicked while
/// holding it.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// A ledger or entry lock was poisoned.
    #[error("Ledger lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Errors produced while reading a transaction request from a connection.
#[derive(Error, Debug)]
pub enum RequestError {
    /// The request line or headers could not be read from the stream.
    #[error("Failed to read request: {0}")]
    Io(#[from] std::io::Error),

    /// A field cannot be carried in the query string without being split.
    #[error("Invalid request field: {0}")]
    InvalidField(String),
}

/// Errors produced by the HTTP server subsystem.
///
/// These include I/O errors, malformed requests, and errors propagated
/// from the underlying [`Ledger`](crate::ledger::Ledger).
#[derive(Error, Debug)]
pub enum HttpServerError {
    /// The TCP listener failed to bind to the specified address/port.
    #[error("Failed to bind TCP listener: {0}")]
    BindError(String),

    /// Error while accepting an incoming TCP client connection.
    #[error("Failed to accept TCP connection: {0}")]
    AcceptError(String),

    /// I/O error during communication with a specific client.
    #[error("Client IO error: {0}")]
    ClientIoError(String),

    /// The request could not be read from the client.
    #[error("Request error: {0}")]
    RequestError(#[from] RequestError),

    /// An error from the ledger bubbled up into the HTTP layer.
    #[error("Ledger error: {0}")]
    LedgerError(#[from] LedgerError),
}

/// High-level errors returned by the server and client binaries.
#[derive(Error, Debug)]
pub enum CliError {
    /// General wrapper around any textual failure.
    #[error("Cli failed with error: {0}")]
    GeneralError(String),
}

impl From<HttpServerError> for CliError {
    fn from(err: HttpServerError) -> Self {
        CliError::GeneralError(err.to_string())
    }
}
