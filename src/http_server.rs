use crate::defs::{CLIENT_READ_TIMEOUT_SEC, INVALID_REQUEST, response_header};
use crate::dispatcher::TransactionDispatcher;
use crate::errors::HttpServerError;
use crate::ledger::Ledger;
use crate::request::read_request;
use crate::worker_limit::WorkerLimit;

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// HTTP server that applies one stock transaction per connection.
///
/// Every accepted connection is handed to its own detached thread, which
/// reads the request, runs it through the [`TransactionDispatcher`], writes
/// the response, and closes the connection.
pub struct HttpServer {
    /// TCP listener socket
    listener: TcpListener,

    /// Dispatcher cloned into each connection thread
    dispatcher: TransactionDispatcher,

    /// Cap on concurrently running connection threads
    workers: WorkerLimit,
}

impl HttpServer {
    /// Creates a new server bound to the given address.
    ///
    /// # Arguments
    /// * `addr` - Address to bind, e.g., `"127.0.0.1:8080"`.
    /// * `ledger` - Shared ledger all transactions are applied to.
    /// * `max_threads` - Optional cap on active connection threads.
    ///
    /// # Returns
    /// * `Ok(HttpServer)` if binding succeeds.
    /// * `Err(HttpServerError::BindError)` if the port is unavailable.
    pub fn new(
        addr: &str,
        ledger: Arc<Ledger>,
        max_threads: Option<usize>,
    ) -> Result<Self, HttpServerError> {
        log::info!("Binding HTTP server to address: {}", addr);
        let listener =
            TcpListener::bind(addr).map_err(|e| HttpServerError::BindError(e.to_string()))?;
        log::info!("HTTP server successfully bound to: {}", addr);

        Ok(Self {
            listener,
            dispatcher: TransactionDispatcher::new(ledger),
            workers: WorkerLimit::new(max_threads),
        })
    }

    /// Address the listener is actually bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, HttpServerError> {
        self.listener
            .local_addr()
            .map_err(|e| HttpServerError::BindError(e.to_string()))
    }

    /// Runs the accept loop forever.
    ///
    /// When a thread cap is configured and reached, the loop waits for a
    /// running connection to finish before accepting the next one.
    pub fn start(&self) -> Result<(), HttpServerError> {
        log::info!("HTTP server starting main loop");
        loop {
            let permit = self.workers.acquire();
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    log::debug!("New connection from: {}", addr);
                    let dispatcher = self.dispatcher.clone();
                    thread::spawn(move || {
                        let _permit = permit;
                        if let Err(e) = handle_connection(stream, addr, &dispatcher) {
                            log::warn!("Connection handler error for {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    log::error!("Failed to accept TCP connection: {}", e);
                    return Err(HttpServerError::AcceptError(e.to_string()));
                }
            }
        }
    }
}

/// Handles a single client connection: one request, one response.
///
/// If the request cannot be read or the ledger fails, the client still gets
/// a framed `Invalid request` body before the error is reported.
fn handle_connection(
    mut stream: TcpStream,
    addr: SocketAddr,
    dispatcher: &TransactionDispatcher,
) -> Result<(), HttpServerError> {
    stream
        .set_read_timeout(Some(Duration::from_secs(CLIENT_READ_TIMEOUT_SEC)))
        .map_err(|e| HttpServerError::ClientIoError(e.to_string()))?;

    let cloned = stream
        .try_clone()
        .map_err(|e| HttpServerError::ClientIoError(e.to_string()))?;
    let mut reader = BufReader::new(cloned);

    let result = serve_request(&mut reader, addr, dispatcher);
    respond(&mut stream, result)
}

/// Reads the request and runs it, returning the response body.
fn serve_request<R: BufRead>(
    reader: &mut R,
    addr: SocketAddr,
    dispatcher: &TransactionDispatcher,
) -> Result<String, HttpServerError> {
    let request = read_request(reader)?;
    let body = dispatcher.process(&request.operation, &request.stock, request.amount)?;
    log::info!(
        "[{}] {} {} {} -> {}",
        addr,
        request.operation,
        request.stock,
        request.amount,
        body
    );
    Ok(body)
}

/// Writes the body on success; on failure writes [`INVALID_REQUEST`] and
/// returns the original error.
fn respond<W: Write>(
    out: &mut W,
    result: Result<String, HttpServerError>,
) -> Result<(), HttpServerError> {
    match result {
        Ok(body) => write_response(out, &body),
        Err(e) => {
            if let Err(write_err) = write_response(out, INVALID_REQUEST) {
                log::debug!("Could not send error response: {}", write_err);
            }
            Err(e)
        }
    }
}

/// Writes the HTTP header followed by `body`.
fn write_response<W: Write>(out: &mut W, body: &str) -> Result<(), HttpServerError> {
    let header = response_header(body.len());
    out.write_all(header.as_bytes())
        .and_then(|_| out.write_all(body.as_bytes()))
        .and_then(|_| out.flush())
        .map_err(|e| HttpServerError::ClientIoError(e.to_string()))
}
