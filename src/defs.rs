/// Maximum time (in seconds) a connection thread waits for the client
/// to deliver its request line or headers.
///
/// A client that stalls longer than this is dropped so that it cannot
/// hold a worker slot indefinitely.
pub const CLIENT_READ_TIMEOUT_SEC: u64 = 5;

/// Upper bound on the bytes read for a request line and its headers.
///
/// A client streaming bytes without ever ending a line stops being read
/// once this many bytes have arrived.
pub const MAX_REQUEST_BYTES: u64 = 8 * 1024;

/// Status line and headers written before every response body.
///
/// The body length is appended after `Content-Length: ` by
/// [`response_header`].
pub const HTTP_RESPONSE_STATUS: &str = "HTTP/1.1 200 OK\r\n";

/// Value of the `Server` response header.
pub const SERVER_NAME: &str = "SimpleServer";

/// Body returned for any operation token the dispatcher does not recognize.
pub const INVALID_REQUEST: &str = "Invalid request";

/// Builds the HTTP response header for a body of `content_length` bytes.
///
/// # Example
///
/// ```
/// use stock_exchange::defs::response_header;
/// let header = response_header(12);
/// assert!(header.starts_with("HTTP/1.1 200 OK\r\n"));
/// assert!(header.contains("Content-Length: 12\r\n"));
/// assert!(header.ends_with("\r\n\r\n"));
/// ```
pub fn response_header(content_length: usize) -> String {
    format!(
        "{}Server: {}\r\nContent-Length: {}\r\nConnection: Close\r\nContent-Type: text/html\r\n\r\n",
        HTTP_RESPONSE_STATUS, SERVER_NAME, content_length
    )
}
