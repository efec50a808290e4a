use crate::defs::MAX_REQUEST_BYTES;
use crate::errors::RequestError;

use std::io::{BufRead, Read};

/// A transaction request as extracted from the HTTP request line.
///
/// The request target carries the transaction in its query string:
///
/// ```text
/// GET /?trans=create&stock=MSFT&amount=10 HTTP/1.1
/// ```
///
/// Fields are read by position (operation, stock, amount) after URL decoding
/// and turning every `&` and `=` into a separator; the parameter names
/// themselves are not checked. Missing fields are empty, and an amount that
/// is not a number becomes `0`, so a malformed request still reaches the
/// dispatcher instead of failing the connection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionRequest {
    /// Operation token, e.g. `"buy"`.
    pub operation: String,
    /// Stock name the operation applies to.
    pub stock: String,
    /// Signed amount; `0` when absent or unparseable.
    pub amount: i64,
}

impl TransactionRequest {
    /// Creates a request from its parts.
    pub fn new(operation: &str, stock: &str, amount: i64) -> Self {
        Self {
            operation: operation.to_string(),
            stock: stock.to_string(),
            amount,
        }
    }

    /// Extracts the transaction from an HTTP request line.
    ///
    /// # Example
    ///
    /// ```
    /// use stock_exchange::request::TransactionRequest;
    /// let req = TransactionRequest::from_request_line("GET /?trans=buy&stock=AAPL&amount=7 HTTP/1.1");
    /// assert_eq!(req, TransactionRequest::new("buy", "AAPL", 7));
    /// ```
    pub fn from_request_line(line: &str) -> Self {
        let target = line.split_whitespace().nth(1).unwrap_or("");
        let decoded = url_decode(target).replace(['&', '='], " ");
        let fields: Vec<&str> = decoded.split_whitespace().collect();
        let field = |idx: usize| fields.get(idx).copied().unwrap_or("");

        Self {
            operation: field(1).to_string(),
            stock: field(3).to_string(),
            amount: parse_amount(field(5)),
        }
    }

    /// Checks that the request survives the trip through the query string.
    ///
    /// The server decodes the target before splitting it on `&`, `=` and
    /// whitespace, so an operation or stock name containing any of those
    /// would be split into extra fields even when percent-encoded.
    pub fn validate(&self) -> Result<(), RequestError> {
        for (field, value) in [("operation", &self.operation), ("stock", &self.stock)] {
            if value.chars().any(|c| c.is_whitespace() || c == '&' || c == '=') {
                return Err(RequestError::InvalidField(format!(
                    "{} '{}' must not contain whitespace, '&' or '='",
                    field, value
                )));
            }
        }
        Ok(())
    }

    /// Renders this request as a complete HTTP GET with URL-encoded values.
    ///
    /// Only requests that pass [`validate`](Self::validate) are parsed back
    /// into the same fields by the server.
    pub fn to_http_request(&self, host: &str) -> String {
        format!(
            "GET /?trans={}&stock={}&amount={} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
            urlencoding::encode(&self.operation),
            urlencoding::encode(&self.stock),
            self.amount,
            host
        )
    }
}

/// Reads one request from `reader`: the request line, then every header
/// line up to the blank line that ends the header block (or end of stream).
///
/// At most [`MAX_REQUEST_BYTES`] are consumed for the request line and
/// headers together; anything beyond is left unread. Bytes that are not
/// valid UTF-8 are replaced rather than rejected.
pub fn read_request<R: BufRead>(reader: &mut R) -> Result<TransactionRequest, RequestError> {
    let mut limited = reader.by_ref().take(MAX_REQUEST_BYTES);

    let mut line = Vec::new();
    limited.read_until(b'\n', &mut line)?;
    let line = String::from_utf8_lossy(&line);
    log::debug!("Request line: '{}'", line.trim_end());

    let request = TransactionRequest::from_request_line(&line);
    skip_headers(&mut limited)?;
    Ok(request)
}

/// Consumes header lines until an empty line, a lone `\r`, or end of stream.
fn skip_headers<R: BufRead>(reader: &mut R) -> Result<(), RequestError> {
    let mut header = Vec::new();
    loop {
        header.clear();
        if reader.read_until(b'\n', &mut header)? == 0 {
            return Ok(());
        }
        if header.iter().all(|b| matches!(b, b'\r' | b'\n')) {
            return Ok(());
        }
    }
}

/// Decodes `%XX` escapes and `+` (as space). Invalid UTF-8 in the decoded
/// bytes is replaced rather than rejected.
pub fn url_decode(s: &str) -> String {
    let spaced = s.replace('+', " ");
    let bytes = urlencoding::decode_binary(spaced.as_bytes());
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Parses a leading optional sign followed by decimal digits; anything
/// after the digits is ignored. Returns `0` if there is no number.
fn parse_amount(token: &str) -> i64 {
    let bytes = token.as_bytes();
    let mut end = usize::from(matches!(bytes.first(), Some(b'-' | b'+')));
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    token[..end].parse().unwrap_or(0)
}
