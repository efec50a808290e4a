use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::thread;
use std::time::Duration;
use stock_exchange::errors::CliError;
use stock_exchange::request::TransactionRequest;
use structopt::StructOpt;

/// Command-line options for the client
#[derive(Debug, StructOpt)]
#[structopt(name = "stock_client", about = "Sends a stock transaction to the stock server")]
struct Opt {
    /// Server address, e.g., 127.0.0.1:8080
    #[structopt(short, long, default_value = "127.0.0.1:8080")]
    server_addr: String,

    /// Transaction: create, buy, sell, status, reset
    #[structopt(short, long)]
    trans: String,

    /// Stock name
    #[structopt(short = "n", long, default_value = "")]
    stock: String,

    /// Amount for create, buy and sell
    #[structopt(short, long, default_value = "0", allow_hyphen_values = true)]
    amount: i64,

    /// Number of concurrent connections sending the same transaction
    #[structopt(short, long, default_value = "1")]
    repeat: usize,
}

/// Sends one request and returns the response body.
fn send_transaction(addr: &str, request: &TransactionRequest) -> io::Result<String> {
    let mut stream = TcpStream::connect(addr)?;
    stream.set_read_timeout(Some(Duration::from_secs(5)))?;
    stream.write_all(request.to_http_request(addr).as_bytes())?;
    stream.flush()?;

    let mut response = String::new();
    stream.read_to_string(&mut response)?;

    match response.split_once("\r\n\r\n") {
        Some((_, body)) => Ok(body.to_string()),
        None => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Malformed response: {}", response),
        )),
    }
}

fn main() -> Result<(), CliError> {
    let opt = Opt::from_args();
    let request = TransactionRequest::new(&opt.trans, &opt.stock, opt.amount);
    request
        .validate()
        .map_err(|e| CliError::GeneralError(e.to_string()))?;

    let handles: Vec<_> = (0..opt.repeat.max(1))
        .map(|_| {
            let addr = opt.server_addr.clone();
            let request = request.clone();
            thread::spawn(move || send_transaction(&addr, &request))
        })
        .collect();

    let mut failures = 0;
    for handle in handles {
        match handle.join() {
            Ok(Ok(body)) => println!("{}", body),
            Ok(Err(e)) => {
                eprintln!("Request failed: {}", e);
                failures += 1;
            }
            Err(_) => {
                eprintln!("Request thread panicked");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(CliError::GeneralError(format!("{} request(s) failed", failures)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_transaction_no_server() {
        // Port 1 on localhost is not expected to have a listener.
        let request = TransactionRequest::new("status", "X", 0);
        assert!(send_transaction("127.0.0.1:1", &request).is_err());
    }
}
