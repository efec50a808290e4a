//! # Stock Exchange Server
//!
//! This crate implements a small multithreaded stock exchange web server.
//! Clients issue one transaction per HTTP connection; every transaction is
//! applied to a single shared, in-memory [`Ledger`](crate::ledger::Ledger)
//! of named integer balances.
//!
//! ## Features
//!
//! - Five transactions: `create`, `buy`, `sell`, `status`, `reset`.
//! - A detached thread per connection, optionally capped at a maximum
//!   number of concurrently running threads.
//! - Two-tier locking in the ledger: a structural guard for inserting new
//!   stocks and resetting, and one guard per stock for balance changes, so
//!   transactions on different stocks never wait on each other.
//!
//! ## Architecture Overview
//!
//! - [`ledger`](crate::ledger) — Shared registry of stock balances.
//! - [`dispatcher`](crate::dispatcher) — Maps operation tokens onto ledger calls.
//! - [`request`](crate::request) — Extracts the transaction from an HTTP request.
//! - [`http_server`](crate::http_server) — Accept loop and per-connection handling.
//! - [`worker_limit`](crate::worker_limit) — Optional cap on connection threads.
//! - [`defs`](crate::defs) — Shared constants and response framing.
//! - [`errors`](crate::errors) — Error types used across modules.
//!
//! ## Request Format
//!
//! ```text
//! GET /?trans=<operation>&stock=<name>&amount=<integer> HTTP/1.1
//! ```
//!
//! The response body is a single line of text, for example
//! `Stock MSFT created with balance = 10`, `Stock not found`, or
//! `Invalid request`.
//!
//! ## Example: Running the Server
//!
//! ```no_run
//! use std::sync::Arc;
//! use stock_exchange::http_server::HttpServer;
//! use stock_exchange::ledger::Ledger;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ledger = Arc::new(Ledger::new());
//!     let server = HttpServer::new("127.0.0.1:8080", ledger, Some(64))?;
//!     server.start()?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![deny(unreachable_pub)]

pub mod defs;
pub mod dispatcher;
pub mod errors;
pub mod http_server;
pub mod ledger;
pub mod request;
pub mod worker_limit;
