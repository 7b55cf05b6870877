//! HTTP request-serving layer.
//!
//! Every endpoint passes the system-lock gate before any other processing,
//! and every internal failure leaves the process as one of a handful of
//! fixed, non-identifying client messages.

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use server::ApiServer;
