//! Observability for apiq.
//!
//! The libraries only emit `tracing` events; binaries call [`init_logging`]
//! once to install a subscriber.

mod logging;

pub use logging::*;
