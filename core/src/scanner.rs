//! Host discovery strategies.
//!
//! Strategies implement [`crate::ports::HostDiscoverer`]; the orchestrator
//! never names a concrete scanner.

mod local;

pub use local::LocalScanner;
