pub mod candidate;
pub mod config;
pub mod macros;
pub mod network;
pub mod utils;
