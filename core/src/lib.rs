pub mod discovery;
pub mod network;
pub mod ports;
pub mod scanner;
pub mod system;
