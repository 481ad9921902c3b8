pub mod arp;
pub mod channel;
pub mod ethernet;
pub mod http;
pub mod interface;
pub mod tcp;
