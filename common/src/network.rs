pub mod interface;
pub mod prefix;
pub mod range;
