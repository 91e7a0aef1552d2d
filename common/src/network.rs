pub mod host;
pub mod interface;
pub mod range;
pub mod segment;
