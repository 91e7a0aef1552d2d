pub mod identity;
pub mod tcp;
