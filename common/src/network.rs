pub mod mac;
pub mod range;
