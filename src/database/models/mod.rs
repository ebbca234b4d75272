pub mod lease;
pub mod period;
pub mod user;
