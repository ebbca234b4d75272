pub mod admin;
pub mod auth;
pub mod lease;
pub mod period;
