pub mod lease_service;
pub mod user_service;

pub use lease_service::{LeaseError, LeaseService};
pub use user_service::{UserError, UserService};
