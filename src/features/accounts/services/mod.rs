mod account_service;

pub use account_service::{AccountFilter, AccountService};
