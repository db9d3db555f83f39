pub mod account;
pub mod domains;
pub mod health;
pub mod secrets;
