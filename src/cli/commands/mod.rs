pub mod account;
pub mod serve;
