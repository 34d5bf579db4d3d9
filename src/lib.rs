pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod resources;
pub mod scope;
pub mod statement;
pub mod validation;

#[cfg(test)]
pub mod testing;
