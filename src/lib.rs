pub mod app;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod resource;
pub mod schema;
pub mod types;
pub mod upload;

#[cfg(test)]
pub mod testing;
