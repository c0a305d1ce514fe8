pub mod config;
pub mod exercise;
pub mod health;
pub mod query;
pub mod routine;
pub mod session;
