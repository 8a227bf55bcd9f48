pub mod analytics;
pub mod audit;
pub mod auth;
pub mod file;
pub mod health;
pub mod shared;
