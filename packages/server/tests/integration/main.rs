
mod analytics;
mod audit;
mod auth;
mod download;
mod health;
mod rate_limit;
mod search;
mod upload;
