pub mod app_user;
pub mod audit_log;
pub mod file_share;
pub mod physical_file;
pub mod user_file;
