pub mod config;
pub mod database;
pub mod identity;
pub mod logging;
pub mod sanitize;
pub mod storage;
