pub mod config;
pub mod csv_writer;
pub mod duration;
pub mod error;
pub mod export;
pub mod notion;
pub mod paginator;
pub mod property;
pub mod query;
pub mod relation;
pub mod row;
pub mod server;
