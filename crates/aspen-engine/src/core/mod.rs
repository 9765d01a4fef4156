pub mod config;
pub mod error;
pub mod query;
pub mod time;
pub mod tree;
