pub mod catalog;
pub mod config;
pub mod relationships;
pub mod store;
