pub mod api;
pub mod cli;
pub mod error;
pub mod models;
pub mod services;
