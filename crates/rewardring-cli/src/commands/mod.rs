pub mod config;
pub mod ring;
