// refdq-core/src/domain/ports/mod.rs

pub mod config;

pub use config::ConfigSource;
