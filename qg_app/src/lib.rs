pub mod cli;
pub mod config_loader;
pub mod tracing_setup;
