// tests/integration/main.rs

mod command_jobs;
mod error_handling;
