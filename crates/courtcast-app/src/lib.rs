// Library root: exposes the app modules so integration tests can drive
// the engine and the command surface directly.

pub mod cli;
pub mod config;
pub mod engine;
pub mod report;
pub mod snapshot;
