pub mod changeset;
pub mod classify;
pub mod config;
pub mod error;
pub mod platform;
pub mod runner;
pub mod workflow;
