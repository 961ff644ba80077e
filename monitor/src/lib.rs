//! The Enviro+ monitor: configuration and the polling loop.

pub mod app;
pub mod config;
