#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc)]

pub mod agent;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod output;
pub mod project;
pub mod registry;
pub mod tui;
