//! Command-line front end for project contexts: configuration, file
//! persistence, logging and a terminal prompter around `projctx-core`.

pub mod app;
pub mod config;
pub mod config_io;
pub mod partial_config;
pub mod prompt;
pub mod services;
pub mod storage;
