//! Generate JSON Schemas for projctx files
//!
//! Usage:
//!   cargo run --features dev-bins --bin generate_schema [config|context|window]
//!
//! `config` (the default) describes `config.json`, `context` one saved
//! context, `window` the exported window arrangement read by `--state`.

use projctx::config::Config;
use projctx_core::virtual_window::WindowState;
use projctx_core::ProjectContext;
use schemars::schema_for;

fn main() {
    let which = std::env::args().nth(1).unwrap_or_else(|| "config".to_string());
    let schema = match which.as_str() {
        "config" => schema_for!(Config),
        "context" => schema_for!(ProjectContext),
        "window" => schema_for!(WindowState),
        other => {
            eprintln!("Unknown schema {other:?}; expected config, context or window");
            std::process::exit(2);
        }
    };

    let output = serde_json::to_string_pretty(&schema).expect("Failed to serialize schema");
    println!("{}", output);
}
