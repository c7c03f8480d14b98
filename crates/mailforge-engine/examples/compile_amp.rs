//! Compile a template file to AMP4EMAIL or HTML
//!
//! ```text
//! RUST_LOG=debug cargo run --example compile_amp -- template.mjml [html]
//! ```

use anyhow::Context;
use mailforge_engine::{CompileOptions, Compiler};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let path = args.next().context("usage: compile_amp <template> [html|amp]")?;
    let options = match args.next().as_deref() {
        Some("html") => CompileOptions::html(),
        _ => CompileOptions::amp(),
    };

    let source = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
    let output = Compiler::new(options).compile(&source)?;

    for error in &output.errors {
        eprintln!("{}", error.formatted_message);
    }
    println!("{}", output.html);
    Ok(())
}
