//! Export the transfer API's OpenAPI document
//!
//! Usage:
//!   cargo run --bin export_openapi > openapi.json
//!   cargo run --bin export_openapi -- --output docs/openapi.json

use anyhow::Context;
use chaching::gateway::openapi::ApiDoc;
use utoipa::OpenApi;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let output_path = match args.get(1).map(String::as_str) {
        Some("--output") => Some(args.get(2).context("--output needs a path")?.as_str()),
        _ => None,
    };

    let json = ApiDoc::openapi()
        .to_pretty_json()
        .context("serializing OpenAPI document")?;

    match output_path {
        Some(path) => {
            std::fs::write(path, &json).with_context(|| format!("writing {}", path))?;
            eprintln!("OpenAPI document written to {}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}
