//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI document of the habit tracker API (auth, habit CRUD,
//! tracking and history routes) to the path given as the first argument,
//! `openapi.json` by default.

use api_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

/// Serializes the habit tracker's `ApiDoc` and writes it to `path`.
fn generate_spec(
    api_doc: utoipa::openapi::OpenApi,
    path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let spec_json = api_doc.to_pretty_json()?;
    std::fs::write(path, spec_json)?;
    println!("OpenAPI specification generated at {}", path);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "openapi.json".to_string());
    generate_spec(ApiDoc::openapi(), &path)?;
    Ok(())
}
