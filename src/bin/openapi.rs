use anyhow::Result;

// Print the OpenAPI document for `portero` as JSON.
fn main() -> Result<()> {
    let doc = portero::api::openapi();
    let json = serde_json::to_string_pretty(&doc)?;
    println!("{json}");
    Ok(())
}
