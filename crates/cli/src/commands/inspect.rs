use anyhow::{Context, Result};
use std::path::Path;

use mojo_tools_core::codec;

pub fn inspect_command(descriptor: &Path) -> Result<()> {
    let xml = std::fs::read_to_string(descriptor)
        .with_context(|| format!("Failed to read {}", descriptor.display()))?;
    let parsed = codec::deserialize(&xml)
        .with_context(|| format!("Failed to parse {}", descriptor.display()))?;
    println!("{}", serde_json::to_string_pretty(&parsed)?);
    Ok(())
}
