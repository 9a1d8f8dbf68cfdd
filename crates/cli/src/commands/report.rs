use anyhow::{Context, Result};
use std::path::Path;

use mojo_tools_core::{PluginOverview, codec};

use crate::display::print_overview;

pub fn report_command(descriptor: &Path, javadoc_url: Option<&str>) -> Result<()> {
    let xml = std::fs::read_to_string(descriptor)
        .with_context(|| format!("Failed to read {}", descriptor.display()))?;
    let parsed = codec::deserialize(&xml)
        .with_context(|| format!("Failed to parse {}", descriptor.display()))?;

    let base = javadoc_url.map(|url| url.trim_end_matches('/').to_string());
    let overview = PluginOverview::new(&parsed, |class| javadoc_link(base.as_deref(), class));
    print_overview(&overview);
    Ok(())
}

/// Primitive types have no documentation page
fn javadoc_link(base: Option<&str>, class: &str) -> Option<String> {
    let base = base?;
    if !class.contains('.') {
        return None;
    }
    Some(format!("{}/{}.html", base, class.replace('.', "/")))
}
