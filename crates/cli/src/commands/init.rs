use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use mojo_tools_core::{
    Config,
    config::{CONFIG_FILE_NAMES, PluginSettings},
};

use super::project_root;

pub fn init_command(
    cwd: Option<&Path>,
    force: bool,
    group_id: &str,
    artifact_id: Option<&str>,
    version: &str,
) -> Result<()> {
    let project_root = project_root(cwd)?;
    let config_path = project_root.join(CONFIG_FILE_NAMES[0]);

    if config_path.exists() && !force {
        println!("❌ Config already exists at: {}", config_path.display());
        println!("   Use --force to overwrite");
        return Ok(());
    }

    let artifact_id = match artifact_id {
        Some(id) => id.to_string(),
        None => project_root
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("plugin")
            .to_string(),
    };
    info!("Initializing {}:{}:{}", group_id, artifact_id, version);

    let config = Config::template(PluginSettings {
        group_id: group_id.to_string(),
        artifact_id,
        version: version.to_string(),
        ..Default::default()
    });
    config
        .save_to_file(&config_path)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    println!("✅ Created config: {}", config_path.display());
    println!("\n📌 Next steps:");
    println!("   Adjust classes_directories, source_roots and script_roots");
    println!("   Run `mojo-tools descriptor` to generate plugin.xml");
    Ok(())
}
