use anyhow::{Context, Result, bail};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use mojo_tools_core::{
    Aggregator, Config, Dialect, PluginDescriptor,
    codec::{self, DocumentFlavor},
};

use super::project_root;
use crate::display::print_descriptor_summary;

pub const DESCRIPTOR_FILE: &str = "plugin.xml";
pub const HELP_DESCRIPTOR_FILE: &str = "plugin-help.xml";

pub fn descriptor_command(
    cwd: Option<&Path>,
    config_path: Option<&Path>,
    extractors: &[String],
    output: Option<&Path>,
    skip_error_no_descriptors_found: bool,
) -> Result<()> {
    let project_root = project_root(cwd)?;

    let config_path = match config_path {
        Some(path) => project_root.join(path),
        None => match Config::find_config_file(&project_root) {
            Some(path) => path,
            None => bail!(
                "No .mojo-tools.json found in {} or its parents; run `mojo-tools init` first",
                project_root.display()
            ),
        },
    };
    debug!("Using config {}", config_path.display());

    let mut config = Config::load_from_file(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    if !extractors.is_empty() {
        let dialects = extractors
            .iter()
            .map(|id| id.parse::<Dialect>())
            .collect::<Result<BTreeSet<_>, _>>()?;
        config.extractors = Some(dialects.into_iter().collect());
    }
    if skip_error_no_descriptors_found {
        config.skip_error_no_descriptors_found = true;
    }

    let request = config.to_request()?;
    let mut aggregator = Aggregator::new()?;
    let descriptor = aggregator
        .run(&request)
        .with_context(|| format!("Failed to extract goals of {}", request.plugin.display_id()))?;

    let output_dir = match output {
        Some(dir) => project_root.join(dir),
        None => config.output_dir(),
    };
    let written = write_descriptors(&descriptor, &output_dir)?;

    print_descriptor_summary(&descriptor);
    for path in written {
        println!("✅ Wrote {}", path.display());
    }
    Ok(())
}

/// Write `plugin.xml` and the help descriptor under `output_dir`
pub fn write_descriptors(descriptor: &PluginDescriptor, output_dir: &Path) -> Result<Vec<PathBuf>> {
    let plugin = &descriptor.plugin;
    let help_dir = output_dir.join(&plugin.group_id).join(&plugin.artifact_id);
    fs::create_dir_all(&help_dir)
        .with_context(|| format!("Failed to create {}", help_dir.display()))?;

    let full = output_dir.join(DESCRIPTOR_FILE);
    let help = help_dir.join(HELP_DESCRIPTOR_FILE);
    for (path, flavor) in [(&full, DocumentFlavor::Full), (&help, DocumentFlavor::Help)] {
        fs::write(path, codec::serialize(descriptor, flavor))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {:?} descriptor to {}", flavor, path.display());
    }
    Ok(vec![full, help])
}
