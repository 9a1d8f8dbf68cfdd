use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::{
    aggregate::ExtractionRequest,
    error::{Error, Result},
    scanner::SourceFilter,
    types::{Dialect, PluginInfo},
};

/// File names searched for, in order, in each directory up to the root
pub const CONFIG_FILE_NAMES: [&str; 2] = [".mojo-tools.json", "mojo-tools.json"];

const DEFAULT_OUTPUT_DIRECTORY: &str = "target/classes/META-INF/maven";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PluginSettings {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_prefix: Option<String>,
    #[serde(default)]
    pub isolated_realm: bool,
    #[serde(default = "default_true")]
    pub inherited_by_default: bool,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            group_id: String::new(),
            artifact_id: String::new(),
            version: String::new(),
            name: None,
            description: None,
            goal_prefix: None,
            isolated_realm: false,
            inherited_by_default: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    pub plugin: PluginSettings,

    // Inputs, relative to the directory holding the config file
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes_directories: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_roots: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub script_roots: Vec<PathBuf>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excludes: Vec<String>,

    /// Extractor ids to run; all of them when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extractors: Option<Vec<Dialect>>,
    #[serde(default)]
    pub skip_error_no_descriptors_found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_directory: Option<PathBuf>,

    // Directory relative paths resolve against (not exposed in JSON)
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_json::from_str(&contents)
            .map_err(|e| Error::ConfigError(format!("Failed to parse {}: {e}", path.display())))?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn find_config_file(start_path: &Path) -> Option<PathBuf> {
        let mut current = start_path;

        loop {
            for name in CONFIG_FILE_NAMES {
                let config_path = current.join(name);
                if config_path.exists() {
                    return Some(config_path);
                }
            }

            current = current.parent()?;
        }
    }

    /// Starter configuration using the conventional project layout
    pub fn template(plugin: PluginSettings) -> Self {
        Self {
            plugin,
            classes_directories: vec![PathBuf::from("target/classes")],
            source_roots: vec![PathBuf::from("src/main/java")],
            script_roots: vec![PathBuf::from("src/main/scripts")],
            output_directory: Some(PathBuf::from(DEFAULT_OUTPUT_DIRECTORY)),
            ..Default::default()
        }
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        let configured = self
            .output_directory
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIRECTORY));
        self.resolve(&configured)
    }

    pub fn plugin_info(&self) -> Result<PluginInfo> {
        let settings = &self.plugin;
        for (field, value) in [
            ("group_id", &settings.group_id),
            ("artifact_id", &settings.artifact_id),
            ("version", &settings.version),
        ] {
            if value.trim().is_empty() {
                return Err(Error::ConfigError(format!("plugin.{field} must not be empty")));
            }
        }

        let mut info = PluginInfo::new(&settings.group_id, &settings.artifact_id, &settings.version);
        info.name = settings.name.clone();
        info.description = settings.description.clone();
        info.goal_prefix = settings.goal_prefix.clone();
        info.isolated_realm = settings.isolated_realm;
        info.inherited_by_default = settings.inherited_by_default;
        Ok(info)
    }

    /// Build the extraction request, resolving every path
    pub fn to_request(&self) -> Result<ExtractionRequest> {
        let resolve_all = |paths: &[PathBuf]| -> Vec<PathBuf> {
            paths.iter().map(|path| self.resolve(path)).collect()
        };

        Ok(ExtractionRequest {
            plugin: self.plugin_info()?,
            classes_directories: resolve_all(&self.classes_directories),
            dependencies: resolve_all(&self.dependencies),
            source_roots: resolve_all(&self.source_roots),
            script_roots: resolve_all(&self.script_roots),
            filter: SourceFilter::new(&self.includes, &self.excludes)?,
            extractors: self
                .extractors
                .as_ref()
                .map(|ids| ids.iter().copied().collect::<BTreeSet<_>>()),
            skip_error_no_descriptors_found: self.skip_error_no_descriptors_found,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn settings() -> PluginSettings {
        PluginSettings {
            group_id: "org.example".to_string(),
            artifact_id: "maven-demo-plugin".to_string(),
            version: "1.0".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_minimal_config() {
        let json = r#"{
            "plugin": { "group_id": "org.example", "artifact_id": "demo-maven-plugin", "version": "2.0" },
            "classes_directories": ["target/classes"],
            "extractors": ["JAVA-ANNOTATIONS", "bsh"]
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.plugin.inherited_by_default);
        assert_eq!(
            config.extractors,
            Some(vec![Dialect::Annotations, Dialect::Beanshell])
        );
        assert!(!config.skip_error_no_descriptors_found);
    }

    #[test]
    fn test_unknown_extractor_is_rejected() {
        let json = r#"{
            "plugin": { "group_id": "g", "artifact_id": "a", "version": "1" },
            "extractors": ["groovy"]
        }"#;
        let err = serde_json::from_str::<Config>(json).unwrap_err();
        assert!(err.to_string().contains("No mojo extractor with 'groovy' id."));
    }

    #[test]
    fn test_save_load_and_find() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("src/main/java");
        std::fs::create_dir_all(&nested).unwrap();
        let path = temp.path().join(".mojo-tools.json");

        let config = Config::template(settings());
        config.save_to_file(&path).unwrap();

        assert_eq!(Config::find_config_file(&nested), Some(path.clone()));
        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.base_dir.as_deref(), Some(temp.path()));
        assert_eq!(loaded.plugin, config.plugin);
        assert_eq!(
            loaded.output_dir(),
            temp.path().join("target/classes/META-INF/maven")
        );
    }

    #[test]
    fn test_request_resolves_paths() {
        let mut config = Config::template(settings());
        config.base_dir = Some(PathBuf::from("/work/plugin"));
        config.dependencies = vec![PathBuf::from("/repo/api.jar")];
        config.extractors = Some(vec![Dialect::Ant]);
        config.excludes = vec!["**/internal/**".to_string()];

        let request = config.to_request().unwrap();
        assert_eq!(
            request.classes_directories,
            vec![PathBuf::from("/work/plugin/target/classes")]
        );
        assert_eq!(request.dependencies, vec![PathBuf::from("/repo/api.jar")]);
        assert!(request.is_enabled(Dialect::Ant));
        assert!(!request.is_enabled(Dialect::Annotations));
        assert!(!request.filter.matches("org/example/internal/Foo.java"));
        assert_eq!(request.plugin.effective_goal_prefix(), "demo");
    }

    #[test]
    fn test_missing_coordinates() {
        let mut config = Config::template(settings());
        config.plugin.version = " ".to_string();
        assert!(matches!(
            config.to_request().unwrap_err(),
            Error::ConfigError(_)
        ));
    }
}
