//! Shared project scaffolding for the mojo-tools integration tests

use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use mojo_tools_core::Config;
use mojo_tools_core::fixtures;

/// A throwaway plugin project laid out under a temporary directory
pub struct SampleProject {
    dir: TempDir,
}

impl SampleProject {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write a text file, creating parent directories
    pub fn write(&self, relative: &str, contents: &str) -> io::Result<PathBuf> {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Write an assembled class below `target/classes`
    pub fn write_class(&self, class_name: &str, bytes: &[u8]) -> io::Result<()> {
        fixtures::write_class(&self.root().join("target/classes"), class_name, bytes)
    }

    /// Write a dependency archive below `lib/` and return its path
    pub fn write_jar(&self, name: &str, classes: &[(&str, Vec<u8>)]) -> io::Result<PathBuf> {
        let path = self.root().join("lib").join(name);
        fs::create_dir_all(self.root().join("lib"))?;
        let names: Vec<String> = classes
            .iter()
            .map(|(class, _)| format!("{}.class", class.replace('.', "/")))
            .collect();
        let entries: Vec<(&str, Vec<u8>)> = names
            .iter()
            .zip(classes)
            .map(|(name, (_, bytes))| (name.as_str(), bytes.clone()))
            .collect();
        fixtures::write_jar(&path, &entries).map_err(io::Error::other)?;
        Ok(path)
    }

    /// Write `.mojo-tools.json` and load it back
    pub fn configure(&self, config: Value) -> io::Result<Config> {
        let path = self.root().join(".mojo-tools.json");
        fs::write(&path, serde_json::to_string_pretty(&config)?)?;
        Config::load_from_file(&path).map_err(io::Error::other)
    }
}
