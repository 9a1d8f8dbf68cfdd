//! The canonical descriptor model produced by the builder and read back by the codec.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::impl_deserialize_from_str;
use crate::utils::type_name;

/// Dependency scope a goal needs resolved (or collected) before it runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum ResolutionScope {
    Compile,
    CompilePlusRuntime,
    Runtime,
    RuntimePlusSystem,
    Test,
}

impl ResolutionScope {
    pub fn id(&self) -> &'static str {
        match self {
            ResolutionScope::Compile => "compile",
            ResolutionScope::CompilePlusRuntime => "compile+runtime",
            ResolutionScope::Runtime => "runtime",
            ResolutionScope::RuntimePlusSystem => "runtime+system",
            ResolutionScope::Test => "test",
        }
    }

    /// Parse either the document id (`compile+runtime`) or the enum constant
    /// spelling (`COMPILE_PLUS_RUNTIME`). `NONE` and the empty string mean no scope.
    pub fn parse_optional(value: &str) -> Result<Option<Self>, String> {
        let normalized = value.trim().to_lowercase().replace("_plus_", "+");
        match normalized.as_str() {
            "" | "none" => Ok(None),
            other => other.parse().map(Some),
        }
    }
}

impl fmt::Display for ResolutionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl From<ResolutionScope> for String {
    fn from(scope: ResolutionScope) -> Self {
        scope.id().to_string()
    }
}

impl FromStr for ResolutionScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace("_plus_", "+").as_str() {
            "compile" => Ok(ResolutionScope::Compile),
            "compile+runtime" => Ok(ResolutionScope::CompilePlusRuntime),
            "runtime" => Ok(ResolutionScope::Runtime),
            "runtime+system" => Ok(ResolutionScope::RuntimePlusSystem),
            "test" => Ok(ResolutionScope::Test),
            _ => Err(format!("unknown dependency resolution scope '{s}'")),
        }
    }
}

impl_deserialize_from_str!(ResolutionScope);

/// Header information of the plugin that owns the goals
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PluginInfo {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub goal_prefix: Option<String>,
    pub isolated_realm: bool,
    pub inherited_by_default: bool,
}

impl PluginInfo {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
            inherited_by_default: true,
            ..Default::default()
        }
    }

    /// Configured goal prefix, or one derived from the artifact id
    pub fn effective_goal_prefix(&self) -> String {
        self.goal_prefix
            .clone()
            .unwrap_or_else(|| default_goal_prefix(&self.artifact_id))
    }

    pub fn display_id(&self) -> String {
        format!("{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

/// `maven-foo-plugin` and `foo-maven-plugin` both become `foo`
pub fn default_goal_prefix(artifact_id: &str) -> String {
    if let Some(rest) = artifact_id.strip_suffix("-maven-plugin") {
        return rest.to_string();
    }
    if let Some(rest) = artifact_id
        .strip_prefix("maven-")
        .and_then(|rest| rest.strip_suffix("-plugin"))
    {
        return rest.to_string();
    }
    artifact_id.to_string()
}

/// A complete plugin descriptor: header plus goals ordered by name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PluginDescriptor {
    pub plugin: PluginInfo,
    pub goals: Vec<DescriptorEntry>,
}

impl PluginDescriptor {
    pub fn goal(&self, name: &str) -> Option<&DescriptorEntry> {
        self.goals.iter().find(|entry| entry.goal == name)
    }
}

/// Lifecycle fork performed before the goal executes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecuteTrigger {
    pub phase: Option<String>,
    pub goal: Option<String>,
    pub lifecycle: Option<String>,
}

/// One goal of the plugin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptorEntry {
    pub goal: String,
    pub implementation: String,
    pub language: String,
    pub description: Option<String>,
    pub phase: Option<String>,
    pub execute: Option<ExecuteTrigger>,
    pub dependency_resolution: Option<ResolutionScope>,
    pub dependency_collection: Option<ResolutionScope>,
    pub direct_invocation_only: bool,
    pub project_required: bool,
    pub reports_required: bool,
    pub aggregator: bool,
    pub online_required: bool,
    pub inherited_by_default: bool,
    pub thread_safe: bool,
    pub configurator: Option<String>,
    pub composer: Option<String>,
    pub instantiation_strategy: String,
    pub execution_strategy: String,
    pub since: Option<String>,
    pub deprecated: Option<String>,
    pub parameters: Vec<ParameterEntry>,
    pub requirements: Vec<DependencyRequirement>,
}

impl DescriptorEntry {
    pub const DEFAULT_INSTANTIATION_STRATEGY: &'static str = "per-lookup";
    pub const DEFAULT_EXECUTION_STRATEGY: &'static str = "once-per-session";

    /// A goal with every requirement flag at its declared default
    pub fn new(
        goal: impl Into<String>,
        implementation: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            goal: goal.into(),
            implementation: implementation.into(),
            language: language.into(),
            description: None,
            phase: None,
            execute: None,
            dependency_resolution: None,
            dependency_collection: None,
            direct_invocation_only: false,
            project_required: true,
            reports_required: false,
            aggregator: false,
            online_required: false,
            inherited_by_default: true,
            thread_safe: false,
            configurator: None,
            composer: None,
            instantiation_strategy: Self::DEFAULT_INSTANTIATION_STRATEGY.to_string(),
            execution_strategy: Self::DEFAULT_EXECUTION_STRATEGY.to_string(),
            since: None,
            deprecated: None,
            parameters: Vec::new(),
            requirements: Vec::new(),
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterEntry> {
        self.parameters.iter().find(|parameter| parameter.name == name)
    }

    /// Parameters a user may configure
    pub fn editable_parameters(&self) -> impl Iterator<Item = &ParameterEntry> {
        self.parameters.iter().filter(|parameter| !parameter.read_only)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterEntry {
    pub name: String,
    /// Qualified type with generic arguments
    pub type_name: String,
    pub alias: Option<String>,
    pub default_value: Option<String>,
    pub expression: Option<String>,
    pub implementation: Option<String>,
    pub description: Option<String>,
    pub required: bool,
    pub read_only: bool,
    pub since: Option<String>,
    pub deprecated: Option<String>,
}

impl ParameterEntry {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            alias: None,
            default_value: None,
            expression: None,
            implementation: None,
            description: None,
            required: false,
            read_only: false,
            since: None,
            deprecated: None,
        }
    }

    /// The user-settable property key, when the expression is a plain `${key}`
    pub fn property(&self) -> Option<&str> {
        let key = self
            .expression
            .as_deref()?
            .strip_prefix("${")?
            .strip_suffix('}')?;
        if key.is_empty() || key.contains(['$', '{', '}']) {
            None
        } else {
            Some(key)
        }
    }

    pub fn short_type(&self) -> String {
        type_name::short_type(&self.type_name)
    }

    pub fn erased_type(&self) -> &str {
        type_name::erase_generics(&self.type_name)
    }
}

/// A component injected into the goal by the host container
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyRequirement {
    pub field_name: String,
    pub role: String,
    pub role_hint: String,
}

impl DependencyRequirement {
    pub const DEFAULT_HINT: &'static str = "default";
}
