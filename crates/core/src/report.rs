//! Read-only rows for goal overview reports.
//!
//! Rendering belongs to the caller; this module only flattens a descriptor
//! into one row per goal and one sub-row per configurable parameter.

use serde::Serialize;

use crate::types::{DescriptorEntry, ParameterEntry, PluginDescriptor, PluginInfo};

pub use crate::utils::type_name::link_target;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginOverview {
    pub plugin: PluginInfo,
    pub goal_prefix: String,
    pub goals: Vec<GoalRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalRow {
    pub goal: String,
    /// `prefix:goal`, the form typed on the command line
    pub invocation: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub phase: Option<String>,
    pub since: Option<String>,
    pub deprecated: Option<String>,
    pub thread_safe: bool,
    pub project_required: bool,
    pub parameters: Vec<ParameterRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterRow {
    pub name: String,
    pub type_name: String,
    pub short_type: String,
    /// Documentation URL of the class a reader should follow
    pub link: Option<String>,
    pub required: bool,
    pub since: Option<String>,
    pub deprecated: Option<String>,
    pub default_value: Option<String>,
    pub property: Option<String>,
    pub alias: Option<String>,
    pub description: Option<String>,
}

impl PluginOverview {
    /// `lookup` maps a fully qualified class name to its documentation URL
    pub fn new<F>(descriptor: &PluginDescriptor, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let goal_prefix = descriptor.plugin.effective_goal_prefix();
        let goals = descriptor
            .goals
            .iter()
            .map(|entry| GoalRow::new(entry, &goal_prefix, &lookup))
            .collect();
        Self {
            plugin: descriptor.plugin.clone(),
            goal_prefix,
            goals,
        }
    }

    pub fn goal(&self, name: &str) -> Option<&GoalRow> {
        self.goals.iter().find(|row| row.goal == name)
    }
}

impl GoalRow {
    fn new<F>(entry: &DescriptorEntry, prefix: &str, lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut parameters: Vec<ParameterRow> = entry
            .editable_parameters()
            .map(|parameter| ParameterRow::new(parameter, lookup))
            .collect();
        // Required parameters are listed first
        parameters.sort_by(|a, b| b.required.cmp(&a.required).then(a.name.cmp(&b.name)));

        Self {
            goal: entry.goal.clone(),
            invocation: format!("{}:{}", prefix, entry.goal),
            summary: entry.description.as_deref().map(first_sentence),
            description: entry.description.clone(),
            phase: entry.phase.clone(),
            since: entry.since.clone(),
            deprecated: entry.deprecated.clone(),
            thread_safe: entry.thread_safe,
            project_required: entry.project_required,
            parameters,
        }
    }
}

impl ParameterRow {
    fn new<F>(parameter: &ParameterEntry, lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            name: parameter.name.clone(),
            type_name: parameter.type_name.clone(),
            short_type: parameter.short_type(),
            link: lookup(link_target(&parameter.type_name)),
            required: parameter.required,
            since: parameter.since.clone(),
            deprecated: parameter.deprecated.clone(),
            default_value: parameter.default_value.clone(),
            property: parameter.property().map(str::to_string),
            alias: parameter.alias.clone(),
            description: parameter.description.clone(),
        }
    }
}

fn first_sentence(text: &str) -> String {
    let text = text.trim();
    match text.find(". ") {
        Some(end) => text[..=end].to_string(),
        None => text.to_string(),
    }
}
