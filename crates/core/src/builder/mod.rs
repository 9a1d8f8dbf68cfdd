//! Converts reconciled units into descriptor entries.

pub mod components;

use std::collections::HashSet;
use tracing::warn;

use crate::error::{Error, Result};
use crate::reconcile::ReconciledUnit;
use crate::types::{
    DependencyMarker, DependencyRequirement, DescriptorEntry, Dialect, ExecuteTrigger, MemberKind,
    MemberMarker, ParameterEntry, ParameterMarker,
};
use components::{component_expression, injected_expression};

pub const NO_VERSION_GIVEN: &str = "No version given";
pub const NO_REASON_GIVEN: &str = "No reason given";

/// Builds one descriptor entry per reconciled unit of a dialect
#[derive(Debug, Clone, Copy)]
pub struct DescriptorBuilder {
    dialect: Dialect,
}

impl DescriptorBuilder {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn build_all(&self, units: &[ReconciledUnit]) -> Result<Vec<DescriptorEntry>> {
        units.iter().map(|unit| self.build(unit)).collect()
    }

    pub fn build(&self, unit: &ReconciledUnit) -> Result<DescriptorEntry> {
        let record = &unit.record;
        let implementation = record
            .implementation
            .clone()
            .unwrap_or_else(|| record.identity.clone());

        let goal = match unit.goal() {
            Some(goal) if !goal.name.trim().is_empty() => goal,
            _ => return Err(Error::EmptyGoal { implementation }),
        };

        let mut entry =
            DescriptorEntry::new(goal.name.trim(), &implementation, self.dialect.language());
        entry.description = record.description().map(str::to_string);
        entry.phase = non_empty(&goal.phase);
        entry.execute = unit
            .execute
            .as_ref()
            .map(|execute| ExecuteTrigger {
                phase: non_empty(&execute.phase),
                goal: non_empty(&execute.goal),
                lifecycle: non_empty(&execute.lifecycle),
            })
            .filter(|trigger| {
                trigger.phase.is_some() || trigger.goal.is_some() || trigger.lifecycle.is_some()
            });
        entry.dependency_resolution = goal.dependency_resolution;
        entry.dependency_collection = goal.dependency_collection;
        entry.direct_invocation_only = goal.requires_direct_invocation.unwrap_or(false);
        entry.project_required = goal.requires_project.unwrap_or(true);
        entry.reports_required = goal.requires_reports.unwrap_or(false);
        entry.aggregator = goal.aggregator.unwrap_or(false);
        entry.online_required = goal.requires_online.unwrap_or(false);
        entry.inherited_by_default = goal.inherited_by_default.unwrap_or(true);
        entry.thread_safe = goal.thread_safe.unwrap_or(false) || record.is_thread_safe();
        entry.configurator = non_empty(&goal.configurator);
        entry.composer = non_empty(&goal.composer);
        if let Some(strategy) = &goal.instantiation_strategy {
            entry.instantiation_strategy = strategy.clone();
        }
        if let Some(strategy) = &goal.execution_strategy {
            entry.execution_strategy = strategy.clone();
        }
        entry.since = record.since().map(|since| since_or_default(since));
        entry.deprecated = record.deprecated().map(|reason| reason_or_default(reason));

        for member in unit.members() {
            match &member.kind {
                MemberKind::Parameter(parameter) => {
                    self.add_parameter(&mut entry, member, parameter)?;
                }
                MemberKind::Dependency(dependency) => {
                    self.add_dependency(&mut entry, member, dependency);
                }
            }
        }

        validate(&entry)?;
        entry.parameters.sort_by(|a, b| a.name.cmp(&b.name));
        entry.requirements.sort_by(|a, b| a.field_name.cmp(&b.field_name));
        Ok(entry)
    }

    fn add_parameter(
        &self,
        entry: &mut DescriptorEntry,
        member: &MemberMarker,
        marker: &ParameterMarker,
    ) -> Result<()> {
        let name = marker.name.clone().unwrap_or_else(|| member.member.clone());
        let implementation = entry.implementation.clone();
        let invalid = |reason: &str| Error::InvalidParameter {
            implementation: implementation.clone(),
            parameter: name.clone(),
            reason: reason.to_string(),
        };

        let expression = match (&marker.property, &marker.expression) {
            (Some(property), _) => {
                if property.contains(['$', '{', '}']) {
                    return Err(invalid(&format!(
                        "property '{property}' must be a plain key, not an expression"
                    )));
                }
                if marker.read_only {
                    return Err(invalid("a read-only parameter cannot declare a property"));
                }
                Some(format!("${{{property}}}"))
            }
            (None, expression) => non_empty(expression),
        };

        if let Some((role, hint)) = expression.as_deref().and_then(component_expression) {
            warn!(
                "{}#{}: component expression {} should be declared as a component",
                implementation,
                member.member,
                expression.as_deref().unwrap_or_default()
            );
            entry.requirements.push(DependencyRequirement {
                field_name: member.member.clone(),
                role,
                role_hint: hint.unwrap_or_else(|| DependencyRequirement::DEFAULT_HINT.to_string()),
            });
            return Ok(());
        }

        if [expression.as_deref(), marker.default_value.as_deref()].contains(&Some("${reports}")) {
            entry.reports_required = true;
        }

        let mut parameter = ParameterEntry::new(name.clone(), &member.declared_type);
        parameter.alias = non_empty(&marker.alias);
        parameter.default_value = non_empty(&marker.default_value);
        parameter.expression = expression;
        parameter.implementation = non_empty(&marker.implementation);
        parameter.description = member.description.clone();
        parameter.required = marker.required;
        parameter.read_only = marker.read_only;
        parameter.since = member.since.as_deref().map(since_or_default);
        parameter.deprecated = member.deprecated.as_deref().map(reason_or_default);

        if parameter.read_only && parameter.property().is_some() {
            return Err(invalid("a read-only parameter cannot declare a property"));
        }
        entry.parameters.push(parameter);
        Ok(())
    }

    fn add_dependency(
        &self,
        entry: &mut DescriptorEntry,
        member: &MemberMarker,
        marker: &DependencyMarker,
    ) {
        let role = marker
            .role
            .clone()
            .unwrap_or_else(|| member.declared_type.clone());

        if let Some(expression) = injected_expression(&role) {
            warn!(
                "{}#{}: {} should be injected with @Parameter(defaultValue = \"{}\", readonly = true), \
                 not as a component",
                entry.implementation, member.member, role, expression
            );
            let mut parameter = ParameterEntry::new(&member.member, &role);
            parameter.default_value = Some(expression.to_string());
            parameter.required = true;
            parameter.read_only = true;
            parameter.description = member.description.clone();
            parameter.since = member.since.as_deref().map(since_or_default);
            parameter.deprecated = member.deprecated.as_deref().map(reason_or_default);
            entry.parameters.push(parameter);
            return;
        }

        entry.requirements.push(DependencyRequirement {
            field_name: member.member.clone(),
            role,
            role_hint: marker
                .hint
                .clone()
                .unwrap_or_else(|| DependencyRequirement::DEFAULT_HINT.to_string()),
        });
    }
}

// Empty strings cannot survive the XML codec, so they are treated as absent
fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

fn since_or_default(since: &str) -> String {
    if since.trim().is_empty() {
        NO_VERSION_GIVEN.to_string()
    } else {
        since.to_string()
    }
}

fn reason_or_default(reason: &str) -> String {
    if reason.trim().is_empty() {
        NO_REASON_GIVEN.to_string()
    } else {
        reason.to_string()
    }
}

/// Model checks every finished entry must pass
pub fn validate(entry: &DescriptorEntry) -> Result<()> {
    if entry.goal.trim().is_empty() {
        return Err(Error::EmptyGoal {
            implementation: entry.implementation.clone(),
        });
    }

    let mut seen = HashSet::new();
    for parameter in &entry.parameters {
        if !seen.insert(parameter.name.as_str()) {
            return Err(Error::DuplicateParameter {
                goal: entry.goal.clone(),
                parameter: parameter.name.clone(),
            });
        }
        if parameter.read_only && parameter.property().is_some() {
            return Err(Error::InvalidParameter {
                implementation: entry.implementation.clone(),
                parameter: parameter.name.clone(),
                reason: "a read-only parameter cannot declare a property".to_string(),
            });
        }
    }
    Ok(())
}
