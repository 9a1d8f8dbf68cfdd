//! Raw declarations found by the scanners, before inheritance is applied.

use serde::Serialize;
use std::path::PathBuf;

use super::ResolutionScope;

/// Everything a scanner found on one class or script
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerRecord {
    /// Fully-qualified class name, or the relative script path for script dialects
    pub identity: String,
    /// Fully-qualified name of the immediate parent class
    pub ancestor: Option<String>,
    /// File or archive entry the record was read from
    pub source: PathBuf,
    /// Implementation string when it differs from the identity (scripts)
    pub implementation: Option<String>,
    pub class_markers: Vec<ClassMarker>,
    pub members: Vec<MemberMarker>,
}

impl MarkerRecord {
    pub fn new(identity: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            identity: identity.into(),
            ancestor: None,
            source: source.into(),
            implementation: None,
            class_markers: Vec::new(),
            members: Vec::new(),
        }
    }

    pub fn goal(&self) -> Option<&GoalMarker> {
        self.class_markers.iter().find_map(|marker| match marker {
            ClassMarker::Goal(goal) => Some(goal),
            _ => None,
        })
    }

    pub fn execute(&self) -> Option<&ExecuteMarker> {
        self.class_markers.iter().find_map(|marker| match marker {
            ClassMarker::Execute(execute) => Some(execute),
            _ => None,
        })
    }

    pub fn is_thread_safe(&self) -> bool {
        self.class_markers
            .iter()
            .any(|marker| matches!(marker, ClassMarker::ThreadSafe))
    }

    pub fn deprecated(&self) -> Option<&str> {
        self.class_markers.iter().find_map(|marker| match marker {
            ClassMarker::Deprecated(reason) => Some(reason.as_str()),
            _ => None,
        })
    }

    pub fn since(&self) -> Option<&str> {
        self.class_markers.iter().find_map(|marker| match marker {
            ClassMarker::Since(version) => Some(version.as_str()),
            _ => None,
        })
    }

    pub fn description(&self) -> Option<&str> {
        self.class_markers.iter().find_map(|marker| match marker {
            ClassMarker::Description(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// True when a recognized class-level marker was found on the unit itself
    pub fn is_candidate(&self) -> bool {
        self.class_markers.iter().any(|marker| {
            matches!(
                marker,
                ClassMarker::Goal(_) | ClassMarker::Execute(_) | ClassMarker::ThreadSafe
            )
        })
    }

    pub fn is_empty(&self) -> bool {
        self.class_markers.is_empty() && self.members.is_empty()
    }

    /// Drop goal markers so the record only contributes inherited members
    pub fn without_goal(mut self) -> Self {
        self.class_markers
            .retain(|marker| !matches!(marker, ClassMarker::Goal(_)));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ClassMarker {
    Goal(GoalMarker),
    Execute(ExecuteMarker),
    ThreadSafe,
    Deprecated(String),
    Since(String),
    Description(String),
}

/// Goal declaration. Unset attributes stay `None` so the builder can apply
/// its defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GoalMarker {
    pub name: String,
    pub phase: Option<String>,
    pub dependency_resolution: Option<ResolutionScope>,
    pub dependency_collection: Option<ResolutionScope>,
    pub instantiation_strategy: Option<String>,
    pub execution_strategy: Option<String>,
    pub requires_project: Option<bool>,
    pub requires_reports: Option<bool>,
    pub aggregator: Option<bool>,
    pub requires_direct_invocation: Option<bool>,
    pub requires_online: Option<bool>,
    pub inherited_by_default: Option<bool>,
    pub thread_safe: Option<bool>,
    pub configurator: Option<String>,
    pub composer: Option<String>,
}

impl GoalMarker {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Lifecycle fork requested before the goal runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecuteMarker {
    pub phase: Option<String>,
    pub goal: Option<String>,
    pub lifecycle: Option<String>,
}

/// Marker attached to a field or setter, keyed by member name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberMarker {
    pub member: String,
    /// Qualified type including generic arguments, e.g. `java.util.List<java.lang.String>`
    pub declared_type: String,
    pub description: Option<String>,
    pub since: Option<String>,
    pub deprecated: Option<String>,
    pub kind: MemberKind,
}

impl MemberMarker {
    pub fn parameter(
        member: impl Into<String>,
        declared_type: impl Into<String>,
        parameter: ParameterMarker,
    ) -> Self {
        Self {
            member: member.into(),
            declared_type: declared_type.into(),
            description: None,
            since: None,
            deprecated: None,
            kind: MemberKind::Parameter(parameter),
        }
    }

    pub fn dependency(
        member: impl Into<String>,
        declared_type: impl Into<String>,
        dependency: DependencyMarker,
    ) -> Self {
        Self {
            member: member.into(),
            declared_type: declared_type.into(),
            description: None,
            since: None,
            deprecated: None,
            kind: MemberKind::Dependency(dependency),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MemberKind {
    Parameter(ParameterMarker),
    Dependency(DependencyMarker),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParameterMarker {
    /// Overrides the member name
    pub name: Option<String>,
    pub alias: Option<String>,
    /// User-settable property key, without the `${}` wrapper
    pub property: Option<String>,
    /// Raw expression from dialects that predate property keys
    pub expression: Option<String>,
    pub default_value: Option<String>,
    pub implementation: Option<String>,
    pub required: bool,
    pub read_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyMarker {
    /// Defaults to the member type
    pub role: Option<String>,
    pub hint: Option<String>,
}
