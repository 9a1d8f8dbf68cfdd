//! Ant-scripted goals described by `*.mojos.xml` metadata next to a `*.build.xml` script.

use roxmltree::{Document, Node};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};
use crate::scanner::ScanRequest;
use crate::scanner::walk::walk_files;
use crate::types::{
    ClassMarker, DependencyMarker, ExecuteMarker, GoalMarker, MarkerRecord, MemberKind,
    MemberMarker, ParameterMarker, ResolutionScope,
};

pub const METADATA_SUFFIX: &str = ".mojos.xml";
pub const SCRIPT_SUFFIX: &str = ".build.xml";
pub const MAP_ORIENTED: &str = "map-oriented";
pub const PATH_TRANSLATOR: &str = "org.apache.maven.project.path.PathTranslator";

const DEFAULT_PARAMETER_TYPE: &str = "java.lang.String";

/// Reads every metadata file below the request roots
pub fn scan(request: &ScanRequest) -> Result<Vec<MarkerRecord>> {
    let mut records = Vec::new();
    for root in &request.roots {
        for file in walk_files(root, &request.filter, |name| name.ends_with(METADATA_SUFFIX))? {
            let base = &file.relative[..file.relative.len() - METADATA_SUFFIX.len()];
            let script_relative = format!("{base}{SCRIPT_SUFFIX}");
            if !root.join(&script_relative).is_file() {
                return Err(Error::script(
                    &file.path,
                    format!("found orphaned plugin metadata, no script {script_relative}"),
                ));
            }

            debug!("Reading Ant metadata {}", file.path.display());
            let xml = std::fs::read_to_string(&file.path)
                .map_err(|e| Error::unreadable(&file.path, e))?;
            records.extend(parse_metadata(&xml, &file.path, &script_relative)?);
        }
    }
    Ok(records)
}

/// One record per `<mojo>` element; `script` is the script path relative to its root
pub fn parse_metadata(xml: &str, path: &Path, script: &str) -> Result<Vec<MarkerRecord>> {
    let document = Document::parse(xml).map_err(|e| Error::script(path, e.to_string()))?;
    let root = document.root_element();
    if !root.has_tag_name("pluginMetadata") {
        return Err(Error::script(
            path,
            format!("expected <pluginMetadata>, found <{}>", root.tag_name().name()),
        ));
    }

    let mut records = Vec::new();
    for mojo in children(root, "mojos").flat_map(|mojos| children(mojos, "mojo")) {
        records.push(parse_mojo(mojo, path, script)?);
    }
    Ok(records)
}

fn parse_mojo(mojo: Node, path: &Path, script: &str) -> Result<MarkerRecord> {
    let goal_name = child_text(mojo, "goal").unwrap_or_default();
    let implementation = match child_text(mojo, "call") {
        Some(call) => format!("{script}:{call}"),
        None => script.to_string(),
    };

    let mut record = MarkerRecord::new(format!("{script}#{goal_name}"), path);
    record.implementation = Some(implementation);

    let dependency_resolution = match child_text(mojo, "requiresDependencyResolution") {
        Some(scope) => {
            ResolutionScope::parse_optional(&scope).map_err(|reason| Error::script(path, reason))?
        }
        None => None,
    };

    record.class_markers.push(ClassMarker::Goal(GoalMarker {
        name: goal_name,
        phase: child_text(mojo, "phase"),
        dependency_resolution,
        requires_project: child_flag(mojo, "requiresProject"),
        requires_reports: child_flag(mojo, "requiresReports"),
        aggregator: child_flag(mojo, "aggregator"),
        requires_direct_invocation: child_flag(mojo, "requiresDirectInvocation"),
        requires_online: child_flag(mojo, "requiresOnline"),
        inherited_by_default: child_flag(mojo, "inheritByDefault"),
        configurator: Some(MAP_ORIENTED.to_string()),
        composer: Some(MAP_ORIENTED.to_string()),
        ..Default::default()
    }));

    if let Some(description) = child_text(mojo, "description") {
        record.class_markers.push(ClassMarker::Description(description));
    }
    if let Some(reason) = child_text(mojo, "deprecation") {
        record.class_markers.push(ClassMarker::Deprecated(reason));
    }
    if let Some(since) = child_text(mojo, "since") {
        record.class_markers.push(ClassMarker::Since(since));
    }
    if let Some(execution) = child(mojo, "execution") {
        record.class_markers.push(ClassMarker::Execute(ExecuteMarker {
            phase: child_text(execution, "phase"),
            goal: child_text(execution, "goal"),
            lifecycle: child_text(execution, "lifecycle"),
        }));
    }

    let mut seen = HashSet::new();
    for parameter in children(mojo, "parameters").flat_map(|p| children(p, "parameter")) {
        let marker = parse_parameter(parameter, path)?;
        if !seen.insert(marker.member.clone()) {
            return Err(Error::script(
                path,
                format!("duplicate parameter '{}'", marker.member),
            ));
        }
        record.members.push(marker);
    }

    for component in children(mojo, "components").flat_map(|c| children(c, "component")) {
        let Some(role) = child_text(component, "role") else {
            return Err(Error::script(path, "component without a role"));
        };
        record.members.push(MemberMarker::dependency(
            role.clone(),
            role,
            DependencyMarker {
                role: None,
                hint: child_text(component, "hint"),
            },
        ));
    }

    add_implied_members(&mut record.members);
    Ok(record)
}

fn parse_parameter(parameter: Node, path: &Path) -> Result<MemberMarker> {
    // The property, when given, is the name the script sees
    let name = child_text(parameter, "property")
        .or_else(|| child_text(parameter, "name"))
        .ok_or_else(|| {
            Error::script(path, "mojo parameter is missing both name and property")
        })?;

    let declared_type =
        child_text(parameter, "type").unwrap_or_else(|| DEFAULT_PARAMETER_TYPE.to_string());
    let mut marker = MemberMarker::parameter(
        name,
        declared_type,
        ParameterMarker {
            alias: child_text(parameter, "alias"),
            expression: child_text(parameter, "expression"),
            default_value: child_text(parameter, "defaultValue"),
            required: child_flag(parameter, "required").unwrap_or(false),
            read_only: child_flag(parameter, "readonly").unwrap_or(false),
            ..Default::default()
        },
    );
    marker.description = child_text(parameter, "description");
    marker.since = child_text(parameter, "since");
    marker.deprecated = child_text(parameter, "deprecation");
    Ok(marker)
}

/// Parameters and the path translator every Ant goal receives
fn add_implied_members(members: &mut Vec<MemberMarker>) {
    let has_member = |members: &[MemberMarker], name: &str| members.iter().any(|m| m.member == name);

    if !has_member(members, "basedir") {
        let mut basedir = MemberMarker::parameter(
            "basedir",
            "java.io.File",
            ParameterMarker {
                alias: Some("ant.basedir".into()),
                expression: Some("${antBasedir}".into()),
                default_value: Some("${basedir}".into()),
                required: true,
                ..Default::default()
            },
        );
        basedir.description = Some("The base directory from which to execute the Ant script.".into());
        members.push(basedir);
    }

    if !has_member(members, "messageLevel") {
        let mut level = MemberMarker::parameter(
            "messageLevel",
            "java.lang.String",
            ParameterMarker {
                alias: Some("ant.messageLevel".into()),
                expression: Some("${antMessageLevel}".into()),
                default_value: Some("info".into()),
                ..Default::default()
            },
        );
        level.description =
            Some("The message-level used to tune the verbosity of Ant logging.".into());
        members.push(level);
    }

    for (name, declared_type, expression, description) in [
        (
            "project",
            "org.apache.maven.project.MavenProject",
            "${project}",
            "The current project instance.",
        ),
        (
            "session",
            "org.apache.maven.execution.MavenSession",
            "${session}",
            "The current session instance.",
        ),
        (
            "mojoExecution",
            "org.apache.maven.plugin.MojoExecution",
            "${mojoExecution}",
            "The current mojo execution instance.",
        ),
    ] {
        if has_member(members, name) {
            continue;
        }
        let mut injected = MemberMarker::parameter(
            name,
            declared_type,
            ParameterMarker {
                default_value: Some(expression.into()),
                required: true,
                read_only: true,
                ..Default::default()
            },
        );
        injected.description = Some(description.into());
        members.push(injected);
    }

    let has_translator = members.iter().any(|member| match &member.kind {
        MemberKind::Dependency(dependency) => {
            dependency.role.as_deref().unwrap_or(&member.declared_type) == PATH_TRANSLATOR
        }
        MemberKind::Parameter(_) => false,
    });
    if !has_translator {
        members.push(MemberMarker::dependency(
            "pathTranslator",
            PATH_TRANSLATOR,
            DependencyMarker::default(),
        ));
    }
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| child.has_tag_name(name))
}

fn children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(move |child| child.has_tag_name(name))
}

fn child_text(node: Node, name: &str) -> Option<String> {
    child(node, name)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn child_flag(node: Node, name: &str) -> Option<bool> {
    child_text(node, name).map(|value| value.eq_ignore_ascii_case("true"))
}
