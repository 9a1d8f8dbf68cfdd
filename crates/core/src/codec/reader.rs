use roxmltree::{Document, Node};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::types::{
    DependencyRequirement, DescriptorEntry, ExecuteTrigger, ParameterEntry, PluginDescriptor,
    PluginInfo, ResolutionScope,
};

/// Parse a descriptor document, relocating legacy `<since>` placements
pub fn deserialize(xml: &str) -> Result<PluginDescriptor> {
    let document = Document::parse(xml)?;
    let root = document.root_element();
    if !root.has_tag_name("plugin") {
        return Err(Error::Document(format!(
            "expected <plugin> root element, found <{}>",
            root.tag_name().name()
        )));
    }

    let mut plugin = PluginInfo::new(
        text(root, "groupId").unwrap_or_default(),
        text(root, "artifactId").unwrap_or_default(),
        text(root, "version").unwrap_or_default(),
    );
    plugin.name = text(root, "name");
    plugin.description = text(root, "description");
    plugin.goal_prefix = text(root, "goalPrefix");
    plugin.isolated_realm = flag(root, "isolatedRealm", false)?;
    plugin.inherited_by_default = flag(root, "inheritedByDefault", true)?;

    let goals = match child(root, "mojos") {
        Some(mojos) => elements(mojos, "mojo")
            .map(read_entry)
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };

    Ok(PluginDescriptor { plugin, goals })
}

fn read_entry(node: Node) -> Result<DescriptorEntry> {
    let goal = required(node, "goal")?;
    let mut entry = DescriptorEntry::new(
        &goal,
        required(node, "implementation")?,
        text(node, "language").unwrap_or_else(|| "java".to_string()),
    );

    entry.description = text(node, "description");
    entry.phase = text(node, "phase");
    let execute = ExecuteTrigger {
        phase: text(node, "executePhase"),
        goal: text(node, "executeGoal"),
        lifecycle: text(node, "executeLifecycle"),
    };
    if execute != ExecuteTrigger::default() {
        entry.execute = Some(execute);
    }
    entry.dependency_resolution = scope(node, "requiresDependencyResolution")?;
    entry.dependency_collection = scope(node, "requiresDependencyCollection")?;
    entry.direct_invocation_only = flag(node, "requiresDirectInvocation", false)?;
    entry.project_required = flag(node, "requiresProject", true)?;
    entry.reports_required = flag(node, "requiresReports", false)?;
    entry.aggregator = flag(node, "aggregator", false)?;
    entry.online_required = flag(node, "requiresOnline", false)?;
    entry.inherited_by_default = flag(node, "inheritedByDefault", true)?;
    entry.thread_safe = flag(node, "threadSafe", false)?;
    entry.configurator = text(node, "configurator");
    entry.composer = text(node, "composer");
    if let Some(strategy) = text(node, "instantiationStrategy") {
        entry.instantiation_strategy = strategy;
    }
    if let Some(strategy) = text(node, "executionStrategy") {
        entry.execution_strategy = strategy;
    }
    entry.since = text(node, "since");
    entry.deprecated = text(node, "deprecated");

    entry.parameters = read_parameters(node, &goal)?;
    if let Some(configuration) = child(node, "configuration") {
        for element in configuration.children().filter(Node::is_element) {
            let name = element.tag_name().name();
            match entry.parameters.iter_mut().find(|p| p.name == name) {
                Some(parameter) => {
                    parameter.default_value = element.attribute("default-value").map(str::to_string);
                    parameter.expression = element.text().map(str::to_string);
                }
                None => debug!("Goal '{}': configuration for undeclared parameter '{}'", goal, name),
            }
        }
    }

    if let Some(requirements) = child(node, "requirements") {
        for requirement in elements(requirements, "requirement") {
            entry.requirements.push(DependencyRequirement {
                field_name: required(requirement, "field-name")?,
                role: required(requirement, "role")?,
                role_hint: text(requirement, "role-hint")
                    .unwrap_or_else(|| DependencyRequirement::DEFAULT_HINT.to_string()),
            });
        }
    }

    Ok(entry)
}

/// Older generators wrote a parameter's `<since>` as the next sibling of
/// its `<parameter>` element. Such tags are collected first and applied by
/// name once every parameter is read; a nested `<since>` always wins.
fn read_parameters(node: Node, goal: &str) -> Result<Vec<ParameterEntry>> {
    let Some(block) = child(node, "parameters") else {
        return Ok(Vec::new());
    };

    let mut parameters = Vec::new();
    let mut relocated = Vec::new();
    let mut previous: Option<Node> = None;

    for element in block.children().filter(Node::is_element) {
        match element.tag_name().name() {
            "parameter" => parameters.push(read_parameter(element)?),
            "since" => {
                let owner = previous
                    .filter(|p| p.has_tag_name("parameter") && child(*p, "since").is_none())
                    .and_then(|p| text(p, "name"));
                match owner {
                    Some(name) => {
                        warn!(
                            "Goal '{}': relocating misplaced <since> of parameter '{}'",
                            goal, name
                        );
                        relocated.push((name, element.text().unwrap_or_default().to_string()));
                    }
                    None => warn!("Goal '{}': ignoring <since> that belongs to no parameter", goal),
                }
            }
            other => debug!("Goal '{}': ignoring <{}> in parameters", goal, other),
        }
        previous = Some(element);
    }

    for (name, since) in relocated {
        if let Some(parameter) = parameters.iter_mut().find(|p| p.name == name) {
            parameter.since.get_or_insert(since);
        }
    }
    Ok(parameters)
}

fn read_parameter(node: Node) -> Result<ParameterEntry> {
    let mut parameter = ParameterEntry::new(required(node, "name")?, required(node, "type")?);
    parameter.alias = text(node, "alias");
    parameter.since = text(node, "since");
    parameter.deprecated = text(node, "deprecated");
    parameter.implementation = text(node, "implementation");
    parameter.required = flag(node, "required", false)?;
    parameter.read_only = !flag(node, "editable", true)?;
    parameter.description = text(node, "description");
    Ok(parameter)
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.has_tag_name(name))
}

fn elements<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |n| n.is_element() && n.has_tag_name(name))
}

fn text(node: Node, name: &str) -> Option<String> {
    child(node, name).map(|n| n.text().unwrap_or_default().to_string())
}

fn required(node: Node, name: &str) -> Result<String> {
    text(node, name).ok_or_else(|| {
        Error::Document(format!(
            "<{}> is missing required element <{}>",
            node.tag_name().name(),
            name
        ))
    })
}

fn flag(node: Node, name: &str, default: bool) -> Result<bool> {
    match text(node, name) {
        None => Ok(default),
        Some(value) => match value.trim() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(Error::Document(format!(
                "<{}> must be true or false, found '{}'",
                name, other
            ))),
        },
    }
}

fn scope(node: Node, name: &str) -> Result<Option<ResolutionScope>> {
    match text(node, name) {
        None => Ok(None),
        Some(value) => ResolutionScope::parse_optional(&value)
            .map_err(|reason| Error::Document(format!("<{}>: {}", name, reason))),
    }
}
