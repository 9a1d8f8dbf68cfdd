//! Goal discovery from doc-comment tags in Java sources.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, warn};
use tree_sitter::{Node, Parser};

use super::doc_tags::{DocComment, DocTag};
use super::walk::walk_files;
use super::{ScanRequest, prune_to_candidates};
use crate::error::{Error, Result};
use crate::types::{
    ClassMarker, DependencyMarker, ExecuteMarker, GoalMarker, MarkerRecord, MemberMarker,
    ParameterMarker, ResolutionScope,
};

const JAVA_LANG: &[&str] = &[
    "Boolean",
    "Byte",
    "CharSequence",
    "Character",
    "Class",
    "Double",
    "Enum",
    "Float",
    "Integer",
    "Iterable",
    "Long",
    "Number",
    "Object",
    "Runnable",
    "Short",
    "String",
    "StringBuffer",
    "StringBuilder",
    "Thread",
    "Void",
];

const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "double", "float", "int", "long", "short", "void",
];

/// Scanner for Java sources documented with `@goal`/`@parameter` tags
pub struct JavadocScanner {
    parser: Parser,
}

impl JavadocScanner {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .map_err(|e| Error::TreeSitterError(format!("Failed to set Java language: {e}")))?;
        Ok(Self { parser })
    }

    pub fn scan(&mut self, request: &ScanRequest) -> Result<HashMap<String, MarkerRecord>> {
        let mut all = HashMap::new();
        for root in &request.roots {
            for file in walk_files(root, &request.filter, |name| name.ends_with(".java"))? {
                debug!("Scanning source {}", file.path.display());
                let source = std::fs::read_to_string(&file.path)
                    .map_err(|e| Error::unreadable(&file.path, e))?;
                for record in self.scan_source(&source, &file.path)? {
                    all.insert(record.identity.clone(), record);
                }
            }
        }
        Ok(prune_to_candidates(all))
    }

    /// Records for every class declared in one compilation unit
    pub fn scan_source(&mut self, source: &str, path: &Path) -> Result<Vec<MarkerRecord>> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| Error::script(path, "parser returned no tree"))?;
        let root = tree.root_node();
        if root.has_error() {
            let line = first_error_line(root).unwrap_or(0) + 1;
            return Err(Error::script(path, format!("syntax error near line {line}")));
        }

        let mut resolver = TypeResolver::default();
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "package_declaration" => {
                    resolver.package = named_text(child, source).map(str::to_string);
                }
                "import_declaration" => resolver.add_import(child, source),
                _ => {}
            }
        }
        collect_local_classes(root, source, "", &mut resolver.local);

        let mut records = Vec::new();
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            if child.kind() == "class_declaration" {
                let prefix = resolver
                    .package
                    .as_ref()
                    .map(|package| format!("{package}."))
                    .unwrap_or_default();
                self.visit_class(child, source, path, &prefix, &resolver, &mut records)?;
            }
        }
        Ok(records)
    }

    fn visit_class(
        &self,
        class: Node,
        source: &str,
        path: &Path,
        prefix: &str,
        resolver: &TypeResolver,
        records: &mut Vec<MarkerRecord>,
    ) -> Result<()> {
        let Some(name) = class.child_by_field_name("name") else {
            return Ok(());
        };
        let identity = format!("{prefix}{}", text(name, source));
        let mut record = MarkerRecord::new(identity.clone(), path);

        record.ancestor = class
            .child_by_field_name("superclass")
            .and_then(|superclass| superclass.named_child(0))
            .map(|ty| resolver.resolve(text(ty, source)))
            .map(|resolved| crate::utils::type_name::erase_generics(&resolved).to_string());

        if let Some(doc) = doc_comment(class, source) {
            class_markers(&doc, &identity, &mut record.class_markers)?;
        }

        let Some(body) = class.child_by_field_name("body") else {
            records.push(record);
            return Ok(());
        };

        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            match member.kind() {
                "field_declaration" => {
                    let Some(doc) = doc_comment(member, source) else {
                        continue;
                    };
                    let Some(ty) = member.child_by_field_name("type") else {
                        continue;
                    };
                    let declared_type = resolver.resolve(text(ty, source));

                    let mut declarators = member.walk();
                    for declarator in member.children_by_field_name("declarator", &mut declarators) {
                        let Some(field) = declarator.child_by_field_name("name") else {
                            continue;
                        };
                        if let Some(marker) =
                            member_marker(&doc, text(field, source), &declared_type, &identity)?
                        {
                            record.members.push(marker);
                        }
                    }
                }
                "class_declaration" => {
                    let nested_prefix = format!("{identity}$");
                    self.visit_class(member, source, path, &nested_prefix, resolver, records)?;
                }
                _ => {}
            }
        }

        records.push(record);
        Ok(())
    }
}

fn text<'a>(node: Node, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}

fn named_text<'a>(node: Node, source: &'a str) -> Option<&'a str> {
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .find(|child| matches!(child.kind(), "scoped_identifier" | "identifier"));
    found.map(|child| text(child, source))
}

fn first_error_line(node: Node) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row);
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error_line)
}

/// The `/** */` comment directly preceding a declaration
fn doc_comment(node: Node, source: &str) -> Option<DocComment> {
    let previous = node.prev_named_sibling()?;
    let raw = text(previous, source);
    (previous.kind() == "block_comment" && raw.starts_with("/**")).then(|| DocComment::parse(raw))
}

fn collect_local_classes(node: Node, source: &str, prefix: &str, local: &mut HashSet<String>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if matches!(
            child.kind(),
            "class_declaration" | "interface_declaration" | "enum_declaration"
        ) {
            if let Some(name) = child.child_by_field_name("name") {
                let name = format!("{prefix}{}", text(name, source));
                if let Some(body) = child.child_by_field_name("body") {
                    collect_local_classes(body, source, &format!("{name}$"), local);
                }
                local.insert(name);
            }
        }
    }
}

pub(crate) fn class_markers(doc: &DocComment, identity: &str, markers: &mut Vec<ClassMarker>) -> Result<()> {
    if let Some(description) = &doc.description {
        markers.push(ClassMarker::Description(description.clone()));
    }
    if let Some(tag) = doc.tag("since") {
        markers.push(ClassMarker::Since(tag.value.clone()));
    }
    if let Some(tag) = doc.tag("deprecated") {
        markers.push(ClassMarker::Deprecated(tag.value.clone()));
    }
    if let Some(tag) = doc.tag("execute") {
        markers.push(ClassMarker::Execute(execute_marker(tag, identity)?));
    }
    if doc.tag("threadSafe").is_some_and(DocTag::flag) {
        markers.push(ClassMarker::ThreadSafe);
    }

    let Some(goal_tag) = doc.tag("goal") else {
        return Ok(());
    };

    let value = |name: &str| doc.tag(name).and_then(DocTag::non_empty_value).map(str::to_string);
    let flag = |name: &str| doc.tag(name).map(DocTag::flag);
    let scope = |name: &str| -> Result<Option<ResolutionScope>> {
        match doc.tag(name) {
            None => Ok(None),
            Some(tag) => match tag.non_empty_value() {
                None => Ok(Some(ResolutionScope::Runtime)),
                Some(value) => value.parse().map(Some).map_err(|reason| Error::InvalidTag {
                    implementation: identity.to_string(),
                    tag: name.to_string(),
                    reason,
                }),
            },
        }
    };

    let execution_strategy = if doc.has_tag("attainAlways") {
        Some("always".to_string())
    } else {
        value("executionStrategy")
    };

    markers.push(ClassMarker::Goal(GoalMarker {
        name: goal_tag.value.clone(),
        phase: value("phase"),
        dependency_resolution: scope("requiresDependencyResolution")?,
        dependency_collection: scope("requiresDependencyCollection")?,
        instantiation_strategy: value("instantiationStrategy"),
        execution_strategy,
        requires_project: flag("requiresProject"),
        requires_reports: flag("requiresReports"),
        aggregator: flag("aggregator"),
        requires_direct_invocation: flag("requiresDirectInvocation"),
        requires_online: flag("requiresOnline"),
        inherited_by_default: flag("inheritByDefault"),
        thread_safe: flag("threadSafe"),
        configurator: value("configurator"),
        composer: None,
    }));
    Ok(())
}

fn execute_marker(tag: &DocTag, identity: &str) -> Result<ExecuteMarker> {
    let mut parameters = tag.parameters();
    let marker = ExecuteMarker {
        phase: parameters.remove("phase"),
        goal: parameters.remove("goal"),
        lifecycle: parameters.remove("lifecycle"),
    };

    let invalid = |reason: &str| Error::InvalidTag {
        implementation: identity.to_string(),
        tag: "execute".to_string(),
        reason: reason.to_string(),
    };
    match (&marker.phase, &marker.goal) {
        (Some(_), Some(_)) => Err(invalid("phase and goal cannot both be specified")),
        (None, None) => Err(invalid("either phase or goal must be specified")),
        (None, Some(_)) if marker.lifecycle.is_some() => {
            Err(invalid("lifecycle requires a phase"))
        }
        _ => Ok(marker),
    }
}

pub(crate) fn member_marker(
    doc: &DocComment,
    member: &str,
    declared_type: &str,
    identity: &str,
) -> Result<Option<MemberMarker>> {
    let mut marker = if let Some(component) = doc.tag("component") {
        let mut parameters = component.parameters();
        MemberMarker::dependency(
            member,
            declared_type,
            DependencyMarker {
                role: parameters.remove("role"),
                hint: parameters
                    .remove("roleHint")
                    .or_else(|| parameters.remove("role-hint")),
            },
        )
    } else if let Some(parameter) = doc.tag("parameter") {
        let mut parameters = parameter.parameters();
        let mut marker = ParameterMarker {
            name: parameters.remove("name"),
            alias: parameters.remove("alias"),
            property: parameters.remove("property"),
            expression: parameters.remove("expression"),
            default_value: parameters.remove("default-value"),
            implementation: parameters.remove("implementation"),
            required: doc.has_tag("required"),
            read_only: doc.has_tag("readonly"),
        };

        if marker.property.is_some() && marker.expression.is_some() {
            return Err(Error::InvalidParameter {
                implementation: identity.to_string(),
                parameter: member.to_string(),
                reason: "property and expression cannot both be specified".to_string(),
            });
        }
        if marker.read_only && marker.default_value.is_none() {
            if let Some(expression) = marker.expression.take() {
                warn!(
                    "{identity}#{member}: read-only parameter uses expression {expression}, \
                     treating it as the default value"
                );
                marker.default_value = Some(expression);
            }
        }
        MemberMarker::parameter(member, declared_type, marker)
    } else {
        return Ok(None);
    };

    marker.description = doc.description.clone();
    marker.since = doc.tag("since").map(|tag| tag.value.clone());
    marker.deprecated = doc.tag("deprecated").map(|tag| tag.value.clone());
    Ok(Some(marker))
}

/// Resolves simple type names against the compilation unit's package and imports
#[derive(Debug, Default)]
struct TypeResolver {
    package: Option<String>,
    imports: HashMap<String, String>,
    local: HashSet<String>,
}

impl TypeResolver {
    fn add_import(&mut self, node: Node, source: &str) {
        let raw = text(node, source);
        if raw.contains('*') || raw.contains(" static ") {
            return;
        }
        if let Some(qualified) = named_text(node, source) {
            let simple = qualified.rsplit('.').next().unwrap_or(qualified);
            self.imports.insert(simple.to_string(), qualified.to_string());
        }
    }

    /// Rewrite every simple name in `type_text` to its qualified form
    fn resolve(&self, type_text: &str) -> String {
        let mut out = String::new();
        let mut identifier = String::new();
        let mut previous_word = false;

        let flush = |identifier: &mut String, out: &mut String, previous_word: &mut bool| {
            if identifier.is_empty() {
                return;
            }
            if *previous_word {
                out.push(' ');
            }
            out.push_str(&self.resolve_name(identifier));
            identifier.clear();
            *previous_word = true;
        };

        for c in type_text.chars() {
            if c.is_alphanumeric() || c == '_' || c == '$' || c == '.' {
                identifier.push(c);
            } else {
                flush(&mut identifier, &mut out, &mut previous_word);
                if c.is_whitespace() {
                    continue;
                }
                out.push(c);
                previous_word = c == '?';
            }
        }
        flush(&mut identifier, &mut out, &mut previous_word);
        out
    }

    fn resolve_name(&self, name: &str) -> String {
        if PRIMITIVES.contains(&name) || name == "extends" || name == "super" {
            return name.to_string();
        }

        let (head, rest) = match name.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (name, None),
        };
        let nested = |base: String| match rest {
            Some(rest) => format!("{base}${}", rest.replace('.', "$")),
            None => base,
        };

        if let Some(qualified) = self.imports.get(head) {
            return nested(qualified.clone());
        }
        if self.local.contains(head) {
            return nested(self.qualify(head));
        }
        if rest.is_some() && head.starts_with(char::is_lowercase) {
            // Already qualified
            return name.to_string();
        }
        if rest.is_none() && JAVA_LANG.contains(&head) {
            return format!("java.lang.{head}");
        }
        nested(self.qualify(head))
    }

    fn qualify(&self, simple: &str) -> String {
        match &self.package {
            Some(package) => format!("{package}.{simple}"),
            None => simple.to_string(),
        }
    }
}
