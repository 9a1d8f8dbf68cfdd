//! Beanshell-scripted goals declared with doc-comment tags inside `*.bsh` files.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

use crate::error::{Error, Result};
use crate::scanner::ScanRequest;
use crate::scanner::doc_tags::DocComment;
use crate::scanner::javadoc::{class_markers, member_marker};
use crate::scanner::walk::walk_files;
use crate::types::{ClassMarker, MarkerRecord};

pub const SCRIPT_SUFFIX: &str = ".bsh";
pub const CONFIGURATOR: &str = "bsh";

const DEFAULT_PARAMETER_TYPE: &str = "java.lang.String";

pub fn scan(request: &ScanRequest) -> Result<Vec<MarkerRecord>> {
    let mut records = Vec::new();
    for root in &request.roots {
        for file in walk_files(root, &request.filter, |name| name.ends_with(SCRIPT_SUFFIX))? {
            debug!("Reading Beanshell script {}", file.path.display());
            let source = std::fs::read_to_string(&file.path)
                .map_err(|e| Error::unreadable(&file.path, e))?;
            if let Some(record) = parse_script(&source, &file.path, &file.relative)? {
                records.push(record);
            }
        }
    }
    Ok(records)
}

/// Scripts without a `@goal` comment are helpers and yield `None`
pub fn parse_script(source: &str, path: &Path, relative: &str) -> Result<Option<MarkerRecord>> {
    static COMMENT_REGEX: OnceLock<Regex> = OnceLock::new();
    let comments = COMMENT_REGEX
        .get_or_init(|| Regex::new(r"(?s)/\*\*.*?\*/").expect("Invalid doc comment regex"));

    let mut record = MarkerRecord::new(relative, path);
    record.implementation = Some(relative.to_string());

    for found in comments.find_iter(source) {
        let doc = DocComment::parse(found.as_str());

        if doc.has_tag("goal") && record.goal().is_none() {
            class_markers(&doc, relative, &mut record.class_markers)?;
            continue;
        }
        if !doc.has_tag("parameter") && !doc.has_tag("component") {
            continue;
        }

        let Some(member) = declared_member(&source[found.end()..]) else {
            return Err(Error::script(
                path,
                format!(
                    "no setter or variable follows the comment at byte {}",
                    found.start()
                ),
            ));
        };
        let declared_type = doc
            .tag("parameter")
            .and_then(|tag| tag.parameters().remove("type"))
            .unwrap_or_else(|| DEFAULT_PARAMETER_TYPE.to_string());
        if let Some(marker) = member_marker(&doc, &member, &declared_type, relative)? {
            record.members.push(marker);
        }
    }

    let Some(goal) = record.class_markers.iter_mut().find_map(|marker| match marker {
        ClassMarker::Goal(goal) => Some(goal),
        _ => None,
    }) else {
        return Ok(None);
    };
    if goal.configurator.is_none() {
        goal.configurator = Some(CONFIGURATOR.to_string());
    }
    Ok(Some(record))
}

/// Member declared by the first code line after a comment: `setFoo( value )`
/// declares `foo`, `File output;` declares `output`.
fn declared_member(rest: &str) -> Option<String> {
    static SETTER_REGEX: OnceLock<Regex> = OnceLock::new();
    static VARIABLE_REGEX: OnceLock<Regex> = OnceLock::new();
    let setter = SETTER_REGEX.get_or_init(|| {
        Regex::new(r"^\s*(?:set|add)([A-Za-z_]\w*)\s*\(").expect("Invalid setter regex")
    });
    let variable = VARIABLE_REGEX.get_or_init(|| {
        Regex::new(r"^\s*(?:[\w.<>\[\]]+\s+)?([A-Za-z_]\w*)\s*[;=]").expect("Invalid variable regex")
    });

    let line = rest.lines().find(|line| !line.trim().is_empty())?;
    if let Some(caps) = setter.captures(line) {
        let name = caps.get(1)?.as_str();
        let mut chars = name.chars();
        let first = chars.next()?;
        return Some(first.to_lowercase().chain(chars).collect());
    }
    variable
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|name| name.as_str().to_string())
}
