//! Parser for `/** ... */` comments with block tags such as `@goal compile`.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// A doc comment split into its leading description and block tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocComment {
    pub description: Option<String>,
    pub tags: Vec<DocTag>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocTag {
    pub name: String,
    pub value: String,
}

impl DocTag {
    /// `key="value"` and `key=value` pairs inside the tag value
    pub fn parameters(&self) -> BTreeMap<String, String> {
        static PARAMETER_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = PARAMETER_REGEX.get_or_init(|| {
            Regex::new(r#"([\w.-]+)\s*=\s*(?:"([^"]*)"|'([^']*)'|(\S+))"#)
                .expect("Invalid tag parameter regex")
        });

        regex
            .captures_iter(&self.value)
            .filter_map(|caps| {
                let key = caps.get(1)?.as_str().to_string();
                let value = caps
                    .get(2)
                    .or_else(|| caps.get(3))
                    .or_else(|| caps.get(4))?
                    .as_str()
                    .to_string();
                Some((key, value))
            })
            .collect()
    }

    /// Tag value as a flag: a bare tag means true
    pub fn flag(&self) -> bool {
        !matches!(self.value.trim(), "false" | "no")
    }

    pub fn non_empty_value(&self) -> Option<&str> {
        let value = self.value.trim();
        (!value.is_empty()).then_some(value)
    }
}

impl DocComment {
    pub fn parse(raw: &str) -> Self {
        let body = raw.trim();
        let body = body.strip_prefix("/**").unwrap_or(body);
        let body = body.strip_suffix("*/").unwrap_or(body);

        let mut description = Vec::new();
        let mut tags: Vec<DocTag> = Vec::new();

        for line in body.lines() {
            let line = line.trim_start();
            let line = line.strip_prefix('*').unwrap_or(line);
            let line = line.strip_prefix(' ').unwrap_or(line).trim_end();

            if let Some(tag) = line.strip_prefix('@') {
                let name_end = tag
                    .find(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
                    .unwrap_or(tag.len());
                if name_end > 0 {
                    tags.push(DocTag {
                        name: tag[..name_end].to_string(),
                        value: tag[name_end..].trim().to_string(),
                    });
                    continue;
                }
            }

            match tags.last_mut() {
                Some(tag) => {
                    if !line.trim().is_empty() {
                        if !tag.value.is_empty() {
                            tag.value.push(' ');
                        }
                        tag.value.push_str(line.trim());
                    }
                }
                None => description.push(line.to_string()),
            }
        }

        let description = description.join("\n").trim().to_string();
        Self {
            description: (!description.is_empty()).then_some(description),
            tags,
        }
    }

    pub fn tag(&self, name: &str) -> Option<&DocTag> {
        self.tags.iter().find(|tag| tag.name == name)
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tag(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_and_tags() {
        let doc = DocComment::parse(
            r#"/**
             * Compiles the sources.
             *
             * Second paragraph.
             * @goal compile
             * @phase compile
             * @requiresDependencyResolution
             * @deprecated use the
             *   new compiler
             */"#,
        );
        assert_eq!(
            doc.description.as_deref(),
            Some("Compiles the sources.\n\nSecond paragraph.")
        );
        assert_eq!(doc.tag("goal").unwrap().value, "compile");
        assert_eq!(doc.tag("requiresDependencyResolution").unwrap().value, "");
        assert_eq!(doc.tag("deprecated").unwrap().value, "use the new compiler");
        assert!(!doc.has_tag("aggregator"));
    }

    #[test]
    fn test_tag_parameters() {
        let doc = DocComment::parse(
            r#"/** @parameter expression="${foo.bar}" default-value=${basedir}/src alias='x' */"#,
        );
        let params = doc.tag("parameter").unwrap().parameters();
        assert_eq!(params["expression"], "${foo.bar}");
        assert_eq!(params["default-value"], "${basedir}/src");
        assert_eq!(params["alias"], "x");
    }

    #[test]
    fn test_flags() {
        let doc = DocComment::parse("/**\n * @threadSafe\n * @requiresProject false\n */");
        assert!(doc.tag("threadSafe").unwrap().flag());
        assert!(!doc.tag("requiresProject").unwrap().flag());
    }

    #[test]
    fn test_no_description() {
        let doc = DocComment::parse("/** @component */");
        assert_eq!(doc.description, None);
        assert_eq!(doc.tags.len(), 1);
    }
}
