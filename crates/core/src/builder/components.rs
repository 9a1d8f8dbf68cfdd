//! Objects the host injects through expressions rather than component lookup.

/// Role to expression for host objects that must be declared as read-only
/// parameters instead of component requirements
pub const MAVEN_COMPONENTS: [(&str, &str); 5] = [
    ("org.apache.maven.execution.MavenSession", "${session}"),
    ("org.apache.maven.project.MavenProject", "${project}"),
    ("org.apache.maven.plugin.MojoExecution", "${mojoExecution}"),
    ("org.apache.maven.plugin.descriptor.PluginDescriptor", "${plugin}"),
    ("org.apache.maven.settings.Settings", "${settings}"),
];

pub fn injected_expression(role: &str) -> Option<&'static str> {
    MAVEN_COMPONENTS
        .iter()
        .find(|(known, _)| *known == role)
        .map(|(_, expression)| *expression)
}

/// Parse a legacy `${component.<role>[#hint]}` expression into role and hint
pub fn component_expression(expression: &str) -> Option<(String, Option<String>)> {
    let inner = expression.strip_prefix("${component.")?.strip_suffix('}')?;
    match inner.split_once('#') {
        Some((role, hint)) => Some((role.to_string(), Some(hint.to_string()))),
        None => Some((inner.to_string(), None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_injected_expression() {
        assert_eq!(
            injected_expression("org.apache.maven.project.MavenProject"),
            Some("${project}")
        );
        assert_eq!(injected_expression("org.example.Archiver"), None);
    }

    #[test]
    fn test_component_expression() {
        assert_eq!(
            component_expression("${component.org.example.Archiver#zip}"),
            Some(("org.example.Archiver".to_string(), Some("zip".to_string())))
        );
        assert_eq!(
            component_expression("${component.org.example.Archiver}"),
            Some(("org.example.Archiver".to_string(), None))
        );
        assert_eq!(component_expression("${project}"), None);
    }
}
