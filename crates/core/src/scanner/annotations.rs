//! Goal discovery from compiled class files.

use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{ScanRequest, prune_to_candidates};
use super::class_file::{
    Annotation, ClassFile, MemberInfo, descriptor_to_type, method_parameter_types,
    method_return_type, method_signature_parameter_types, signature_to_type,
};
use super::walk::{archive_entry_path, is_archive, read_archive, walk_files};
use crate::error::{Error, Result};
use crate::types::{
    ClassMarker, DependencyMarker, ExecuteMarker, GoalMarker, MarkerRecord, MemberMarker,
    ParameterMarker, ResolutionScope,
};

pub const MOJO: &str = "org.apache.maven.plugins.annotations.Mojo";
pub const EXECUTE: &str = "org.apache.maven.plugins.annotations.Execute";
pub const PARAMETER: &str = "org.apache.maven.plugins.annotations.Parameter";
pub const COMPONENT: &str = "org.apache.maven.plugins.annotations.Component";
pub const THREAD_SAFE: &str = "org.apache.maven.tools.plugin.annotations.ThreadSafe";
pub const DEPRECATED: &str = "java.lang.Deprecated";

/// Scanner for annotated class files in directories and jar archives
pub struct AnnotationScanner {
    class_entry: Regex,
}

impl AnnotationScanner {
    pub fn new() -> Result<Self> {
        // Excludes module-info.class and package-info.class
        let class_entry = Regex::new(r"(^|/)[^-/]+\.class$")
            .map_err(|e| Error::ConfigError(format!("Invalid class entry pattern: {e}")))?;
        Ok(Self { class_entry })
    }

    fn is_class_entry(&self, name: &str) -> bool {
        self.class_entry.is_match(name)
    }

    /// Scan the request's roots and return every candidate unit plus each
    /// ancestor reachable from one, keyed by class name.
    pub fn scan(&self, request: &ScanRequest) -> Result<HashMap<String, MarkerRecord>> {
        let mut all = HashMap::new();

        // Dependencies first so project classes win on name clashes
        for archive in &request.dependencies {
            for record in self.scan_location(archive, request, false)? {
                all.insert(record.identity.clone(), record.without_goal());
            }
        }
        for root in &request.roots {
            for record in self.scan_location(root, request, true)? {
                all.insert(record.identity.clone(), record);
            }
        }

        let pruned = prune_to_candidates(all);
        info!(
            "Found {} annotated classes (including ancestors)",
            pruned.len()
        );
        Ok(pruned)
    }

    fn scan_location(
        &self,
        location: &Path,
        request: &ScanRequest,
        apply_filter: bool,
    ) -> Result<Vec<MarkerRecord>> {
        let mut records = Vec::new();
        if is_archive(location) {
            debug!("Scanning archive {}", location.display());
            let entries = read_archive(location, |name| {
                self.is_class_entry(name) && (!apply_filter || request.filter.matches(name))
            })?;
            for (name, bytes) in entries {
                let source = archive_entry_path(location, &name);
                let class = ClassFile::parse(&bytes, &source)?;
                records.push(record_from_class(class, source)?);
            }
        } else {
            let filter = if apply_filter {
                request.filter.clone()
            } else {
                Default::default()
            };
            for file in walk_files(location, &filter, |name| self.is_class_entry(name))? {
                debug!("Scanning class {}", file.path.display());
                let bytes =
                    std::fs::read(&file.path).map_err(|e| Error::unreadable(&file.path, e))?;
                let class = ClassFile::parse(&bytes, &file.path)?;
                records.push(record_from_class(class, file.path)?);
            }
        }
        Ok(records)
    }
}

/// Turn one decoded class into a marker record
pub fn record_from_class(class: ClassFile, source: PathBuf) -> Result<MarkerRecord> {
    let mut record = MarkerRecord::new(class.name.clone(), source.clone());
    record.ancestor = class
        .super_name
        .clone()
        .filter(|name| name != "java.lang.Object");

    for annotation in &class.annotations {
        match annotation.type_name.as_str() {
            MOJO => record
                .class_markers
                .push(ClassMarker::Goal(goal_marker(annotation, &source)?)),
            EXECUTE => record
                .class_markers
                .push(ClassMarker::Execute(ExecuteMarker {
                    phase: annotation.enum_constant("phase").and_then(|c| phase_id(&c)),
                    goal: annotation.string("goal").filter(|g| !g.is_empty()),
                    lifecycle: annotation.string("lifecycle").filter(|l| !l.is_empty()),
                })),
            THREAD_SAFE => record.class_markers.push(ClassMarker::ThreadSafe),
            DEPRECATED => record
                .class_markers
                .push(ClassMarker::Deprecated(String::new())),
            _ => {}
        }
    }

    for field in &class.fields {
        let declared_type = match &field.signature {
            Some(signature) => signature_to_type(signature),
            None => descriptor_to_type(&field.descriptor),
        }
        .map_err(|e| Error::class_format(&source, e.to_string()))?;

        if let Some(marker) = member_marker(field, &field.name, &declared_type) {
            record.members.push(marker);
        }
    }

    for method in &class.methods {
        let Some(member) = setter_member_name(method) else {
            continue;
        };
        if method.annotation(PARAMETER).is_none() {
            continue;
        }
        let declared = setter_argument_type(method)
            .map_err(|e| Error::class_format(&source, e.to_string()))?;
        let Some(declared_type) = declared else {
            continue;
        };
        if let Some(marker) = member_marker(method, &member, &declared_type) {
            record.members.push(marker);
        }
    }

    Ok(record)
}

fn goal_marker(annotation: &Annotation, source: &Path) -> Result<GoalMarker> {
    let scope = |element: &str| -> Result<Option<ResolutionScope>> {
        match annotation.enum_constant(element) {
            Some(constant) => ResolutionScope::parse_optional(&constant)
                .map_err(|reason| Error::class_format(source, reason)),
            None => Ok(None),
        }
    };

    Ok(GoalMarker {
        name: annotation.string("name").unwrap_or_default(),
        phase: annotation
            .enum_constant("defaultPhase")
            .and_then(|c| phase_id(&c)),
        dependency_resolution: scope("requiresDependencyResolution")?,
        dependency_collection: scope("requiresDependencyCollection")?,
        instantiation_strategy: annotation
            .enum_constant("instantiationStrategy")
            .map(|c| constant_to_id(&c)),
        execution_strategy: annotation.string("executionStrategy"),
        requires_project: annotation.boolean("requiresProject"),
        requires_reports: annotation.boolean("requiresReports"),
        aggregator: annotation.boolean("aggregator"),
        requires_direct_invocation: annotation.boolean("requiresDirectInvocation"),
        requires_online: annotation.boolean("requiresOnline"),
        inherited_by_default: annotation.boolean("inheritByDefault"),
        thread_safe: annotation.boolean("threadSafe"),
        configurator: annotation.string("configurator").filter(|c| !c.is_empty()),
        composer: None,
    })
}

fn member_marker(member: &MemberInfo, name: &str, declared_type: &str) -> Option<MemberMarker> {
    let mut marker = if let Some(parameter) = member.annotation(PARAMETER) {
        let non_empty = |element: &str| parameter.string(element).filter(|v| !v.is_empty());
        MemberMarker::parameter(
            name,
            declared_type,
            ParameterMarker {
                name: non_empty("name"),
                alias: non_empty("alias"),
                property: non_empty("property"),
                expression: None,
                default_value: non_empty("defaultValue"),
                implementation: parameter
                    .class("implementation")
                    .filter(|class| class != "java.lang.Object"),
                required: parameter.boolean("required").unwrap_or(false),
                read_only: parameter.boolean("readonly").unwrap_or(false),
            },
        )
    } else if let Some(component) = member.annotation(COMPONENT) {
        MemberMarker::dependency(
            name,
            declared_type,
            DependencyMarker {
                role: component
                    .class("role")
                    .filter(|role| role != "java.lang.Object"),
                hint: component.string("hint").filter(|h| !h.is_empty()),
            },
        )
    } else {
        return None;
    };

    if member.annotation(DEPRECATED).is_some() {
        marker.deprecated = Some(String::new());
    }
    Some(marker)
}

/// `setFoo`/`addFoo` on a public instance method with one argument and void
/// return declares member `foo`
fn setter_member_name(method: &MemberInfo) -> Option<String> {
    if !method.is_public() || method.is_static() {
        return None;
    }
    let rest = method
        .name
        .strip_prefix("set")
        .or_else(|| method.name.strip_prefix("add"))?;
    let mut chars = rest.chars();
    let first = chars.next()?;
    Some(first.to_lowercase().chain(chars).collect())
}

fn setter_argument_type(method: &MemberInfo) -> std::io::Result<Option<String>> {
    if method_return_type(&method.descriptor)? != "void" {
        return Ok(None);
    }
    let mut arguments = match &method.signature {
        Some(signature) => method_signature_parameter_types(signature)?,
        None => method_parameter_types(&method.descriptor)?,
    };
    if arguments.len() != 1 {
        return Ok(None);
    }
    Ok(arguments.pop())
}

/// `PROCESS_CLASSES` becomes `process-classes`; `NONE` means no phase
fn phase_id(constant: &str) -> Option<String> {
    match constant {
        "NONE" => None,
        other => Some(constant_to_id(other)),
    }
}

fn constant_to_id(constant: &str) -> String {
    constant.to_lowercase().replace('_', "-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{ClassFileBuilder, write_class, write_jar};
    use crate::scanner::SourceFilter;
    use crate::scanner::class_file::{ACC_PUBLIC, ElementValue};
    use crate::types::MemberKind;
    use tempfile::TempDir;

    fn mojo(name: &str) -> Annotation {
        Annotation::new(MOJO).with("name", ElementValue::String(name.into()))
    }

    fn parameter() -> Annotation {
        Annotation::new(PARAMETER)
    }

    fn request(roots: Vec<PathBuf>) -> ScanRequest {
        ScanRequest {
            roots,
            dependencies: Vec::new(),
            filter: SourceFilter::all(),
        }
    }

    #[test]
    fn test_goal_attributes_are_decoded() {
        let class = ClassFileBuilder::new("org.example.CompileMojo")
            .annotate(
                mojo("compile")
                    .with(
                        "defaultPhase",
                        ElementValue::Enum {
                            type_name: "org.apache.maven.plugins.annotations.LifecyclePhase".into(),
                            constant: "PROCESS_CLASSES".into(),
                        },
                    )
                    .with(
                        "requiresDependencyResolution",
                        ElementValue::Enum {
                            type_name: "org.apache.maven.plugins.annotations.ResolutionScope".into(),
                            constant: "COMPILE_PLUS_RUNTIME".into(),
                        },
                    )
                    .with(
                        "instantiationStrategy",
                        ElementValue::Enum {
                            type_name: "org.apache.maven.plugins.annotations.InstantiationStrategy"
                                .into(),
                            constant: "KEEP_ALIVE".into(),
                        },
                    )
                    .with("aggregator", ElementValue::Boolean(true)),
            )
            .build();

        let parsed = ClassFile::parse(&class, Path::new("CompileMojo.class")).unwrap();
        let record = record_from_class(parsed, PathBuf::from("CompileMojo.class")).unwrap();
        let goal = record.goal().unwrap();
        assert_eq!(goal.name, "compile");
        assert_eq!(goal.phase.as_deref(), Some("process-classes"));
        assert_eq!(
            goal.dependency_resolution,
            Some(ResolutionScope::CompilePlusRuntime)
        );
        assert_eq!(goal.instantiation_strategy.as_deref(), Some("keep-alive"));
        assert_eq!(goal.aggregator, Some(true));
        assert_eq!(goal.requires_project, None);
        assert_eq!(record.ancestor, None);
    }

    #[test]
    fn test_parameters_components_and_setters() {
        let class = ClassFileBuilder::new("org.example.FooMojo")
            .extends("org.example.AbstractFooMojo")
            .annotate(mojo("foo"))
            .field(
                "values",
                "Ljava/util/Map;",
                Some("Ljava/util/Map<Ljava/lang/String;Ljava/lang/Integer;>;"),
                vec![parameter().with("property", ElementValue::String("foo.values".into()))],
            )
            .field(
                "archiver",
                "Lorg/example/Archiver;",
                None,
                vec![Annotation::new(COMPONENT).with("hint", ElementValue::String("zip".into()))],
            )
            .field("plain", "I", None, vec![])
            .method(
                ACC_PUBLIC,
                "setOutputName",
                "(Ljava/lang/String;)V",
                vec![parameter().with("required", ElementValue::Boolean(true))],
            )
            .method(ACC_PUBLIC, "setIgnored", "(Ljava/lang/String;)V", vec![])
            .build();

        let parsed = ClassFile::parse(&class, Path::new("FooMojo.class")).unwrap();
        let record = record_from_class(parsed, PathBuf::from("FooMojo.class")).unwrap();
        assert_eq!(record.ancestor.as_deref(), Some("org.example.AbstractFooMojo"));
        assert_eq!(record.members.len(), 3);

        let values = &record.members[0];
        assert_eq!(values.member, "values");
        assert_eq!(
            values.declared_type,
            "java.util.Map<java.lang.String,java.lang.Integer>"
        );

        let archiver = &record.members[1];
        match &archiver.kind {
            MemberKind::Dependency(dependency) => {
                assert_eq!(dependency.role, None);
                assert_eq!(dependency.hint.as_deref(), Some("zip"));
            }
            other => panic!("expected dependency, got {other:?}"),
        }

        let setter = &record.members[2];
        assert_eq!(setter.member, "outputName");
        assert_eq!(setter.declared_type, "java.lang.String");
        match &setter.kind {
            MemberKind::Parameter(parameter) => assert!(parameter.required),
            other => panic!("expected parameter, got {other:?}"),
        }
    }

    #[test]
    fn test_scan_keeps_candidates_and_ancestors() {
        let temp = TempDir::new().unwrap();
        let classes = temp.path().join("classes");
        write_class(
            &classes,
            "org.example.AbstractFooMojo",
            &ClassFileBuilder::new("org.example.AbstractFooMojo")
                .extends("org.example.Base")
                .build(),
        )
        .unwrap();
        write_class(
            &classes,
            "org.example.Base",
            &ClassFileBuilder::new("org.example.Base").build(),
        )
        .unwrap();
        write_class(
            &classes,
            "org.example.FooMojo",
            &ClassFileBuilder::new("org.example.FooMojo")
                .extends("org.example.AbstractFooMojo")
                .annotate(mojo("foo"))
                .build(),
        )
        .unwrap();
        write_class(
            &classes,
            "org.example.Unrelated",
            &ClassFileBuilder::new("org.example.Unrelated").build(),
        )
        .unwrap();
        std::fs::write(classes.join("org/example/module-info.class"), b"garbage").unwrap();

        let scanner = AnnotationScanner::new().unwrap();
        let records = scanner.scan(&request(vec![classes])).unwrap();
        let mut names: Vec<_> = records.keys().cloned().collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "org.example.AbstractFooMojo",
                "org.example.Base",
                "org.example.FooMojo"
            ]
        );
    }

    #[test]
    fn test_corrupt_class_names_the_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("Broken.class"), b"\xCA\xFE\xBA\xBE\x00").unwrap();

        let scanner = AnnotationScanner::new().unwrap();
        let err = scanner
            .scan(&request(vec![temp.path().to_path_buf()]))
            .unwrap_err();
        assert!(matches!(err, Error::ClassFormat { .. }));
        assert!(err.to_string().contains("Broken.class"));
    }

    #[test]
    fn test_overly_deep_array_field_is_a_format_error() {
        let descriptor = format!("{}I", "[".repeat(60_000));
        let bytes = ClassFileBuilder::new("org.example.DeepMojo")
            .annotate(mojo("deep"))
            .field("deep", &descriptor, None, vec![parameter()])
            .build();
        let source = PathBuf::from("classes/org/example/DeepMojo.class");
        let class = ClassFile::parse(&bytes, &source).unwrap();

        let err = record_from_class(class, source).unwrap_err();
        assert!(matches!(err, Error::ClassFormat { .. }));
        assert!(err.to_string().contains("DeepMojo.class"));
    }

    #[test]
    fn test_dependency_archives_contribute_members_only() {
        let temp = TempDir::new().unwrap();
        let jar = temp.path().join("base.jar");
        let base = ClassFileBuilder::new("org.lib.AbstractLibMojo")
            .annotate(mojo("lib-goal"))
            .field(
                "verbose",
                "Z",
                None,
                vec![parameter().with("property", ElementValue::String("verbose".into()))],
            )
            .build();
        write_jar(
            &jar,
            &[
                ("module-info.class", b"not a class".to_vec()),
                ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\n".to_vec()),
                ("org/lib/AbstractLibMojo.class", base),
            ],
        )
        .unwrap();

        let classes = temp.path().join("classes");
        write_class(
            &classes,
            "org.example.ChildMojo",
            &ClassFileBuilder::new("org.example.ChildMojo")
                .extends("org.lib.AbstractLibMojo")
                .annotate(mojo("child"))
                .build(),
        )
        .unwrap();

        let scanner = AnnotationScanner::new().unwrap();
        let mut scan = request(vec![classes]);
        scan.dependencies.push(jar);
        let records = scanner.scan(&scan).unwrap();

        let base = &records["org.lib.AbstractLibMojo"];
        assert!(base.goal().is_none());
        assert_eq!(base.members.len(), 1);
        assert!(records["org.example.ChildMojo"].goal().is_some());
    }

    #[test]
    fn test_missing_roots_are_empty() {
        let scanner = AnnotationScanner::new().unwrap();
        let records = scanner
            .scan(&request(vec![PathBuf::from("/definitely/not/here")]))
            .unwrap();
        assert!(records.is_empty());
    }
}
