//! Runs every enabled extraction backend and merges their goals into one
//! plugin descriptor.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::builder::DescriptorBuilder;
use crate::error::{Error, Result};
use crate::reconcile::Reconciler;
use crate::scanner::{AnnotationScanner, JavadocScanner, ScanRequest, SourceFilter};
use crate::script;
use crate::types::{DescriptorEntry, Dialect, MarkerRecord, PluginDescriptor, PluginInfo};

/// Everything one extraction run needs to know about the project
#[derive(Debug, Clone, Default)]
pub struct ExtractionRequest {
    pub plugin: PluginInfo,
    /// Compiled output of the plugin itself
    pub classes_directories: Vec<PathBuf>,
    /// Archives on the compile classpath, used to resolve ancestors
    pub dependencies: Vec<PathBuf>,
    pub source_roots: Vec<PathBuf>,
    pub script_roots: Vec<PathBuf>,
    pub filter: SourceFilter,
    /// Backends to run; `None` runs all of them
    pub extractors: Option<BTreeSet<Dialect>>,
    pub skip_error_no_descriptors_found: bool,
}

impl ExtractionRequest {
    pub fn new(plugin: PluginInfo) -> Self {
        Self {
            plugin,
            ..Default::default()
        }
    }

    pub fn is_enabled(&self, dialect: Dialect) -> bool {
        self.extractors
            .as_ref()
            .is_none_or(|enabled| enabled.contains(&dialect))
    }

    /// The scan a backend of the given dialect performs
    pub fn scan_request(&self, dialect: Dialect) -> ScanRequest {
        let (roots, dependencies) = match dialect {
            Dialect::Annotations => (
                self.classes_directories.clone(),
                self.dependencies.clone(),
            ),
            Dialect::Javadoc => (self.source_roots.clone(), Vec::new()),
            Dialect::Ant | Dialect::Beanshell => (self.script_roots.clone(), Vec::new()),
        };
        ScanRequest {
            roots,
            dependencies,
            filter: self.filter.clone(),
        }
    }
}

/// One source dialect's scanner
pub trait ExtractionBackend {
    fn dialect(&self) -> Dialect;

    /// Marker records for every unit found under the dialect's roots
    fn collect(&mut self, request: &ScanRequest) -> Result<Vec<MarkerRecord>>;
}

pub struct AnnotationBackend {
    scanner: AnnotationScanner,
}

impl AnnotationBackend {
    pub fn new() -> Result<Self> {
        Ok(Self {
            scanner: AnnotationScanner::new()?,
        })
    }
}

impl ExtractionBackend for AnnotationBackend {
    fn dialect(&self) -> Dialect {
        Dialect::Annotations
    }

    fn collect(&mut self, request: &ScanRequest) -> Result<Vec<MarkerRecord>> {
        Ok(self.scanner.scan(request)?.into_values().collect())
    }
}

pub struct JavadocBackend {
    scanner: JavadocScanner,
}

impl JavadocBackend {
    pub fn new() -> Result<Self> {
        Ok(Self {
            scanner: JavadocScanner::new()?,
        })
    }
}

impl ExtractionBackend for JavadocBackend {
    fn dialect(&self) -> Dialect {
        Dialect::Javadoc
    }

    fn collect(&mut self, request: &ScanRequest) -> Result<Vec<MarkerRecord>> {
        Ok(self.scanner.scan(request)?.into_values().collect())
    }
}

pub struct AntBackend;

impl ExtractionBackend for AntBackend {
    fn dialect(&self) -> Dialect {
        Dialect::Ant
    }

    fn collect(&mut self, request: &ScanRequest) -> Result<Vec<MarkerRecord>> {
        script::ant::scan(request)
    }
}

pub struct BeanshellBackend;

impl ExtractionBackend for BeanshellBackend {
    fn dialect(&self) -> Dialect {
        Dialect::Beanshell
    }

    fn collect(&mut self, request: &ScanRequest) -> Result<Vec<MarkerRecord>> {
        script::beanshell::scan(request)
    }
}

/// The closed set of backends an aggregator runs, one per dialect
pub enum Backend {
    Annotations(AnnotationBackend),
    Javadoc(JavadocBackend),
    Ant(AntBackend),
    Beanshell(BeanshellBackend),
    #[cfg(test)]
    Stub(Box<dyn ExtractionBackend>),
}

impl Backend {
    pub fn for_dialect(dialect: Dialect) -> Result<Self> {
        Ok(match dialect {
            Dialect::Annotations => Backend::Annotations(AnnotationBackend::new()?),
            Dialect::Javadoc => Backend::Javadoc(JavadocBackend::new()?),
            Dialect::Ant => Backend::Ant(AntBackend),
            Dialect::Beanshell => Backend::Beanshell(BeanshellBackend),
        })
    }
}

impl ExtractionBackend for Backend {
    fn dialect(&self) -> Dialect {
        match self {
            Backend::Annotations(backend) => backend.dialect(),
            Backend::Javadoc(backend) => backend.dialect(),
            Backend::Ant(backend) => backend.dialect(),
            Backend::Beanshell(backend) => backend.dialect(),
            #[cfg(test)]
            Backend::Stub(backend) => backend.dialect(),
        }
    }

    fn collect(&mut self, request: &ScanRequest) -> Result<Vec<MarkerRecord>> {
        match self {
            Backend::Annotations(backend) => backend.collect(request),
            Backend::Javadoc(backend) => backend.collect(request),
            Backend::Ant(backend) => backend.collect(request),
            Backend::Beanshell(backend) => backend.collect(request),
            #[cfg(test)]
            Backend::Stub(backend) => backend.collect(request),
        }
    }
}

/// Runs backends in group-key order and unions their goals
pub struct Aggregator {
    backends: Vec<Backend>,
}

impl Aggregator {
    /// Create an aggregator with one backend per known dialect
    pub fn new() -> Result<Self> {
        let backends = Dialect::ALL
            .into_iter()
            .map(Backend::for_dialect)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::with_backends(backends))
    }

    pub fn with_backends(mut backends: Vec<Backend>) -> Self {
        backends.sort_by_key(|backend| backend.dialect().group_key());
        Self { backends }
    }

    pub fn dialects(&self) -> Vec<Dialect> {
        self.backends.iter().map(|backend| backend.dialect()).collect()
    }

    pub fn run(&mut self, request: &ExtractionRequest) -> Result<PluginDescriptor> {
        let mut goals: Vec<DescriptorEntry> = Vec::new();
        let mut owners: HashMap<String, String> = HashMap::new();

        for backend in &mut self.backends {
            let dialect = backend.dialect();
            if !request.is_enabled(dialect) {
                debug!("Skipping disabled {} extractor", dialect);
                continue;
            }

            let entries = extract(backend, &request.scan_request(dialect))
                .map_err(|e| e.in_backend(dialect))?;
            info!(
                "Extractor {} found {} mojo descriptor{}",
                dialect,
                entries.len(),
                if entries.len() == 1 { "" } else { "s" }
            );
            if dialect.is_deprecated() && !entries.is_empty() {
                warn!(
                    "{} goal(s) of {} use the deprecated {} extractor",
                    entries.len(),
                    request.plugin.display_id(),
                    dialect
                );
            }

            for entry in entries {
                if let Some(first) = owners.get(&entry.goal) {
                    return Err(Error::DuplicateGoal {
                        goal: entry.goal.clone(),
                        first: first.clone(),
                        second: entry.implementation.clone(),
                    });
                }
                owners.insert(entry.goal.clone(), entry.implementation.clone());
                goals.push(entry);
            }
        }

        if goals.is_empty() {
            if !request.skip_error_no_descriptors_found {
                return Err(Error::NoGoalsFound {
                    plugin: request.plugin.display_id(),
                });
            }
            warn!(
                "No mojo definitions were found for plugin: {}",
                request.plugin.display_id()
            );
        }

        goals.sort_by(|a, b| {
            a.goal
                .to_lowercase()
                .cmp(&b.goal.to_lowercase())
                .then_with(|| a.goal.cmp(&b.goal))
        });

        let mut plugin = request.plugin.clone();
        plugin.goal_prefix = Some(plugin.effective_goal_prefix());
        Ok(PluginDescriptor { plugin, goals })
    }
}

fn extract(
    backend: &mut Backend,
    request: &ScanRequest,
) -> Result<Vec<DescriptorEntry>> {
    let records = backend.collect(request)?;
    let reconciler = Reconciler::new(records);
    debug!(
        "Reconciling {} {} unit(s)",
        reconciler.len(),
        backend.dialect()
    );
    let units = reconciler.reconcile_all()?;
    DescriptorBuilder::new(backend.dialect()).build_all(&units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{ClassFileBuilder, write_class};
    use crate::scanner::annotations::MOJO;
    use crate::scanner::class_file::{Annotation, ElementValue};
    use crate::types::{ClassMarker, GoalMarker};
    use tempfile::TempDir;

    struct StaticBackend {
        dialect: Dialect,
        goals: Vec<(&'static str, &'static str)>,
        fail: bool,
    }

    impl StaticBackend {
        fn boxed(dialect: Dialect, goals: Vec<(&'static str, &'static str)>) -> Backend {
            Backend::Stub(Box::new(Self {
                dialect,
                goals,
                fail: false,
            }))
        }
    }

    impl ExtractionBackend for StaticBackend {
        fn dialect(&self) -> Dialect {
            self.dialect
        }

        fn collect(&mut self, _request: &ScanRequest) -> Result<Vec<MarkerRecord>> {
            if self.fail {
                return Err(Error::Document("broken".into()));
            }
            Ok(self
                .goals
                .iter()
                .map(|(identity, goal)| {
                    let mut record = MarkerRecord::new(*identity, format!("{identity}.src"));
                    record.class_markers.push(ClassMarker::Goal(GoalMarker::named(*goal)));
                    record
                })
                .collect())
        }
    }

    fn request() -> ExtractionRequest {
        ExtractionRequest::new(PluginInfo::new("org.example", "demo-maven-plugin", "1.0"))
    }

    #[test]
    fn test_goals_are_merged_and_sorted() {
        let mut aggregator = Aggregator::with_backends(vec![
            StaticBackend::boxed(Dialect::Ant, vec![("build.xml#zeta", "zeta")]),
            StaticBackend::boxed(
                Dialect::Annotations,
                vec![("org.example.B", "beta"), ("org.example.A", "Alpha")],
            ),
        ]);
        assert_eq!(aggregator.dialects(), vec![Dialect::Annotations, Dialect::Ant]);

        let descriptor = aggregator.run(&request()).unwrap();
        let goals: Vec<_> = descriptor.goals.iter().map(|g| g.goal.as_str()).collect();
        assert_eq!(goals, vec!["Alpha", "beta", "zeta"]);
        assert_eq!(descriptor.goals[2].language, "ant-mojo");
        assert_eq!(descriptor.plugin.goal_prefix.as_deref(), Some("demo"));
    }

    #[test]
    fn test_collision_across_backends() {
        let mut aggregator = Aggregator::with_backends(vec![
            StaticBackend::boxed(Dialect::Annotations, vec![("org.example.Run", "run")]),
            StaticBackend::boxed(Dialect::Beanshell, vec![("run.bsh", "run")]),
        ]);
        let err = aggregator.run(&request()).unwrap_err();
        match err {
            Error::DuplicateGoal { goal, first, second } => {
                assert_eq!(goal, "run");
                assert_eq!(first, "org.example.Run");
                assert_eq!(second, "run.bsh");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_collision_within_backend() {
        let mut aggregator = Aggregator::with_backends(vec![StaticBackend::boxed(
            Dialect::Javadoc,
            vec![("org.example.A", "run"), ("org.example.B", "run")],
        )]);
        assert!(matches!(
            aggregator.run(&request()).unwrap_err(),
            Error::DuplicateGoal { .. }
        ));
    }

    #[test]
    fn test_no_goals_found() {
        let mut aggregator =
            Aggregator::with_backends(vec![StaticBackend::boxed(Dialect::Annotations, vec![])]);
        let err = aggregator.run(&request()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "No mojo definitions were found for plugin: org.example:demo-maven-plugin:1.0"
        );

        let mut skipping = request();
        skipping.skip_error_no_descriptors_found = true;
        assert!(aggregator.run(&skipping).unwrap().goals.is_empty());
    }

    #[test]
    fn test_disabled_extractors_are_skipped() {
        let mut aggregator = Aggregator::with_backends(vec![
            StaticBackend::boxed(Dialect::Annotations, vec![("org.example.A", "a")]),
            StaticBackend::boxed(Dialect::Ant, vec![("build.xml#a", "a")]),
        ]);
        let mut only_annotations = request();
        only_annotations.extractors = Some(BTreeSet::from([Dialect::Annotations]));
        let descriptor = aggregator.run(&only_annotations).unwrap();
        assert_eq!(descriptor.goals.len(), 1);
    }

    #[test]
    fn test_backend_failure_names_dialect() {
        let mut aggregator = Aggregator::with_backends(vec![Backend::Stub(Box::new(StaticBackend {
            dialect: Dialect::Beanshell,
            goals: vec![],
            fail: true,
        }))]);
        let err = aggregator.run(&request()).unwrap_err();
        assert!(matches!(err, Error::Backend { dialect: Dialect::Beanshell, .. }));
        assert!(err.to_string().starts_with("bsh extractor failed"));
    }

    #[test]
    fn test_annotation_backend_end_to_end() {
        let temp = TempDir::new().unwrap();
        let classes = temp.path().join("classes");
        write_class(
            &classes,
            "org.example.TouchMojo",
            &ClassFileBuilder::new("org.example.TouchMojo")
                .annotate(Annotation::new(MOJO).with("name", ElementValue::String("touch".into())))
                .build(),
        )
        .unwrap();

        let mut request = request();
        request.classes_directories = vec![classes];
        let mut aggregator = Aggregator::new().unwrap();
        assert_eq!(
            aggregator.dialects(),
            vec![Dialect::Annotations, Dialect::Javadoc, Dialect::Ant, Dialect::Beanshell]
        );
        let descriptor = aggregator.run(&request).unwrap();
        assert_eq!(descriptor.goals.len(), 1);
        assert_eq!(descriptor.goals[0].implementation, "org.example.TouchMojo");
    }
}
