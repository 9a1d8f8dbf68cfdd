//! End-to-end extraction across every dialect

use mojo_tools_core::{
    Aggregator, Dialect, Error,
    codec::{self, DocumentFlavor},
    fixtures::ClassFileBuilder,
    scanner::annotations::{MOJO, PARAMETER},
    scanner::class_file::{Annotation, ElementValue},
};
use mojo_tools_suite::SampleProject;
use serde_json::json;

const HELLO_SOURCE: &str = r#"
package org.example;

/**
 * Says hello.
 *
 * @goal hello
 * @phase validate
 */
public class HelloMojo {
    /**
     * Who to greet.
     *
     * @parameter expression="${hello.name}" default-value="world"
     */
    private String name;
}
"#;

const PING_METADATA: &str = r#"<pluginMetadata>
  <mojos>
    <mojo>
      <goal>ping</goal>
      <description>Pings the server.</description>
      <parameters>
        <parameter>
          <name>host</name>
          <defaultValue>localhost</defaultValue>
        </parameter>
      </parameters>
    </mojo>
  </mojos>
</pluginMetadata>"#;

const TOUCH_SCRIPT: &str = r#"/**
 * Writes a marker file.
 *
 * @goal touch
 */
execute()
{
}

/**
 * @parameter default-value="touch.txt"
 */
String fileName = null;
"#;

fn mojo(name: &str) -> Annotation {
    Annotation::new(MOJO).with("name", ElementValue::String(name.into()))
}

fn config() -> serde_json::Value {
    json!({
        "plugin": {
            "group_id": "org.example",
            "artifact_id": "mixed-maven-plugin",
            "version": "1.0.0",
            "name": "Mixed Plugin"
        },
        "classes_directories": ["target/classes"],
        "dependencies": ["lib/api.jar"],
        "source_roots": ["src/main/java"],
        "script_roots": ["src/main/scripts"]
    })
}

/// Without the dependency archive, for projects that do not write one
fn bare_config() -> serde_json::Value {
    let mut config = config();
    if let Some(object) = config.as_object_mut() {
        object.remove("dependencies");
    }
    config
}

fn mixed_project() -> SampleProject {
    let project = SampleProject::new().unwrap();

    let base = ClassFileBuilder::new("org.example.api.AbstractBaseMojo")
        .annotate(mojo("ignored"))
        .field(
            "verbose",
            "Z",
            None,
            vec![
                Annotation::new(PARAMETER)
                    .with("property", ElementValue::String("verbose".into()))
                    .with("defaultValue", ElementValue::String("false".into())),
            ],
        )
        .build();
    project
        .write_jar("api.jar", &[("org.example.api.AbstractBaseMojo", base)])
        .unwrap();

    let compile = ClassFileBuilder::new("org.example.CompileMojo")
        .extends("org.example.api.AbstractBaseMojo")
        .annotate(mojo("compile"))
        .field(
            "source",
            "Ljava/lang/String;",
            None,
            vec![Annotation::new(PARAMETER).with("required", ElementValue::Boolean(true))],
        )
        .build();
    project.write_class("org.example.CompileMojo", &compile).unwrap();

    project
        .write("src/main/java/org/example/HelloMojo.java", HELLO_SOURCE)
        .unwrap();
    project
        .write("src/main/scripts/ping.mojos.xml", PING_METADATA)
        .unwrap();
    project
        .write("src/main/scripts/ping.build.xml", "<project default=\"ping\"/>")
        .unwrap();
    project
        .write("src/main/scripts/touch.bsh", TOUCH_SCRIPT)
        .unwrap();
    project
}

#[test]
fn test_every_dialect_contributes() {
    let project = mixed_project();
    let request = project.configure(config()).unwrap().to_request().unwrap();
    let descriptor = Aggregator::new().unwrap().run(&request).unwrap();

    let goals: Vec<_> = descriptor.goals.iter().map(|g| g.goal.as_str()).collect();
    assert_eq!(goals, vec!["compile", "hello", "ping", "touch"]);
    assert_eq!(descriptor.plugin.goal_prefix.as_deref(), Some("mixed"));

    let compile = descriptor.goal("compile").unwrap();
    assert_eq!(compile.language, "java");
    let source = compile.parameter("source").unwrap();
    assert!(source.required);
    assert_eq!(source.type_name, "java.lang.String");
    let verbose = compile.parameter("verbose").unwrap();
    assert_eq!(verbose.type_name, "boolean");
    assert_eq!(verbose.expression.as_deref(), Some("${verbose}"));
    assert_eq!(verbose.default_value.as_deref(), Some("false"));

    let hello = descriptor.goal("hello").unwrap();
    assert_eq!(hello.implementation, "org.example.HelloMojo");
    assert_eq!(hello.phase.as_deref(), Some("validate"));
    assert_eq!(
        hello.parameter("name").unwrap().property(),
        Some("hello.name")
    );

    let ping = descriptor.goal("ping").unwrap();
    assert_eq!(ping.language, "ant-mojo");
    assert_eq!(ping.implementation, "ping.build.xml");
    assert_eq!(
        ping.parameter("host").unwrap().default_value.as_deref(),
        Some("localhost")
    );

    let touch = descriptor.goal("touch").unwrap();
    assert_eq!(touch.language, "bsh");
    assert_eq!(touch.parameter("fileName").unwrap().type_name, "java.lang.String");

    assert!(descriptor.goal("ignored").is_none());
}

#[test]
fn test_descriptor_document_round_trip() {
    let project = mixed_project();
    let request = project.configure(config()).unwrap().to_request().unwrap();
    let descriptor = Aggregator::new().unwrap().run(&request).unwrap();

    let xml = codec::serialize(&descriptor, DocumentFlavor::Full);
    let parsed = codec::deserialize(&xml).unwrap();
    assert_eq!(parsed, descriptor);
    assert_eq!(codec::serialize(&parsed, DocumentFlavor::Full), xml);

    let help = codec::serialize(&descriptor, DocumentFlavor::Help);
    assert!(!help.contains("<requirements>"));
    assert!(xml.contains("<role>org.apache.maven.project.path.PathTranslator</role>"));
}

#[test]
fn test_selected_extractors_only() {
    let project = mixed_project();
    let mut config = config();
    config["extractors"] = json!(["ant", "bsh"]);
    let request = project.configure(config).unwrap().to_request().unwrap();
    let descriptor = Aggregator::new().unwrap().run(&request).unwrap();

    let goals: Vec<_> = descriptor.goals.iter().map(|g| g.goal.as_str()).collect();
    assert_eq!(goals, vec!["ping", "touch"]);
}

#[test]
fn test_goal_collision_between_dialects() {
    let project = mixed_project();
    project
        .write(
            "src/main/scripts/compile.bsh",
            "/**\n * @goal compile\n */\nexecute() { }\n",
        )
        .unwrap();
    let request = project.configure(config()).unwrap().to_request().unwrap();

    match Aggregator::new().unwrap().run(&request).unwrap_err() {
        Error::DuplicateGoal { goal, first, second } => {
            assert_eq!(goal, "compile");
            assert_eq!(first, "org.example.CompileMojo");
            assert_eq!(second, "compile.bsh");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_cyclic_hierarchy_is_attributed_to_backend() {
    let project = SampleProject::new().unwrap();
    project
        .write_class(
            "org.example.LoopMojo",
            &ClassFileBuilder::new("org.example.LoopMojo")
                .extends("org.example.Other")
                .annotate(mojo("loop"))
                .build(),
        )
        .unwrap();
    project
        .write_class(
            "org.example.Other",
            &ClassFileBuilder::new("org.example.Other")
                .extends("org.example.LoopMojo")
                .build(),
        )
        .unwrap();
    let request = project.configure(bare_config()).unwrap().to_request().unwrap();

    let err = Aggregator::new().unwrap().run(&request).unwrap_err();
    match &err {
        Error::Backend { dialect, source } => {
            assert_eq!(*dialect, Dialect::Annotations);
            assert!(matches!(**source, Error::CyclicInheritance { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("Cyclic inheritance detected"));
}

#[test]
fn test_empty_project_fails() {
    let project = SampleProject::new().unwrap();
    let request = project.configure(bare_config()).unwrap().to_request().unwrap();
    let err = Aggregator::new().unwrap().run(&request).unwrap_err();
    assert!(matches!(err, Error::NoGoalsFound { .. }));
}
