use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const TOUCH_SCRIPT: &str = r#"/**
 * Writes a marker file.
 *
 * @goal touch
 * @phase process-resources
 */
execute()
{
}

/**
 * Output directory.
 *
 * @parameter expression="${outDir}" type="java.io.File" default-value="${project.build.directory}"
 * @required
 */
setOutputDirectory( file )
{
    outDir = file;
}
"#;

fn mojo_tools() -> Command {
    Command::cargo_bin("mojo-tools").unwrap()
}

fn init_project(root: &Path) {
    mojo_tools()
        .args(["init", "--cwd"])
        .arg(root)
        .args(["--group-id", "org.example", "--artifact-id", "touch-maven-plugin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config"));
}

#[test]
fn test_init_writes_config() {
    let temp = TempDir::new().unwrap();
    init_project(temp.path());

    let config = fs::read_to_string(temp.path().join(".mojo-tools.json")).unwrap();
    assert!(config.contains("\"artifact_id\": \"touch-maven-plugin\""));
    assert!(config.contains("src/main/scripts"));

    mojo_tools()
        .args(["init", "--cwd"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Config already exists"));
}

#[test]
fn test_descriptor_report_and_inspect() {
    let temp = TempDir::new().unwrap();
    init_project(temp.path());
    let scripts = temp.path().join("src/main/scripts");
    fs::create_dir_all(&scripts).unwrap();
    fs::write(scripts.join("touch.bsh"), TOUCH_SCRIPT).unwrap();

    mojo_tools()
        .args(["descriptor", "--cwd"])
        .arg(temp.path())
        .args(["--extractor", "bsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("touch:touch"));

    let output = temp.path().join("target/classes/META-INF/maven");
    let plugin_xml = output.join("plugin.xml");
    let xml = fs::read_to_string(&plugin_xml).unwrap();
    assert!(xml.contains("<goal>touch</goal>"));
    assert!(xml.contains("<language>bsh</language>"));
    assert!(
        output
            .join("org.example/touch-maven-plugin/plugin-help.xml")
            .exists()
    );

    mojo_tools()
        .arg("report")
        .arg(&plugin_xml)
        .args(["--javadoc-url", "https://docs.example/api/"])
        .assert()
        .success()
        .stdout(predicate::str::contains("touch:touch"))
        .stdout(predicate::str::contains(
            "outputDirectory: File (required)",
        ))
        .stdout(predicate::str::contains(
            "<https://docs.example/api/java/io/File.html>",
        ));

    mojo_tools()
        .arg("inspect")
        .arg(&plugin_xml)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"goal\": \"touch\""));
}

#[test]
fn test_descriptor_without_goals_fails() {
    let temp = TempDir::new().unwrap();
    init_project(temp.path());

    mojo_tools()
        .args(["descriptor", "--cwd"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No mojo definitions were found"));

    mojo_tools()
        .args(["descriptor", "--skip-error-no-descriptors-found", "--cwd"])
        .arg(temp.path())
        .assert()
        .success();
}

#[test]
fn test_unknown_extractor() {
    let temp = TempDir::new().unwrap();
    init_project(temp.path());

    mojo_tools()
        .args(["descriptor", "--extractor", "groovy", "--cwd"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No mojo extractor with 'groovy' id."));
}
