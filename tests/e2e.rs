//! End-to-end tests that run the `wiki-autolink` binary against a project
//! written to a temporary workspace.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// Writes a small workspace with one project.
fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().join("projects").join("demo");

    write(
        &project.join("docs/getting-started.md"),
        "---\ntitle: Getting Started\n---\n# Getting Started\n\n\
         Kubernetes runs Pod objects on each Node.\n\n\
         ## Pod Lifecycle\n\n\
         Read the Deployment Guide next.\n",
    );
    write(
        &project.join("docs/guide/deployment.md"),
        "# Deployment Guide\n\nDeploy a Pod.\n",
    );
    write(
        &project.join("docs/drafts/wip.md"),
        "# Draft\n\nNot ready.\n",
    );
    write(
        &project.join("terms/pod.md"),
        "# Pod\n\nA Pod groups containers.\n\n## summary\nSmallest deployable unit.\n",
    );
    write(
        &project.join("terms/node.md"),
        "# Node\n\nA worker machine.\n",
    );
    write(
        &project.join("wiki.json"),
        r#"{ "exclude-pages": ["docs/drafts/**"] }"#,
    );

    fs::create_dir_all(dir.path().join("projects/empty")).unwrap();
    dir
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn run(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_wiki-autolink"))
        .arg("--root")
        .arg(root)
        .arg("--settings")
        .arg(root.join("settings/link-settings.json"))
        .args(args)
        .output()
        .expect("Failed to run wiki-autolink")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "wiki-autolink failed:\nstdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// =============================================================================
// Projects
// =============================================================================

#[test]
fn test_e2e_list_projects() {
    let dir = workspace();
    let out = stdout(&run(dir.path(), &["projects"]));
    assert_eq!(out, "demo\n");
}

#[test]
fn test_e2e_missing_project_fails() {
    let dir = workspace();
    let output = run(dir.path(), &["render", "nope", "doc", "intro"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Project not found"));
}

// =============================================================================
// Rendering
// =============================================================================

#[test]
fn test_e2e_render_links_terms_and_docs() {
    let dir = workspace();
    let html = stdout(&run(dir.path(), &["render", "demo", "doc", "getting-started"]));

    assert!(html.contains(r#"<span class="term-link" data-term="pod">Pod</span> objects"#));
    assert!(html.contains(r#"<span class="term-link" data-term="node">Node</span>"#));
    assert!(html.contains(
        r#"<span class="doc-link" data-doc="guide/deployment">Deployment Guide</span>"#
    ));
    // heading text stays plain and the h1 title line is not rendered
    assert!(html.contains(">Pod Lifecycle</h2>"));
    assert!(!html.contains("<h1"));
}

#[test]
fn test_e2e_excluded_pages_are_not_candidates() {
    let dir = workspace();
    let output = run(dir.path(), &["render", "demo", "doc", "drafts/wip"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Page not found"));
}

#[test]
fn test_e2e_render_json_for_term() {
    let dir = workspace();
    let out = stdout(&run(dir.path(), &["render", "demo", "term", "pod", "--json"]));
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();

    assert_eq!(value["title"], "Pod");
    assert_eq!(value["sections"]["summary"][0], "Smallest deployable unit.");
    // self-reference keeps the page's own title unlinked
    assert!(!value["html"].as_str().unwrap().contains("term-link"));
}

#[test]
fn test_e2e_toc() {
    let dir = workspace();
    let out = stdout(&run(dir.path(), &["toc", "demo", "doc", "getting-started"]));
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();

    assert_eq!(
        value,
        serde_json::json!([{ "id": "pod-lifecycle", "text": "Pod Lifecycle", "level": 2 }])
    );
}

// =============================================================================
// Rule management
// =============================================================================

#[test]
fn test_e2e_rules_list_defaults() {
    let dir = workspace();
    let out = stdout(&run(dir.path(), &["rules", "list"]));
    assert!(out.starts_with("linking: on\n"));
    assert!(out.contains("self-reference"));
    assert!(out.contains("kanji-context"));
}

#[test]
fn test_e2e_disable_self_reference() {
    let dir = workspace();
    stdout(&run(dir.path(), &["rules", "disable", "self-reference"]));
    assert!(dir.path().join("settings/link-settings.json").is_file());

    let html = stdout(&run(dir.path(), &["render", "demo", "term", "pod"]));
    assert!(html.contains(r#"<span class="term-link" data-term="pod">Pod</span> groups"#));
}

#[test]
fn test_e2e_custom_rule() {
    let dir = workspace();
    stdout(&run(
        dir.path(),
        &["rules", "add-custom", "no-node", "^node$", "--flags", "i"],
    ));

    let html = stdout(&run(dir.path(), &["render", "demo", "doc", "getting-started"]));
    assert!(!html.contains("data-term=\"node\""));
    assert!(html.contains("data-term=\"pod\""));

    stdout(&run(dir.path(), &["rules", "delete", "no-node"]));
    let html = stdout(&run(dir.path(), &["render", "demo", "doc", "getting-started"]));
    assert!(html.contains("data-term=\"node\""));
}

#[test]
fn test_e2e_unknown_rule_fails() {
    let dir = workspace();
    let output = run(dir.path(), &["rules", "enable", "missing"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown link rule"));
}

#[test]
fn test_e2e_linking_switch() {
    let dir = workspace();
    stdout(&run(dir.path(), &["rules", "linking", "false"]));

    let html = stdout(&run(dir.path(), &["render", "demo", "doc", "getting-started"]));
    assert!(!html.contains("term-link"));
    assert!(!html.contains("doc-link"));
    assert!(stdout(&run(dir.path(), &["rules", "list"])).starts_with("linking: off\n"));
}
