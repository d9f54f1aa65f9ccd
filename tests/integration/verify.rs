use predicates::prelude::*;
use std::fs;

use crate::common::TestProject;

#[test]
fn test_unreachable_destination_exits_with_report() {
    let project = TestProject::new();
    project.upstream_repo("live", &[1]);
    project.write_local_rules();
    project.write_deps(
        "deps = {\n\
           'src/third_party/live': '/trunk/deps/third_party/live@1',\n\
           'src/third_party/dead': '/trunk/deps/third_party/dead@2',\n\
         }",
    );

    let dead = format!("{}dead.git", project.upstream_host());
    project
        .command()
        .args(["--extra-rules", "rules.toml", "--verify", "--json", "report.json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains(dead.as_str()))
        .stderr(predicate::str::contains("UsingNewGit"));

    assert!(!project.output_path().exists());

    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(project.path("report.json")).unwrap()).unwrap();
    assert_eq!(report["failed_urls"], serde_json::json!([dead]));
    assert!(report["input"].as_str().unwrap().ends_with("DEPS"));
    assert!(report["generated_at"].is_string());
}

#[test]
fn test_reachable_destinations_write_manifest() {
    let project = TestProject::new();
    project.upstream_repo("live", &[1]);
    project.write_local_rules();
    project.write_deps("deps = {'src/third_party/live': '/trunk/deps/third_party/live@1'}");

    project
        .command()
        .args(["--extra-rules", "rules.toml", "--verify", "--json", "report.json"])
        .assert()
        .success();

    assert!(project.output_path().is_file());
    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(project.path("report.json")).unwrap()).unwrap();
    assert_eq!(report["failed_urls"], serde_json::json!([]));
}
