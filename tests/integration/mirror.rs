use predicates::prelude::*;
use std::fs;

use deps2git::mirror::mirror_dir_name;

use crate::common::TestProject;

#[test]
fn test_shared_mirror_resolves_commit_ids() {
    let project = TestProject::new();
    let libfoo = project.upstream_repo("libfoo", &[1233, 1234]);
    project.write_local_rules();
    project.write_deps("deps = {'src/third_party/libfoo': '/trunk/deps/third_party/libfoo@1234'}");

    project.command().args(["--extra-rules", "rules.toml", "--cache-dir", "mirrors"]).assert().success();

    let url = format!("{}libfoo.git", project.upstream_host());
    let expected = format!("'{url}@{}',", libfoo.commit_for(1234).unwrap());
    assert!(project.read_output().contains(&expected), "{}", project.read_output());
    assert!(project.path("mirrors").join(mirror_dir_name(&url)).join("HEAD").is_file());
}

#[test]
fn test_existing_mirror_is_fetched_not_recloned() {
    let project = TestProject::new();
    let mut libfoo = project.upstream_repo("libfoo", &[10]);
    project.write_local_rules();
    project.write_deps("deps = {'src/third_party/libfoo': '/trunk/deps/third_party/libfoo@10'}");
    project.command().args(["--extra-rules", "rules.toml", "--cache-dir", "mirrors"]).assert().success();

    let url = format!("{}libfoo.git", project.upstream_host());
    let marker = project.path("mirrors").join(mirror_dir_name(&url)).join("deps2git-marker");
    fs::write(&marker, "kept").unwrap();

    let sha = libfoo.commit(11).unwrap();
    project.write_deps("deps = {'src/third_party/libfoo': '/trunk/deps/third_party/libfoo@11'}");
    project.command().args(["--extra-rules", "rules.toml", "--cache-dir", "mirrors"]).assert().success();

    assert!(project.read_output().contains(&format!("'{url}@{sha}',")));
    assert!(marker.is_file());
}

#[test]
fn test_cache_dir_from_environment() {
    let project = TestProject::new();
    let libfoo = project.upstream_repo("libfoo", &[5]);
    project.write_local_rules();
    project.write_deps("deps = {'src/third_party/libfoo': '/trunk/deps/third_party/libfoo@5'}");

    project
        .command()
        .env("DEPS2GIT_CACHE_DIR", project.path("env-mirrors"))
        .args(["--extra-rules", "rules.toml", "--shallow"])
        .assert()
        .success();

    assert!(project.read_output().contains(libfoo.commit_for(5).unwrap()));
    assert!(project.path("env-mirrors").is_dir());
}

#[test]
fn test_per_checkout_mode() {
    let project = TestProject::new();
    let libfoo = project.upstream_repo("libfoo", &[20, 21]);
    project.write_local_rules();
    project.write_deps("deps = {'src/third_party/libfoo': '/trunk/deps/third_party/libfoo@20'}");

    project.command().args(["--extra-rules", "rules.toml", "--repos", "checkout"]).assert().success();

    assert!(project.read_output().contains(libfoo.commit_for(20).unwrap()));
    assert!(project.path("checkout/src/third_party/libfoo/REVISION").is_file());
}

#[test]
fn test_missing_revision_is_fatal() {
    let project = TestProject::new();
    project.upstream_repo("libfoo", &[1]);
    project.write_local_rules();
    project.write_deps("deps = {'src/third_party/libfoo': '/trunk/deps/third_party/libfoo@999'}");

    project
        .command()
        .args(["--extra-rules", "rules.toml", "--cache-dir", "mirrors"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No commit for revision 999"));

    assert!(!project.output_path().exists());
}

#[test]
fn test_precache_limits_parallelism() {
    let project = TestProject::new();
    let libfoo = project.upstream_repo("libfoo", &[1]);
    let libbar = project.upstream_repo("libbar", &[2]);
    project.write_local_rules();
    project.write_deps(
        "deps = {\n\
           'src/third_party/libfoo': '/trunk/deps/third_party/libfoo@1',\n\
           'src/third_party/libbar': '/trunk/deps/third_party/libbar@2',\n\
         }",
    );

    project
        .command()
        .args(["--extra-rules", "rules.toml", "--cache-dir", "mirrors", "--max-parallel", "1", "-v"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Pre-caching 2 mirrors (1 at a time)"));

    let output = project.read_output();
    assert!(output.contains(libfoo.commit_for(1).unwrap()));
    assert!(output.contains(libbar.commit_for(2).unwrap()));
}
