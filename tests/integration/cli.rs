use predicates::prelude::*;

use crate::common::TestProject;

const LEGACY_DEPS: &str = r#"
vars = {
  "ffmpeg_hash": "@abc123",
  "webkit_revision": "98765",
}

deps = {
  "src/third_party/libfoo": "/trunk/deps/third_party/libfoo@1234",
  "src/third_party/ffmpeg": "/trunk/deps/third_party/ffmpeg@500",
  "src/third_party/WebKit/Source":
    "http://svn.webkit.org/repository/webkit/trunk/Source@" + Var("webkit_revision"),
  "src/tools/gyp": "https://example.com/gyp.git@deadbeef",
  "src/chrome/tools/test/reference_build/chrome": "/trunk/deps/reference_builds/chrome@100",
  "src/third_party/removed": None,
}

deps_os = {
  "win": {
    "src/third_party/cygwin": "/trunk/deps/third_party/cygwin@66197",
  },
}

hooks = [
  {"pattern": ".", "action": ["python", "src/build/gyp_chromium"]},
]
"#;

#[test]
fn test_converts_with_placeholder_revisions() {
    let project = TestProject::new();
    project.write_deps(LEGACY_DEPS);

    project.command().assert().success();

    let output = project.read_output();
    assert!(output.starts_with("# DO NOT EDIT EXCEPT FOR LOCAL TESTING.\n"));
    assert!(output.contains("'git_url': 'http://git.chromium.org',"));
    assert!(output.contains("Var('git_url') + '/chromium/deps/libfoo.git@xxx-r1234',"));
    assert!(output.contains("Var('git_url') + '/chromium/deps/cygwin.git@xxx-r66197',"));
    assert!(output.contains("'src/third_party/removed':\n        None,"));
    assert!(output.contains("'src/build/gyp_chromium'"));
    assert!(!output.contains("reference_build"));
}

#[test]
fn test_override_and_special_pin_variables() {
    let project = TestProject::new();
    project.write_deps(LEGACY_DEPS);

    project.command().assert().success();

    let output = project.read_output();
    assert!(output.contains("'ffmpeg_hash': '@abc123',"));
    assert!(output.contains("Var('git_url') + '/chromium/third_party/ffmpeg.git' + Var('ffmpeg_hash'),"));
    assert!(output.contains("'webkit_rev': '@xxx-r98765',"));
    assert!(output.contains("'src/third_party/WebKit':\n        Var('webkit_url') + Var('webkit_rev'),"));
}

#[test]
fn test_git_urls_pass_through() {
    let project = TestProject::new();
    project.write_deps(LEGACY_DEPS);

    project.command().assert().success();

    assert!(project.read_output().contains("'https://example.com/gyp.git@deadbeef',"));
}

#[test]
fn test_custom_input_and_output_paths() {
    let project = TestProject::new();
    std::fs::write(project.path("legacy.DEPS"), "deps = {'src/foo': '/trunk/deps/third_party/libfoo@1'}").unwrap();

    project.command().args(["--deps", "legacy.DEPS", "--out", "git.DEPS"]).assert().success();

    assert!(project.path("git.DEPS").is_file());
    assert!(!project.output_path().exists());
}

#[test]
fn test_unmatched_url_writes_nothing() {
    let project = TestProject::new();
    project.write_deps("deps = {'src/a': '/trunk/deps/third_party/a@1', 'src/b': 'svn://unknown.example.org/b@2'}");

    project
        .command()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No translation rule matches 'svn://unknown.example.org/b'"));

    assert!(!project.output_path().exists());
}

#[test]
fn test_missing_override_variable_is_fatal() {
    let project = TestProject::new();
    project.write_deps("deps = {'src/third_party/ffmpeg': '/trunk/deps/third_party/ffmpeg@500'}");

    project
        .command()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("ffmpeg_hash"));

    assert!(!project.output_path().exists());
}

#[test]
fn test_syntax_error_reports_position() {
    let project = TestProject::new();
    project.write_deps("deps = {\n  'a': None\n  'c': 'd',\n}\n");

    project
        .command()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("line 3, column 3"));
}

#[test]
fn test_missing_input_file() {
    let project = TestProject::new();

    project.command().args(["--deps", "nope"]).assert().code(1);
    assert!(!project.output_path().exists());
}

#[test]
fn test_conflicting_options() {
    let project = TestProject::new();
    project.write_deps("deps = {}");

    project
        .command()
        .args(["--cache-dir", "mirrors", "--repos", "checkout"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Conflicting options"));

    project
        .command()
        .arg("--shallow")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--shallow requires --cache-dir"));
}

#[test]
fn test_unknown_type() {
    let project = TestProject::new();
    project.write_deps("deps = {}");

    project
        .command()
        .args(["--type", "internal"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown DEPS type 'internal'"));
}

#[test]
fn test_extra_rules_take_precedence() {
    let project = TestProject::new();
    std::fs::write(
        project.path("rules.toml"),
        "git_host = \"https://mirror.example.org/\"\n\n[[rules]]\nexact = \"/trunk/deps/third_party/libfoo\"\nrepo = \"libfoo.git\"\n",
    )
    .unwrap();
    project.write_deps(
        "deps = {'src/foo': '/trunk/deps/third_party/libfoo@7', 'src/bar': '/trunk/deps/third_party/libbar@8'}",
    );

    project.command().args(["--extra-rules", "rules.toml"]).assert().success();

    let output = project.read_output();
    assert!(output.contains("'https://mirror.example.org/libfoo.git@xxx-r7',"));
    assert!(output.contains("Var('git_url') + '/chromium/deps/libbar.git@xxx-r8',"));
}

#[test]
fn test_invalid_extra_rules() {
    let project = TestProject::new();
    project.write_deps("deps = {}");
    std::fs::write(project.path("rules.toml"), "[[rules]]\nexact = \"/a\"\nprefix = \"/b\"\nrepo = \"x.git\"\n").unwrap();

    project
        .command()
        .args(["--extra-rules", "rules.toml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid rule #1"));
}

#[test]
fn test_quiet_suppresses_info_logs() {
    let project = TestProject::new();
    project.write_deps("deps = {'src/foo': '/trunk/deps/third_party/libfoo@1'}");

    project.command().arg("-q").assert().success().stderr(predicate::str::is_empty());
}

#[test]
fn test_short_type_flag_selects_public_rules() {
    let project = TestProject::new();
    project.write_deps("deps = {'src/foo': '/trunk/deps/third_party/libfoo@3'}");

    project
        .command()
        .args(["-t", "public", "-d", "DEPS", "-o", "converted.DEPS"])
        .assert()
        .success()
        .stderr(predicate::str::contains("--type is deprecated"));

    let output = std::fs::read_to_string(project.path("converted.DEPS")).unwrap();
    assert!(output.contains("Var('git_url') + '/chromium/deps/libfoo.git@xxx-r3',"));
}
