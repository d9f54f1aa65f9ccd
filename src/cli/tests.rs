use super::*;
use clap::CommandFactory;
use std::time::Duration;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("deps2git").chain(args.iter().copied())).unwrap()
}

fn conflict_message(args: &[&str]) -> String {
    match parse(args).validate() {
        Err(DepsError::ConflictingOptions {
            message,
        }) => message,
        other => panic!("expected conflicting options, got {other:?}"),
    }
}

#[test]
fn test_command_is_well_formed() {
    Cli::command().debug_assert();
}

#[test]
fn test_short_flags() {
    let cli = parse(&["-d", "legacy", "-o", "out", "-t", "public", "-c", "mirrors", "-v"]);
    assert_eq!(cli.deps, "legacy");
    assert_eq!(cli.out, "out");
    assert_eq!(cli.deps_type.as_deref(), Some("public"));
    assert_eq!(cli.cache_dir.as_deref(), Some("mirrors"));
    assert!(cli.verbose);

    let cli = parse(&["-e", "rules.toml", "-r", "checkout", "-q"]);
    assert_eq!(cli.extra_rules.as_deref(), Some("rules.toml"));
    assert_eq!(cli.repos.as_deref(), Some("checkout"));
    assert!(cli.quiet);
}

#[test]
fn test_defaults() {
    let cli = parse(&[]);
    assert_eq!(cli.deps, "DEPS");
    assert_eq!(cli.out, ".DEPS.git");
    assert_eq!(cli.default_branch, "master");
    assert_eq!(cli.heartbeat_secs, 60);
    assert!(!cli.verify);
    assert!(cli.validate().is_ok());
}

#[test]
fn test_mutually_exclusive_options() {
    assert!(conflict_message(&["--extra-rules", "r.toml", "--type", "public"]).contains("--type"));
    assert!(conflict_message(&["--cache-dir", "/tmp/a", "--repos", "/tmp/b"]).contains("--repos"));
    assert!(conflict_message(&["--shallow"]).contains("--shallow requires --cache-dir"));
    assert!(conflict_message(&["-v", "-q"]).contains("--quiet"));
    assert!(conflict_message(&["--max-parallel", "0"]).contains("--max-parallel"));
    assert!(parse(&["--cache-dir", "/tmp/a", "--shallow"]).validate().is_ok());
}

#[test]
fn test_build_config() {
    assert_eq!(
        parse(&["--verbose"]).build_config(),
        CliConfig {
            log_level: "debug".to_string(),
            show_progress: true,
        }
    );
    assert_eq!(parse(&["-q"]).build_config().log_level, "error");
    assert!(!parse(&["-q"]).build_config().show_progress);
    assert!(!parse(&["--no-progress"]).build_config().show_progress);
    assert_eq!(parse(&[]).build_config().log_level, "info");
}

#[test]
fn test_mirror_mode_selection() {
    assert_eq!(parse(&[]).mirror_mode().unwrap(), MirrorMode::Disabled);
    assert_eq!(
        parse(&["--cache-dir", "/tmp/mirrors", "--shallow"]).mirror_mode().unwrap(),
        MirrorMode::SharedMirror {
            root: "/tmp/mirrors".into(),
            shallow: true,
        }
    );
    assert_eq!(
        parse(&["--repos", "/tmp/checkout"]).mirror_mode().unwrap(),
        MirrorMode::PerCheckout {
            root: "/tmp/checkout".into(),
        }
    );
}

#[test]
fn test_precache_options() {
    let options = parse(&["--max-parallel", "4", "--heartbeat-secs", "5", "--no-progress"]).precache_options();
    assert_eq!(options.max_parallel, Some(4));
    assert_eq!(options.heartbeat, Duration::from_secs(5));
    assert!(!options.show_progress);
}

#[test]
fn test_unknown_type_is_rejected() {
    let err = parse(&["--type", "internal"]).rule_engine().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DepsError>(),
        Some(DepsError::UnknownRuleSet { name }) if name == "internal"
    ));
    assert!(parse(&["--type", "public"]).rule_engine().is_ok());
}

#[test]
fn test_write_report() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("report.json");
    let failed: BTreeSet<String> = ["http://b/b.git", "http://a/a.git"].into_iter().map(String::from).collect();

    write_report(&path, Path::new("DEPS"), &failed).unwrap();

    let report: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(report["input"], "DEPS");
    assert_eq!(report["failed_urls"], serde_json::json!(["http://a/a.git", "http://b/b.git"]));
    assert!(chrono::DateTime::parse_from_rfc3339(report["generated_at"].as_str().unwrap()).is_ok());
}
