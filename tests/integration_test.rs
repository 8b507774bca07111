// tests/integration_test.rs
use std::fs;
use std::path::Path;
use std::process::Command;

use relsync::cli::orchestration::{fetch_updates, update_all, UpdateOptions};
use relsync::config::Config;
use relsync::domain::{BumpKind, ParentBump, PrereleaseIdentifier, SemanticVersion, TrainState};
use relsync::git::MockRepository;
use relsync::manifest::Chart;
use relsync::plan::{EntityVersionRecord, UpdatePlan};
use relsync::ui::{render_report, OutputFormat};
use relsync::RelsyncError;

fn v(s: &str) -> SemanticVersion {
    SemanticVersion::parse(s).unwrap()
}

fn scenario_a_entities() -> Vec<EntityVersionRecord> {
    vec![
        EntityVersionRecord::new("A", Some(v("1.2.0")), Some(v("1.3.0"))),
        EntityVersionRecord::new("B", Some(v("2.0.0")), Some(v("2.0.1"))),
    ]
}

#[test]
fn test_relsync_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_relsync"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("relsync"));
    assert!(stdout.contains("fetch"));
    assert!(stdout.contains("distribution"));
}

#[test]
fn test_relsync_format_comment() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("report.json");
    fs::write(
        &input,
        r#"{
  "parent": {"current": "0.5.0", "suggested": "0.6.0", "chart_bump": "minor"},
  "submodules": {
    "api": {
      "path": "services/api",
      "chart_name": "api",
      "current_tag": "v1.2.0",
      "latest_tag": "v1.3.0",
      "suggested_tag": "v1.3.0",
      "recent_tags": ["v1.3.0", "v1.2.0"],
      "current_tag_chart_version": "1.2.0",
      "suggested_tag_chart_version": "1.3.0",
      "chart_bump": "minor"
    }
  },
  "committed_changes": false
}"#,
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_relsync"))
        .args(["format", "-o", "comment", "-f"])
        .arg(&input)
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("| api | v1.2.0 | v1.3.0 | 1.2.0 | 1.3.0 | minor | v1.3.0, v1.2.0 |"));
    assert!(stdout.contains("**No changes in this branch**"));
}

#[test]
fn test_relsync_format_rejects_empty_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("empty.json");
    fs::write(&input, "  \n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_relsync"))
        .args(["format", "-f"])
        .arg(&input)
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    assert!(String::from_utf8(output.stderr).unwrap().contains("No input provided"));
}

#[test]
fn test_scenario_a_stable_release() {
    let plan = UpdatePlan::build(&scenario_a_entities(), &v("0.5.0"), None).unwrap();

    assert_eq!(plan.bump_for("A"), Some(BumpKind::Minor));
    assert_eq!(plan.bump_for("B"), Some(BumpKind::Patch));
    assert_eq!(plan.dominant_bump, BumpKind::Minor);
    assert_eq!(plan.parent_bump, ParentBump::Minor);
    assert_eq!(plan.parent_target.render(), "0.6.0");
    assert_eq!(plan.train, None);
}

#[test]
fn test_scenario_b_increments_train() {
    let rc = PrereleaseIdentifier::parse("rc").unwrap();
    let plan = UpdatePlan::build(&scenario_a_entities(), &v("0.6.0-rc"), Some(&rc)).unwrap();

    assert_eq!(plan.parent_target.render(), "0.6.0-rc.1");
    assert_eq!(plan.train, Some(TrainState::IncrementTrain));

    let next = UpdatePlan::build(&scenario_a_entities(), &plan.parent_target, Some(&rc)).unwrap();
    assert_eq!(next.parent_target.render(), "0.6.0-rc.2");
}

#[test]
fn test_scenario_c_new_entity_is_major() {
    let mut entities = scenario_a_entities();
    entities.push(EntityVersionRecord::new("C", None, Some(v("3.0.0"))));

    let plan = UpdatePlan::build(&entities, &v("0.5.0"), None).unwrap();
    assert_eq!(plan.bump_for("C"), Some(BumpKind::Major));
    assert_eq!(plan.dominant_bump, BumpKind::Major);
    assert_eq!(plan.parent_target.render(), "0.6.0");
}

#[test]
fn test_invalid_input_fails_whole_plan() {
    let entities = vec![
        ("A".to_string(), Some("1.2.0".to_string()), Some("1.3.0".to_string())),
        ("B".to_string(), Some("1.02.0".to_string()), Some("1.3.0".to_string())),
    ];
    let err = UpdatePlan::from_strings(&entities, Some("0.5.0"), Path::new("Chart.yaml"), None)
        .unwrap_err();
    assert!(matches!(err, RelsyncError::InvalidVersion { .. }));
}

/// Parent `platform` 0.6.0-rc depending on api 1.2.0; api has v1.3.0 available
fn workspace() -> (tempfile::TempDir, MockRepository) {
    let dir = tempfile::tempdir().unwrap();
    let chart = "deploy/chart/Chart.yaml";
    let write = |rel: &str, content: &str| {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    };
    write(
        chart,
        "name: platform\nversion: 0.6.0-rc\ndependencies:\n  - name: api\n    version: 1.2.0\n",
    );
    write(&format!("services/api/{}", chart), "name: api\nversion: 1.2.0\n");

    let mut repo = MockRepository::new();
    repo.add_submodule("api", "services/api");
    repo.add_tag("services/api", "v1.2.0", true);
    repo.add_tag("services/api", "v1.3.0", false);
    repo.add_file("services/api", "v1.3.0", chart, "name: api\nversion: 1.3.0\n");
    (dir, repo)
}

#[test]
fn test_fetch_report_renders_and_reads_back() {
    let (dir, repo) = workspace();
    let report = fetch_updates(&repo, dir.path(), &Config::default(), Some("rc"), &mut Vec::new())
        .unwrap();
    assert_eq!(report.parent.suggested, "0.6.0-rc.1");

    let json = render_report(&report, OutputFormat::Json).unwrap();
    let back: relsync::report::ReleaseReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back, report);

    let cli = render_report(&report, OutputFormat::Cli).unwrap();
    assert!(cli.contains("Parent chart: 0.6.0-rc → 0.6.0-rc.1 (chart bump: minor)"));
}

#[test]
fn test_update_all_writes_prerelease_into_chart() {
    let (dir, repo) = workspace();
    let config = Config {
        prerelease_identifier: Some("rc".to_string()),
        ..Config::default()
    };

    let report = update_all(&repo, dir.path(), &config, &UpdateOptions::default(), &mut Vec::new())
        .unwrap();
    assert_eq!(report.parent.suggested, "0.6.0-rc.1");

    let chart = Chart::load(&dir.path().join("deploy/chart/Chart.yaml")).unwrap();
    assert_eq!(chart.version().as_deref(), Some("0.6.0-rc.1"));
    assert_eq!(chart.dependency_versions()["api"], "1.3.0");
}
