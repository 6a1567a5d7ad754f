mod common;

use std::fs;

use assert_cmd::Command;
use common::{TestWorkspace, sample_workspace};
use hippo::report::{ChainRecommendation, MetricRow, QuantityRanking};
use predicates::str::contains;

fn hippo() -> Command {
    let mut cmd = Command::cargo_bin("hippo").expect("binary exists");
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn run_writes_all_three_reports() {
    let workspace = sample_workspace();
    let output = workspace.output_dir();

    hippo()
        .arg("--input")
        .arg(workspace.path())
        .arg("run")
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let metrics: Vec<MetricRow> =
        serde_json::from_slice(&fs::read(output.join("metrics.json")).expect("metrics"))
            .expect("parse metrics");
    assert_eq!(metrics.len(), 2);
    assert_eq!(metrics[0].npi, "p1");
    assert_eq!(metrics[0].fills, 2);
    assert_eq!(metrics[0].total_price, 30.0);
    assert_eq!(metrics[0].avg_price, 5.0);
    assert_eq!(metrics[0].reverted, 1);
    assert_eq!(metrics[1].reverted, 0);

    let chains: Vec<ChainRecommendation> =
        serde_json::from_slice(&fs::read(output.join("top_chains.json")).expect("chains"))
            .expect("parse chains");
    assert_eq!(chains.len(), 1);
    let names = chains[0]
        .chain
        .iter()
        .map(|c| c.name.as_deref())
        .collect::<Vec<_>>();
    assert_eq!(names, vec![Some("A"), Some("B")]);

    let raw = fs::read_to_string(output.join("most_prescribed_quantities.json"))
        .expect("quantities");
    assert!(raw.starts_with("[\n    {\n        \"ndc\""));
    let quantities: Vec<QuantityRanking> = serde_json::from_str(&raw).expect("parse quantities");
    assert_eq!(quantities[0].most_prescribed_quantity, vec![1, 2, 4]);
}

#[test]
fn metrics_command_only_writes_metrics() {
    let workspace = sample_workspace();
    let output = workspace.output_dir();

    hippo()
        .args(["metrics", "-i"])
        .arg(workspace.path())
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    assert!(output.join("metrics.json").exists());
    assert!(!output.join("top_chains.json").exists());
    assert!(!output.join("most_prescribed_quantities.json").exists());
}

#[test]
fn validate_prints_summary_table() {
    let workspace = sample_workspace();
    hippo()
        .arg("validate")
        .arg("--input")
        .arg(workspace.path())
        .assert()
        .success()
        .stdout(contains("layout"))
        .stdout(contains("claims"))
        .stdout(contains("quarantined"));
}

#[test]
fn validate_fails_when_a_dataset_is_empty() {
    let workspace = TestWorkspace::new();
    workspace.write(
        hippo::schema::Layout::Pharmacies,
        "pharmacies.csv",
        common::PHARMACIES_CSV,
    );
    hippo()
        .arg("validate")
        .arg("--input")
        .arg(workspace.path())
        .assert()
        .failure()
        .stderr(contains("no valid rows for claims, reverts"));
}

#[test]
fn empty_reports_are_not_written() {
    let workspace = TestWorkspace::new();
    let output = workspace.output_dir();
    hippo()
        .arg("run")
        .arg("--input")
        .arg(workspace.path())
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stderr(contains("metrics.json not written"));
    assert!(!output.join("metrics.json").exists());
}

#[test]
fn schema_lists_every_layout() {
    hippo()
        .arg("schema")
        .assert()
        .success()
        .stdout(contains("pharmacies"))
        .stdout(contains("claim_id"))
        .stdout(contains("> 0"));
}

#[test]
fn schema_yaml_marks_positive_columns() {
    hippo()
        .args(["schema", "--yaml"])
        .assert()
        .success()
        .stdout(contains("name: quantity"))
        .stdout(contains("positive: true"));
}
