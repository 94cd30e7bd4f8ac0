mod support;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// `cmc` running in `dir` with the knowledge base at `dir/output/kb.csv`.
fn cmc(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("cmc").unwrap();
    cmd.current_dir(dir)
        .env_remove("CMC_CONFIG")
        .env_remove("CMC_USERS_PATH")
        .env("CMC_KB_PATH", dir.join("output/kb.csv"));
    cmd
}

#[test]
fn init_creates_the_knowledge_base_with_its_header() {
    let dir = tempdir().unwrap();
    cmc(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Knowledge base ready"));

    let csv = fs::read_to_string(dir.path().join("output/kb.csv")).unwrap();
    assert_eq!(
        csv.trim_end(),
        "Modality,Phase,CQA,Test Methods,Justification,Regulatory Source,Control Action"
    );
}

#[test]
fn ingest_then_query_and_export() {
    let dir = tempdir().unwrap();
    let pdf = dir.path().join("guidance.pdf");
    fs::write(&pdf, support::pdf_with_text("Drug product purity limits")).unwrap();

    let output = cmc(dir.path())
        .args([
            "ingest",
            "guidance.pdf",
            "--modality",
            "Small Molecule",
            "--phase",
            "Phase 2",
            "--json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let summary: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["added"], 1);

    let output = cmc(dir.path())
        .args([
            "query",
            "--modality",
            "small molecule",
            "--phase",
            "PHASE 2",
            "--json",
            "--pdf",
            "report.pdf",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let body: Value = serde_json::from_slice(&output.stdout).unwrap();
    let rows = body["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["CQA"], "Purity");
    assert_eq!(rows[0]["Test Methods"], "HPLC, CE");
    assert!(fs::read(dir.path().join("report.pdf"))
        .unwrap()
        .starts_with(b"%PDF"));

    cmc(dir.path())
        .args(["options"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Modalities: Small Molecule"))
        .stdout(predicate::str::contains("Phases: Phase 2"));

    cmc(dir.path())
        .args(["export", "--out", "export.csv"])
        .assert()
        .success();
    let exported = fs::read_to_string(dir.path().join("export.csv")).unwrap();
    assert_eq!(exported.lines().count(), 2);
    assert!(exported.contains(
        "Small Molecule,Phase 2,Purity,\"HPLC, CE\",AI Extracted,PDF-LLM,Specification"
    ));
}

#[test]
fn query_without_matches_prints_the_sentinel() {
    let dir = tempdir().unwrap();
    cmc(dir.path())
        .args(["query", "--modality", "ADC", "--phase", "Phase 3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CQA | Test Methods"))
        .stdout(predicate::str::contains("No data found"));
}

#[test]
fn ingest_reports_empty_extractions() {
    let dir = tempdir().unwrap();
    let pdf = dir.path().join("toc.pdf");
    fs::write(&pdf, support::pdf_with_text("Table of contents")).unwrap();

    cmc(dir.path())
        .args(["ingest", "toc.pdf", "--modality", "mAb", "--phase", "Phase 1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No extractable data found in PDF."));
}

#[test]
fn ingest_fails_for_non_pdf_input() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("notes.txt"), "purity").unwrap();

    cmc(dir.path())
        .args(["ingest", "notes.txt", "--modality", "mAb", "--phase", "Phase 1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed PDF"));
}

#[test]
fn config_file_selects_the_knowledge_base() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("custom.toml"),
        "knowledge_base_path = \"data/custom.csv\"\n",
    )
    .unwrap();

    Command::cargo_bin("cmc").unwrap()
        .current_dir(dir.path())
        .env_remove("CMC_KB_PATH")
        .env_remove("CMC_CONFIG")
        .args(["--config", "custom.toml", "init"])
        .assert()
        .success();
    assert!(dir.path().join("data/custom.csv").exists());
}

#[test]
fn invalid_config_is_reported() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("cmc.toml"), "[extractor]\nwindow_chars = 0\n").unwrap();

    cmc(dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn hash_password_from_argument_and_stdin() {
    let dir = tempdir().unwrap();
    let output = cmc(dir.path())
        .args(["hash-password", "s3cret"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let encoded = String::from_utf8(output.stdout).unwrap();
    assert!(cmc_auth::verify_password("s3cret", encoded.trim()));

    let output = cmc(dir.path())
        .arg("hash-password")
        .write_stdin("from-stdin\n")
        .output()
        .unwrap();
    assert!(output.status.success());
    let encoded = String::from_utf8(output.stdout).unwrap();
    assert!(encoded.starts_with("sha256$"));
    assert!(cmc_auth::verify_password("from-stdin", encoded.trim()));
}

#[test]
fn serve_refuses_non_loopback_without_public() {
    let dir = tempdir().unwrap();
    cmc(dir.path())
        .args(["serve", "--bind", "0.0.0.0:0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Refusing to bind"));
}

#[test]
fn serve_requires_a_credentials_file() {
    let dir = tempdir().unwrap();
    cmc(dir.path())
        .args(["serve", "--bind", "127.0.0.1:0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load credentials"));
}
