#![allow(dead_code)]

use cmc_auth::PasswordHash;
use cmc_protocol::Table;
use cmc_report::ReportRenderer;
use std::fs;
use std::path::{Path, PathBuf};

pub const ADMIN: (&str, &str) = ("qa_admin", "admin-pass");
pub const ANALYST: (&str, &str) = ("analyst", "analyst-pass");

/// A one-page PDF whose only body text is `text`.
pub fn pdf_with_text(text: &str) -> Vec<u8> {
    let table = Table::new(vec!["Notes".to_string()], vec![vec![text.to_string()]]);
    ReportRenderer::default()
        .render(&table, "Regulatory Guidance")
        .expect("render fixture pdf")
}

/// Credentials file with one admin and one plain user.
pub fn write_users(dir: &Path) -> PathBuf {
    let hash = |password: &str| PasswordHash::with_salt(password, vec![3; 16], 10).encode();
    let path = dir.join("users.yaml");
    fs::write(
        &path,
        format!(
            "users:\n  {}:\n    name: QA Admin\n    role: admin\n    password_hash: \"{}\"\n  {}:\n    name: Analyst\n    role: user\n    password_hash: \"{}\"\n",
            ADMIN.0,
            hash(ADMIN.1),
            ANALYST.0,
            hash(ANALYST.1)
        ),
    )
    .expect("write users.yaml");
    path
}
