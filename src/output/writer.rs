//! On-disk artifacts of a run

use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::errors::ScraperError;
use crate::core::executor::{ExecutionRecord, RunReport};
use crate::core::planner::OperationKind;

pub const QUERIES_DIR: &str = "queries";
pub const MUTATIONS_DIR: &str = "mutations";
pub const SUBSCRIPTIONS_DIR: &str = "subscriptions";
pub const RESPONSES_DIR: &str = "query_responses";
pub const SCHEMA_FILE: &str = "schema.json";
pub const RESULTS_FILE: &str = "results.json";

/// Writes operations, responses and the run report under one directory:
///
/// ```text
/// <root>/schema.json
/// <root>/results.json
/// <root>/queries/<field>.graphql
/// <root>/query_responses/<field>.json
/// <root>/mutations/<field>.graphql
/// <root>/subscriptions/<field>.graphql
/// ```
pub struct ArtifactWriter {
    root: PathBuf,
}

impl ArtifactWriter {
    pub fn create(root: impl Into<PathBuf>) -> Result<Self, ScraperError> {
        let root = root.into();
        for dir in [QUERIES_DIR, MUTATIONS_DIR, SUBSCRIPTIONS_DIR, RESPONSES_DIR] {
            fs::create_dir_all(root.join(dir))?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn write_schema(&self, schema: &Value) -> Result<PathBuf, ScraperError> {
        self.write_json(self.root.join(SCHEMA_FILE), schema)
    }

    /// Save the operation text of `record`, plus its response when it was sent.
    ///
    /// The saved text has the variables actually used written inline, so
    /// each file can be replayed on its own.
    pub fn write_record(&self, record: &ExecutionRecord) -> Result<(), ScraperError> {
        let file_stem = sanitize_file_name(&record.field_name);
        let dir = match record.operation.kind {
            OperationKind::Query => QUERIES_DIR,
            OperationKind::Mutation => MUTATIONS_DIR,
            OperationKind::Subscription => SUBSCRIPTIONS_DIR,
        };

        let text = record.operation.inline_text(&record.variables_used);
        let path = self.root.join(dir).join(format!("{file_stem}.graphql"));
        fs::write(&path, text)?;
        debug!(path = %path.display(), "wrote operation");

        if !record.is_skipped() {
            let path = self.root.join(RESPONSES_DIR).join(format!("{file_stem}.json"));
            self.write_json(path, &record.raw_result)?;
        }

        Ok(())
    }

    pub fn write_report(&self, report: &RunReport) -> Result<PathBuf, ScraperError> {
        self.write_json(self.root.join(RESULTS_FILE), report)
    }

    pub fn write_all(&self, schema: &Value, report: &RunReport) -> Result<(), ScraperError> {
        self.write_schema(schema)?;
        for record in &report.records {
            self.write_record(record)?;
        }
        self.write_report(report)?;
        Ok(())
    }

    fn write_json<T: Serialize + ?Sized>(
        &self,
        path: PathBuf,
        value: &T,
    ) -> Result<PathBuf, ScraperError> {
        let content = serde_json::to_string_pretty(value)?;
        fs::write(&path, content)?;
        Ok(path)
    }
}

/// Keep only ASCII letters, digits, `-` and `_`
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect();

    match sanitized.is_empty() {
        true => "unnamed".to_string(),
        false => sanitized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("user"), "user");
        assert_eq!(sanitize_file_name("get_user-by-id"), "get_user-by-id");
        assert_eq!(sanitize_file_name("../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_file_name("naïve name"), "navename");
        assert_eq!(sanitize_file_name("///"), "unnamed");
    }

    #[test]
    fn test_create_makes_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("out");
        let writer = ArtifactWriter::create(&root).unwrap();

        assert_eq!(writer.root(), root.as_path());
        for sub in [QUERIES_DIR, MUTATIONS_DIR, SUBSCRIPTIONS_DIR, RESPONSES_DIR] {
            assert!(root.join(sub).is_dir(), "{sub} missing");
        }
    }

    #[test]
    fn test_write_schema_is_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::create(dir.path()).unwrap();

        let path = writer
            .write_schema(&serde_json::json!({ "queryType": { "name": "Query" } }))
            .unwrap();
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("\n  \"queryType\""));
    }
}
