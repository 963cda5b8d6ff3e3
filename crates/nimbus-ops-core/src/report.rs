//! Artifact writer
//!
//! Persists the projection/generator results as timestamped files. Artifacts
//! are write-once; the tool never reads them back. A failed write is fatal,
//! the artifact being the primary deliverable of the export mode.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::utils::now_stamp;

/// Writes run artifacts into one output directory, all sharing the run's
/// start timestamp
pub struct ArtifactWriter {
    out_dir: PathBuf,
    stamp: String,
}

impl ArtifactWriter {
    pub fn new(out_dir: &Path) -> Self {
        Self::with_stamp(out_dir, &now_stamp())
    }

    /// Fixed timestamp, for deterministic tests
    pub fn with_stamp(out_dir: &Path, stamp: &str) -> Self {
        Self {
            out_dir: out_dir.to_path_buf(),
            stamp: stamp.to_string(),
        }
    }

    pub fn stamp(&self) -> &str {
        &self.stamp
    }

    /// Write a pretty-printed JSON artifact named `<prefix>_<filter>_<stamp>.json`
    pub fn write_json<T: Serialize>(
        &self,
        prefix: &str,
        filter_keyword: &str,
        value: &T,
    ) -> Result<PathBuf> {
        let path = self
            .out_dir
            .join(format!("{}_{}_{}.json", prefix, filter_keyword, self.stamp));
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| anyhow::anyhow!("failed to serialize {}: {}", prefix, e))?;
        fs::write(&path, json)?;
        Ok(path)
    }

    /// Write the plain-text domain list, one domain per line
    pub fn write_domains(&self, filter_keyword: &str, domains: &[String]) -> Result<PathBuf> {
        let path = self
            .out_dir
            .join(format!("domains_{}_{}.txt", filter_keyword, self.stamp));
        let mut text = domains.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        fs::write(&path, text)?;
        Ok(path)
    }

    /// Write a generated caching configuration document
    pub fn write_cache_config(&self, document: &serde_json::Value) -> Result<PathBuf> {
        let path = self.out_dir.join(format!("cache_config_{}.json", self.stamp));
        fs::write(&path, serde_json::to_string_pretty(document).unwrap_or_default())?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_json_artifact_embeds_filter_and_stamp() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::with_stamp(dir.path(), "20260806_101500");

        let mut map = BTreeMap::new();
        map.insert("site1.example.com", "203.0.113.10");
        let path = writer.write_json("server_db", "wordpress", &map).unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "server_db_wordpress_20260806_101500.json"
        );
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("site1.example.com"));
    }

    #[test]
    fn test_domains_artifact_one_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::with_stamp(dir.path(), "20260806_101500");

        let domains = vec!["a.example.com".to_string(), "b.example.com".to_string()];
        let path = writer.write_domains("all", &domains).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "a.example.com\nb.example.com\n");
    }

    #[test]
    fn test_unwritable_directory_is_fatal() {
        let writer = ArtifactWriter::with_stamp(Path::new("/nonexistent/dir"), "20260806_101500");
        let err = writer.write_domains("all", &[]).unwrap_err();
        assert!(matches!(err, crate::error::OpsError::IO(_)));
    }
}
