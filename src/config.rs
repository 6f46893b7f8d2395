// ⚙️ Configuration - Importer and review settings as data
// Loaded from a JSON file passed on the command line

use crate::deduplication::DeduplicationEngine;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ============================================================================
// CSV IMPORTER SETTINGS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvImporterConfig {
    /// Importer name used in logs (e.g., "bofa-checking")
    pub name: String,

    /// Account the statement belongs to (first posting)
    pub account: String,

    /// Placeholder account for the posting awaiting classification
    #[serde(default = "default_pending_account")]
    pub pending_account: String,

    pub currency: String,

    pub date_column: String,

    #[serde(default = "default_date_format")]
    pub date_format: String,

    pub narration_column: String,

    #[serde(default)]
    pub payee_column: Option<String>,

    pub amount_column: String,

    /// Extra columns copied into transaction metadata (lowercased key)
    #[serde(default)]
    pub metadata_columns: Vec<String>,

    /// Flip amount signs (statements that list debits as positive)
    #[serde(default)]
    pub negate_amounts: bool,

    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

fn default_pending_account() -> String {
    "Expenses:Uncategorized".to_string()
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

fn default_delimiter() -> char {
    ','
}

// ============================================================================
// DEDUPLICATION SETTINGS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    #[serde(default = "default_date_tolerance_days")]
    pub date_tolerance_days: i64,

    #[serde(default = "default_amount_tolerance")]
    pub amount_tolerance: f64,
}

fn default_date_tolerance_days() -> i64 {
    2
}

fn default_amount_tolerance() -> f64 {
    0.01
}

impl Default for DedupConfig {
    fn default() -> Self {
        DedupConfig {
            date_tolerance_days: default_date_tolerance_days(),
            amount_tolerance: default_amount_tolerance(),
        }
    }
}

impl From<&DedupConfig> for DeduplicationEngine {
    fn from(config: &DedupConfig) -> Self {
        DeduplicationEngine {
            date_tolerance_days: config.date_tolerance_days,
            amount_tolerance: config.amount_tolerance,
            ..DeduplicationEngine::new()
        }
    }
}

// ============================================================================
// REVIEW CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    pub importer: CsvImporterConfig,

    /// Index of the posting resolved during review (and read when training)
    #[serde(default = "default_pending_posting")]
    pub pending_posting: usize,

    /// Send duplicate-flagged entries through the review loop as well
    #[serde(default)]
    pub review_duplicates: bool,

    /// Accounts offered in the tree in addition to those found in the ledger
    #[serde(default)]
    pub accounts: Vec<String>,

    /// Default log filter, overridden by RUST_LOG
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub dedup: DedupConfig,
}

fn default_pending_posting() -> usize {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ReviewConfig {
    /// Load configuration from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse config JSON")
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"{
        "importer": {
            "name": "checking",
            "account": "Assets:Bank:Checking",
            "currency": "USD",
            "date_column": "Date",
            "narration_column": "Description",
            "amount_column": "Amount"
        }
    }"#;

    #[test]
    fn test_defaults() {
        let config = ReviewConfig::from_json(MINIMAL).unwrap();

        assert_eq!(config.pending_posting, 1);
        assert!(!config.review_duplicates);
        assert!(config.accounts.is_empty());
        assert_eq!(config.log_level, "info");
        assert_eq!(config.importer.pending_account, "Expenses:Uncategorized");
        assert_eq!(config.importer.date_format, "%Y-%m-%d");
        assert_eq!(config.importer.delimiter, ',');
        assert_eq!(config.dedup.date_tolerance_days, 2);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = ReviewConfig::from_file(file.path()).unwrap();
        assert_eq!(config.importer.name, "checking");
    }

    #[test]
    fn test_invalid_json() {
        assert!(ReviewConfig::from_json("{ not json").is_err());
        assert!(ReviewConfig::from_file("/nonexistent/config.json").is_err());
    }

    #[test]
    fn test_dedup_engine_from_config() {
        let config = DedupConfig {
            date_tolerance_days: 5,
            amount_tolerance: 0.1,
        };
        let engine = DeduplicationEngine::from(&config);
        assert_eq!(engine.date_tolerance_days, 5);
        assert_eq!(engine.amount_tolerance, 0.1);
        assert_eq!(engine.exact_match_confidence, 0.95);
    }
}
