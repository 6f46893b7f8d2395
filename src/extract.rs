// 📥 Extraction - Importers turn a source file into new ledger entries
//
// Importer failures never abort a run: they are logged and count as an
// empty extraction.

use crate::config::CsvImporterConfig;
use crate::deduplication::{mark_duplicates, SimilarityMatcher};
use crate::ledger::{Amount, Posting, Transaction, FILENAME_META, LINENO_META};
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use std::path::Path;

// ============================================================================
// IMPORTER TRAIT
// ============================================================================

pub trait Importer {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Parse a source file into transactions
    fn extract(&self, path: &Path) -> Result<Vec<Transaction>>;
}

// ============================================================================
// CSV IMPORTER
// ============================================================================

pub struct CsvImporter {
    config: CsvImporterConfig,
}

impl CsvImporter {
    pub fn new(config: CsvImporterConfig) -> Self {
        CsvImporter { config }
    }

    fn column(&self, headers: &csv::StringRecord, name: &str) -> Result<usize> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| anyhow!("Column '{}' not found in CSV header", name))
    }

    fn parse_amount(&self, raw: &str) -> Result<f64> {
        let cleaned: String = raw
            .trim()
            .chars()
            .filter(|c| !matches!(c, '$' | ',' | ' '))
            .collect();
        let number: f64 = cleaned
            .parse()
            .with_context(|| format!("Invalid amount: {:?}", raw))?;
        Ok(if self.config.negate_amounts { -number } else { number })
    }
}

impl Importer for CsvImporter {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn extract(&self, path: &Path) -> Result<Vec<Transaction>> {
        let delimiter = self.config.delimiter;
        if !delimiter.is_ascii() {
            return Err(anyhow!(
                "CSV delimiter must be a single ASCII character, got {:?}",
                delimiter
            ));
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter as u8)
            .from_path(path)
            .with_context(|| format!("Failed to open CSV file: {:?}", path))?;

        let headers = reader.headers()?.clone();
        let date_col = self.column(&headers, &self.config.date_column)?;
        let narration_col = self.column(&headers, &self.config.narration_column)?;
        let amount_col = self.column(&headers, &self.config.amount_column)?;
        let payee_col = match &self.config.payee_column {
            Some(name) => Some(self.column(&headers, name)?),
            None => None,
        };
        let meta_cols = self
            .config
            .metadata_columns
            .iter()
            .map(|name| Ok((name.to_lowercase(), self.column(&headers, name)?)))
            .collect::<Result<Vec<_>>>()?;

        let filename = path.display().to_string();
        let mut transactions = Vec::new();

        for (i, record) in reader.records().enumerate() {
            let record = record?;
            // Header is line 1
            let lineno = i + 2;
            let field = |col: usize| record.get(col).unwrap_or("").trim();

            let date = NaiveDate::parse_from_str(field(date_col), &self.config.date_format)
                .with_context(|| format!("Invalid date on line {}: {:?}", lineno, field(date_col)))?;
            let number = self
                .parse_amount(field(amount_col))
                .with_context(|| format!("Line {}", lineno))?;

            let mut txn = Transaction::new(date, field(narration_col))
                .with_meta(FILENAME_META, filename.as_str())
                .with_meta(LINENO_META, lineno as f64);

            if let Some(col) = payee_col {
                let payee = field(col);
                if !payee.is_empty() {
                    txn = txn.with_payee(payee);
                }
            }

            for (key, col) in &meta_cols {
                let value = field(*col);
                if !value.is_empty() {
                    txn = txn.with_meta(key.as_str(), value);
                }
            }

            transactions.push(
                txn.with_posting(Posting::new(
                    self.config.account.as_str(),
                    Some(Amount::new(number, self.config.currency.as_str())),
                ))
                .with_posting(Posting::new(self.config.pending_account.as_str(), None)),
            );
        }

        log::info!(
            "Importer {} extracted {} transactions from {:?}",
            self.name(),
            transactions.len(),
            path
        );
        Ok(transactions)
    }
}

// ============================================================================
// EXTRACTION PIPELINE
// ============================================================================

/// Extracted entries, with the subset flagged as likely duplicates
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub entries: Vec<Transaction>,
    pub duplicates: Vec<Transaction>,
}

/// Extract `path` with `importer`, drop entries before `min_date`, flag
/// duplicates against `existing`.
pub fn extract_from_file(
    importer: &dyn Importer,
    path: &Path,
    existing: Option<&[Transaction]>,
    matcher: &dyn SimilarityMatcher,
    min_date: Option<NaiveDate>,
) -> Result<Extraction> {
    let mut entries = importer.extract(path)?;
    if entries.is_empty() {
        return Ok(Extraction::default());
    }

    // Input is date-ordered: drop the leading run before the cutoff
    if let Some(min_date) = min_date {
        let skip = entries.iter().take_while(|e| e.date < min_date).count();
        entries.drain(..skip);
    }

    match existing {
        Some(existing) => {
            let marked = mark_duplicates(entries, existing, matcher);
            Ok(Extraction {
                entries: marked.entries,
                duplicates: marked.duplicates,
            })
        }
        None => Ok(Extraction {
            entries,
            duplicates: Vec::new(),
        }),
    }
}

/// Like `extract_from_file`, but an importer error is logged and yields an
/// empty extraction. Entries are reversed when `ascending` is false.
pub fn extract(
    importer: &dyn Importer,
    path: &Path,
    existing: Option<&[Transaction]>,
    matcher: &dyn SimilarityMatcher,
    min_date: Option<NaiveDate>,
    ascending: bool,
) -> Extraction {
    let mut extraction = match extract_from_file(importer, path, existing, matcher, min_date) {
        Ok(extraction) => extraction,
        Err(err) => {
            log::error!(
                "Importer {}.extract() raised an unexpected error: {}",
                importer.name(),
                err
            );
            log::error!("Traceback: {:?}", err);
            return Extraction::default();
        }
    };

    if !ascending {
        extraction.entries.reverse();
    }
    extraction
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deduplication::DeduplicationEngine;
    use crate::ledger::MetaValue;
    use std::io::Write;

    fn importer_config() -> CsvImporterConfig {
        CsvImporterConfig {
            name: "checking".to_string(),
            account: "Assets:Bank:Checking".to_string(),
            pending_account: "Expenses:Uncategorized".to_string(),
            currency: "USD".to_string(),
            date_column: "Date".to_string(),
            date_format: "%Y-%m-%d".to_string(),
            narration_column: "Description".to_string(),
            payee_column: Some("Payee".to_string()),
            amount_column: "Amount".to_string(),
            metadata_columns: vec!["Reference".to_string()],
            negate_amounts: false,
            delimiter: ',',
        }
    }

    fn csv_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const STATEMENT: &str = "\
Date,Description,Payee,Amount,Reference
2024-01-02,Latte,Starbucks,-4.50,R1
2024-01-05,Groceries weekly,,\"-1,023.10\",
2024-01-09,Salary,ACME,$3000.00,R3
";

    struct FailingImporter;

    impl Importer for FailingImporter {
        fn name(&self) -> &str {
            "failing"
        }

        fn extract(&self, _path: &Path) -> Result<Vec<Transaction>> {
            Err(anyhow!("statement is corrupt"))
        }
    }

    #[test]
    fn test_csv_importer() {
        let file = csv_file(STATEMENT);
        let importer = CsvImporter::new(importer_config());

        let txns = importer.extract(file.path()).unwrap();
        assert_eq!(txns.len(), 3);

        let first = &txns[0];
        assert_eq!(first.narration, "Latte");
        assert_eq!(first.payee.as_deref(), Some("Starbucks"));
        assert_eq!(first.meta.get("reference"), Some(&MetaValue::from("R1")));
        assert_eq!(first.meta.get(LINENO_META), Some(&MetaValue::Number(2.0)));
        assert_eq!(first.postings[0].units, Some(Amount::new(-4.5, "USD")));
        assert_eq!(first.postings[1].account, "Expenses:Uncategorized");
        assert_eq!(first.postings[1].units, None);

        assert_eq!(txns[1].payee, None);
        assert!(txns[1].meta.get("reference").is_none());
        assert_eq!(txns[1].postings[0].units, Some(Amount::new(-1023.10, "USD")));
        assert_eq!(txns[2].postings[0].units, Some(Amount::new(3000.0, "USD")));
    }

    #[test]
    fn test_csv_importer_missing_column() {
        let file = csv_file("When,What\n2024-01-01,x\n");
        let importer = CsvImporter::new(importer_config());
        assert!(importer.extract(file.path()).is_err());
    }

    #[test]
    fn test_csv_importer_rejects_non_ascii_delimiter() {
        let file = csv_file("Date\u{ff1b}Description\u{ff1b}Amount\n2024-01-02\u{ff1b}Latte\u{ff1b}-4.50\n");
        let mut config = importer_config();
        config.delimiter = '\u{ff1b}';
        let importer = CsvImporter::new(config);

        let err = importer.extract(file.path()).unwrap_err();
        assert!(err.to_string().contains("ASCII"));

        let engine = DeduplicationEngine::new();
        let extraction = extract(&importer, file.path(), None, &engine, None, true);
        assert!(extraction.entries.is_empty());
    }

    #[test]
    fn test_min_date_drops_leading_entries() {
        let file = csv_file(STATEMENT);
        let importer = CsvImporter::new(importer_config());
        let engine = DeduplicationEngine::new();

        let extraction = extract(
            &importer,
            file.path(),
            None,
            &engine,
            NaiveDate::from_ymd_opt(2024, 1, 5),
            true,
        );
        let narrations: Vec<&str> = extraction.entries.iter().map(|e| e.narration.as_str()).collect();
        assert_eq!(narrations, vec!["Groceries weekly", "Salary"]);
    }

    #[test]
    fn test_descending_order() {
        let file = csv_file(STATEMENT);
        let importer = CsvImporter::new(importer_config());
        let engine = DeduplicationEngine::new();

        let extraction = extract(&importer, file.path(), None, &engine, None, false);
        assert_eq!(extraction.entries[0].narration, "Salary");
        assert_eq!(extraction.entries[2].narration, "Latte");
    }

    #[test]
    fn test_duplicates_flagged_against_existing() {
        let file = csv_file(STATEMENT);
        let importer = CsvImporter::new(importer_config());
        let engine = DeduplicationEngine::new();

        let existing = vec![Transaction::new(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(), "coffee")
            .with_posting(Posting::new("Assets:Bank:Checking", Some(Amount::new(-4.5, "USD"))))
            .with_posting(Posting::new("Expenses:Coffee", None))];

        let extraction = extract(&importer, file.path(), Some(&existing), &engine, None, true);
        assert_eq!(extraction.entries.len(), 3);
        assert_eq!(extraction.duplicates.len(), 1);
        assert!(extraction.entries[0].is_duplicate());
        assert!(!extraction.entries[1].is_duplicate());
    }

    #[test]
    fn test_importer_error_yields_empty() {
        let file = csv_file(STATEMENT);
        let engine = DeduplicationEngine::new();

        let extraction = extract(&FailingImporter, file.path(), None, &engine, None, true);
        assert!(extraction.entries.is_empty());
        assert!(extraction.duplicates.is_empty());
    }
}
