use crate::error::{ReviewError, ReviewResult};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;

/// Metadata key marking an extracted entry as a likely duplicate
pub const DUPLICATE_META: &str = "__duplicate__";

/// Provenance metadata written by importers
pub const FILENAME_META: &str = "filename";
pub const LINENO_META: &str = "lineno";

/// Metadata keys set by automatic balancing
pub const AUTOMATIC_META: &str = "__automatic__";
pub const AUTOMATIC_RESIDUAL: &str = "__residual__";
pub const AUTOMATIC_TOLERANCES: &str = "__tolerances__";

pub type Meta = BTreeMap<String, MetaValue>;

// ============================================================================
// METADATA VALUES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Bool(true) => write!(f, "TRUE"),
            MetaValue::Bool(false) => write!(f, "FALSE"),
            MetaValue::Number(n) => write!(f, "{}", n),
            MetaValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::Text(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::Text(value)
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        MetaValue::Bool(value)
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        MetaValue::Number(value)
    }
}

// ============================================================================
// FLAG / AMOUNT / POSTING
// ============================================================================

/// Transaction status flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Flag {
    /// Cleared transaction (`*`)
    #[default]
    #[serde(rename = "*")]
    Okay,

    /// Needs attention (`!`)
    #[serde(rename = "!")]
    Warning,
}

impl Flag {
    pub fn as_char(&self) -> char {
        match self {
            Flag::Okay => '*',
            Flag::Warning => '!',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amount {
    pub number: f64,
    pub currency: String,
}

impl Amount {
    pub fn new(number: f64, currency: impl Into<String>) -> Self {
        Amount {
            number,
            currency: currency.into(),
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {}", self.number, self.currency)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub account: String,

    /// `None` for a posting whose amount is left to interpolation
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<Amount>,

    #[serde(default)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: Meta,
}

impl Posting {
    pub fn new(account: impl Into<String>, units: Option<Amount>) -> Self {
        Posting {
            account: account.into(),
            units,
            meta: Meta::new(),
        }
    }

    /// Copy of this posting booked to another account
    pub fn with_account(&self, account: impl Into<String>) -> Self {
        Posting {
            account: account.into(),
            ..self.clone()
        }
    }
}

// ============================================================================
// TRANSACTION
// ============================================================================

/// A ledger transaction. Values are never mutated in place once built:
/// the `with_*` methods hand back a modified copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,

    #[serde(default)]
    pub flag: Flag,

    /// Counterparty
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payee: Option<String>,

    pub narration: String,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,

    #[serde(default)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: Meta,

    #[serde(default)]
    pub postings: Vec<Posting>,
}

impl Transaction {
    pub fn new(date: NaiveDate, narration: impl Into<String>) -> Self {
        Transaction {
            date,
            flag: Flag::Okay,
            payee: None,
            narration: narration.into(),
            tags: Vec::new(),
            links: Vec::new(),
            meta: Meta::new(),
            postings: Vec::new(),
        }
    }

    /// Builder pattern: set payee
    pub fn with_payee(mut self, payee: impl Into<String>) -> Self {
        self.payee = Some(payee.into());
        self
    }

    /// Builder pattern: set flag
    pub fn with_flag(mut self, flag: Flag) -> Self {
        self.flag = flag;
        self
    }

    /// Builder pattern: append a posting
    pub fn with_posting(mut self, posting: Posting) -> Self {
        self.postings.push(posting);
        self
    }

    /// Builder pattern: add (or replace) a metadata value
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Copy without the given metadata key
    pub fn without_meta(&self, key: &str) -> Self {
        let mut copy = self.clone();
        copy.meta.remove(key);
        copy
    }

    /// Copy with the posting at `index` booked to `account`
    pub fn with_posting_account(&self, index: usize, account: &str) -> ReviewResult<Self> {
        let posting = self.posting(index)?;
        let mut copy = self.clone();
        copy.postings[index] = posting.with_account(account);
        Ok(copy)
    }

    pub fn posting(&self, index: usize) -> ReviewResult<&Posting> {
        self.postings.get(index).ok_or(ReviewError::MissingPosting {
            date: self.date,
            index,
        })
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self.meta.get(DUPLICATE_META), Some(MetaValue::Bool(true)))
    }
}

// ============================================================================
// LEDGER
// ============================================================================

/// Existing ledger entries, loaded from a JSON document `{ "entries": [...] }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default)]
    pub entries: Vec<Transaction>,
}

impl Ledger {
    pub fn new(entries: Vec<Transaction>) -> Self {
        Ledger { entries }
    }

    /// Load a ledger from JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read ledger file: {:?}", path.as_ref()))?;

        let ledger: Ledger =
            serde_json::from_str(&content).context("Failed to parse ledger JSON")?;

        log::info!(
            "Loaded {} entries from {:?}",
            ledger.entries.len(),
            path.as_ref()
        );
        Ok(ledger)
    }

    /// Every account referenced by a posting
    pub fn accounts(&self) -> BTreeSet<String> {
        self.entries
            .iter()
            .flat_map(|txn| txn.postings.iter())
            .map(|posting| posting.account.clone())
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn create_test_transaction() -> Transaction {
        Transaction::new(date("2024-12-25"), "Coffee downtown")
            .with_payee("Starbucks")
            .with_posting(Posting::new(
                "Assets:Bank:Checking",
                Some(Amount::new(-4.5, "USD")),
            ))
            .with_posting(Posting::new("Expenses:Uncategorized", None))
    }

    #[test]
    fn test_with_posting_account_copies() {
        let txn = create_test_transaction();
        let resolved = txn.with_posting_account(1, "Expenses:Coffee").unwrap();

        assert_eq!(resolved.postings[1].account, "Expenses:Coffee");
        assert_eq!(txn.postings[1].account, "Expenses:Uncategorized");
        assert_eq!(resolved.postings[0], txn.postings[0]);
    }

    #[test]
    fn test_with_posting_account_missing_index() {
        let txn = create_test_transaction();
        let err = txn.with_posting_account(5, "Expenses:Coffee").unwrap_err();
        assert!(matches!(err, ReviewError::MissingPosting { index: 5, .. }));
    }

    #[test]
    fn test_duplicate_flag() {
        let txn = create_test_transaction();
        assert!(!txn.is_duplicate());

        let marked = txn.clone().with_meta(DUPLICATE_META, true);
        assert!(marked.is_duplicate());
        assert!(!marked.without_meta(DUPLICATE_META).is_duplicate());
    }

    #[test]
    fn test_meta_value_display() {
        assert_eq!(MetaValue::Bool(true).to_string(), "TRUE");
        assert_eq!(MetaValue::Number(12.0).to_string(), "12");
        assert_eq!(MetaValue::from("REF-1").to_string(), "REF-1");
    }

    #[test]
    fn test_ledger_load_and_accounts() {
        let json = r#"{
            "entries": [
                {
                    "date": "2024-01-02",
                    "flag": "*",
                    "narration": "Coffee",
                    "meta": {"lineno": 4, "ref": "A1"},
                    "postings": [
                        {"account": "Assets:Bank", "units": {"number": -3.0, "currency": "USD"}},
                        {"account": "Expenses:Coffee"}
                    ]
                },
                {
                    "date": "2024-01-03",
                    "flag": "!",
                    "payee": "Landlord",
                    "narration": "Rent",
                    "postings": [
                        {"account": "Assets:Bank"},
                        {"account": "Expenses:Rent"}
                    ]
                }
            ]
        }"#;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let ledger = Ledger::load(file.path()).unwrap();
        assert_eq!(ledger.entries.len(), 2);
        assert_eq!(ledger.entries[0].meta.get("lineno"), Some(&MetaValue::Number(4.0)));
        assert_eq!(ledger.entries[1].flag, Flag::Warning);

        let accounts: Vec<String> = ledger.accounts().into_iter().collect();
        assert_eq!(accounts, vec!["Assets:Bank", "Expenses:Coffee", "Expenses:Rent"]);
        assert_eq!(ledger.entries.iter().filter(|t| t.flag == Flag::Okay).count(), 1);
    }

    #[test]
    fn test_ledger_load_missing_file() {
        assert!(Ledger::load("/nonexistent/ledger.json").is_err());
    }
}
