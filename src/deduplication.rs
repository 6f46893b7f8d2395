// 🔍 Deduplication - Flag extracted entries already present in the ledger
// Two strategies: Exact Match (fingerprint), Fuzzy Match (date window + amount tolerance)

use crate::ledger::{Amount, Transaction, DUPLICATE_META};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

// ============================================================================
// MATCHER INTERFACE
// ============================================================================

/// Pairs up new entries with existing entries they probably duplicate.
/// Returns `(new_index, existing_index)` pairs.
pub trait SimilarityMatcher {
    fn find_similar(&self, new_entries: &[Transaction], existing: &[Transaction]) -> Vec<(usize, usize)>;
}

// ============================================================================
// MATCH STRATEGY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MatchStrategy {
    /// Exact match: same date, payee, narration and amounts
    ExactMatch,

    /// Fuzzy match: close dates, same account and currency, amounts within tolerance
    FuzzyMatch,
}

// ============================================================================
// DUPLICATE MATCH RESULT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateMatch {
    /// Index into the newly extracted entries
    pub new_index: usize,

    /// Index into the existing ledger entries
    pub existing_index: usize,

    /// Confidence score (0.0 - 1.0)
    pub confidence: f64,

    pub strategy: MatchStrategy,

    /// Human-readable reason
    pub reason: String,
}

// ============================================================================
// DEDUPLICATION ENGINE
// ============================================================================

#[derive(Debug, Clone)]
pub struct DeduplicationEngine {
    /// Confidence reported for exact matches (default: 0.95)
    pub exact_match_confidence: f64,

    /// Floor confidence for fuzzy matches (default: 0.70)
    pub fuzzy_match_threshold: f64,

    /// Date window for fuzzy matching in days (default: 2)
    pub date_tolerance_days: i64,

    /// Relative amount tolerance for fuzzy matching (default: 1%)
    pub amount_tolerance: f64,
}

impl DeduplicationEngine {
    /// Create engine with default thresholds
    pub fn new() -> Self {
        DeduplicationEngine {
            exact_match_confidence: 0.95,
            fuzzy_match_threshold: 0.70,
            date_tolerance_days: 2,
            amount_tolerance: 0.01,
        }
    }

    /// Best match in `existing` for each new entry. A new entry is matched
    /// at most once; the first existing entry that matches wins.
    pub fn find_duplicates(&self, new_entries: &[Transaction], existing: &[Transaction]) -> Vec<DuplicateMatch> {
        let existing_fingerprints: Vec<String> = existing.iter().map(fingerprint).collect();
        let mut matches = Vec::new();

        for (i, new_txn) in new_entries.iter().enumerate() {
            let new_fingerprint = fingerprint(new_txn);

            // Exact match first (highest confidence)
            if let Some(j) = existing_fingerprints.iter().position(|fp| *fp == new_fingerprint) {
                matches.push(DuplicateMatch {
                    new_index: i,
                    existing_index: j,
                    confidence: self.exact_match_confidence,
                    strategy: MatchStrategy::ExactMatch,
                    reason: format!("Exact match: {} | {}", new_txn.date, new_txn.narration),
                });
                continue;
            }

            if let Some(m) = existing
                .iter()
                .enumerate()
                .find_map(|(j, old_txn)| self.check_fuzzy_match(i, j, new_txn, old_txn))
            {
                matches.push(m);
            }
        }

        log::debug!(
            "Deduplication: {} of {} new entries matched",
            matches.len(),
            new_entries.len()
        );
        matches
    }

    /// Fuzzy Match
    /// Dates within the window, and some priced posting of each entry on the
    /// same account and currency with amounts within the relative tolerance
    fn check_fuzzy_match(
        &self,
        i: usize,
        j: usize,
        new_txn: &Transaction,
        old_txn: &Transaction,
    ) -> Option<DuplicateMatch> {
        let date_diff = (new_txn.date - old_txn.date).num_days().abs();
        if date_diff > self.date_tolerance_days {
            return None;
        }

        let (account, new_units, old_units) =
            priced_postings(new_txn).find_map(|(account, new_units)| {
                priced_postings(old_txn)
                    .find(|(old_account, old_units)| {
                        *old_account == account && self.amounts_close(new_units, old_units)
                    })
                    .map(|(_, old_units)| (account, new_units, old_units))
            })?;

        let amount_diff = (new_units.number - old_units.number).abs();
        let scale = new_units.number.abs().max(old_units.number.abs());

        // Confidence: date 40%, amount 60%
        let date_score = 1.0 - (date_diff as f64 / (self.date_tolerance_days as f64 + 1.0));
        let amount_score = if scale == 0.0 {
            1.0
        } else {
            1.0 - amount_diff / (self.amount_tolerance * scale + f64::EPSILON)
        };
        let confidence = (date_score * 0.4 + amount_score * 0.6).max(self.fuzzy_match_threshold);

        Some(DuplicateMatch {
            new_index: i,
            existing_index: j,
            confidence,
            strategy: MatchStrategy::FuzzyMatch,
            reason: format!(
                "Fuzzy match: {} ≈ {} | {} ≈ {} | {}",
                new_txn.date, old_txn.date, new_units, old_units, account
            ),
        })
    }

    /// Same currency and amounts within the relative tolerance
    fn amounts_close(&self, a: &Amount, b: &Amount) -> bool {
        if a.currency != b.currency {
            return false;
        }
        let scale = a.number.abs().max(b.number.abs());
        (a.number - b.number).abs() <= self.amount_tolerance * scale
    }
}

impl Default for DeduplicationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SimilarityMatcher for DeduplicationEngine {
    fn find_similar(&self, new_entries: &[Transaction], existing: &[Transaction]) -> Vec<(usize, usize)> {
        self.find_duplicates(new_entries, existing)
            .into_iter()
            .map(|m| (m.new_index, m.existing_index))
            .collect()
    }
}

/// Content hash over date, payee, narration and posting amounts
pub fn fingerprint(txn: &Transaction) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!(
        "{}|{}|{}",
        txn.date,
        txn.payee.as_deref().unwrap_or(""),
        txn.narration
    ));
    for posting in &txn.postings {
        if let Some(units) = &posting.units {
            hasher.update(format!("|{}", units));
        }
    }
    format!("{:x}", hasher.finalize())
}

/// Postings that carry units, as `(account, units)`
fn priced_postings(txn: &Transaction) -> impl Iterator<Item = (&str, &Amount)> {
    txn.postings
        .iter()
        .filter_map(|p| p.units.as_ref().map(|units| (p.account.as_str(), units)))
}

// ============================================================================
// MARKING
// ============================================================================

/// Extracted entries after duplicate marking
#[derive(Debug, Clone, Default)]
pub struct MarkedEntries {
    /// All entries, duplicates carrying the duplicate flag
    pub entries: Vec<Transaction>,

    /// The flagged subset, in the same relative order
    pub duplicates: Vec<Transaction>,
}

/// Replace every new entry that the matcher pairs with an existing entry by a
/// copy carrying the duplicate flag
pub fn mark_duplicates(
    new_entries: Vec<Transaction>,
    existing: &[Transaction],
    matcher: &dyn SimilarityMatcher,
) -> MarkedEntries {
    let duplicate_set: HashSet<usize> = matcher
        .find_similar(&new_entries, existing)
        .into_iter()
        .map(|(new_index, _)| new_index)
        .collect();

    let mut marked = MarkedEntries::default();
    for (index, entry) in new_entries.into_iter().enumerate() {
        let entry = if duplicate_set.contains(&index) {
            let flagged = entry.with_meta(DUPLICATE_META, true);
            marked.duplicates.push(flagged.clone());
            flagged
        } else {
            entry
        };
        marked.entries.push(entry);
    }

    if !marked.duplicates.is_empty() {
        log::info!(
            "Marked {} of {} extracted entries as duplicates",
            marked.duplicates.len(),
            marked.entries.len()
        );
    }
    marked
}

// ============================================================================
// TESTS
// ============================================================================
