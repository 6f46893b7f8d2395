// 🔮 Account Guesser - Term-weighted account suggestions
// Learns which accounts each term has been booked to, then votes per transaction

use crate::error::ReviewResult;
use crate::ledger::{Flag, Transaction};
use crate::tokenizer::{term_len, terms};
use std::collections::{BTreeMap, HashMap};

// ============================================================================
// GUESS ITEM
// ============================================================================

/// Account tally of a single term
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuessItem {
    counts: BTreeMap<String, u32>,
}

impl GuessItem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more occurrence of `account` for this term
    pub fn record(&mut self, account: &str) {
        *self.counts.entry(account.to_string()).or_insert(0) += 1;
    }

    pub fn count(&self, account: &str) -> u32 {
        self.counts.get(account).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    /// Squared share of each account. A term split across many accounts
    /// contributes little; a term always booked to one account weighs 1.0.
    pub fn weights(&self) -> BTreeMap<&str, f64> {
        let total = self.total() as f64;
        self.counts
            .iter()
            .map(|(account, &count)| {
                let share = count as f64 / total;
                (account.as_str(), share * share)
            })
            .collect()
    }
}

// ============================================================================
// ACCOUNT GUESS
// ============================================================================

/// In-memory suggestion model, rebuilt from training data every run
#[derive(Debug, Clone, Default)]
pub struct AccountGuess {
    items: HashMap<String, GuessItem>,
}

impl AccountGuess {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `account` against every term of `txn`
    pub fn train(&mut self, txn: &Transaction, account: &str) {
        log::debug!(
            "train {} items: {:?}",
            account,
            terms(txn).collect::<Vec<_>>()
        );
        for term in terms(txn) {
            self.items
                .entry(term.into_owned())
                .or_default()
                .record(account);
        }
    }

    /// Train on every cleared transaction, using the account of the posting at
    /// `posting_index`. Returns the number of transactions used.
    pub fn train_from_entries<'a, I>(&mut self, entries: I, posting_index: usize) -> ReviewResult<usize>
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let mut trained = 0;
        for txn in entries.into_iter().filter(|txn| txn.flag == Flag::Okay) {
            let posting = txn.posting(posting_index).map_err(|err| {
                log::error!("Training lookup failed: {}", err);
                err
            })?;
            self.train(txn, &posting.account);
            trained += 1;
        }
        log::info!(
            "Trained account guesser on {} transactions ({} terms)",
            trained,
            self.term_count()
        );
        Ok(trained)
    }

    /// Accumulated votes per account, strongest first. Equal votes are
    /// ordered by account name.
    pub fn votes(&self, txn: &Transaction) -> Vec<(String, f64)> {
        let mut votes: BTreeMap<&str, f64> = BTreeMap::new();

        for term in terms(txn) {
            let Some(item) = self.items.get(&*term) else {
                continue;
            };
            let weights = item.weights();
            log::debug!("guess_item - {}: {:?}", term, weights);

            let len = term_len(&term) as f64;
            for (account, weight) in weights {
                *votes.entry(account).or_insert(0.0) += weight * len;
            }
        }

        let mut ranked: Vec<(String, f64)> = votes
            .into_iter()
            .map(|(account, vote)| (account.to_string(), vote))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }

    /// Best account for `txn`, or `None` when no term has any history
    pub fn guess(&self, txn: &Transaction) -> Option<String> {
        let votes = self.votes(txn);
        if !votes.is_empty() {
            log::debug!("guess votes: {:?}", votes);
        }
        votes.into_iter().next().map(|(account, _)| account)
    }

    pub fn item(&self, term: &str) -> Option<&GuessItem> {
        self.items.get(term)
    }

    /// Number of distinct terms learned
    pub fn term_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================
