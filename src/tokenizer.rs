// 🔤 Tokenizer - Classification terms of a transaction
// narration words → payee words → metadata values (system keys excluded)

use crate::ledger::{
    Transaction, AUTOMATIC_META, AUTOMATIC_RESIDUAL, AUTOMATIC_TOLERANCES, DUPLICATE_META,
    FILENAME_META, LINENO_META,
};
use std::borrow::Cow;

/// Metadata keys that never carry classification evidence
pub const EXCLUDED_META_KEYS: &[&str] = &[
    FILENAME_META,
    LINENO_META,
    AUTOMATIC_META,
    AUTOMATIC_RESIDUAL,
    AUTOMATIC_TOLERANCES,
    DUPLICATE_META,
];

pub type Term<'a> = Cow<'a, str>;

/// Terms of a transaction, in order. Repeated words are yielded repeatedly.
pub fn terms(txn: &Transaction) -> impl Iterator<Item = Term<'_>> {
    let narration = txn.narration.split_whitespace().map(Cow::Borrowed);

    let payee = txn
        .payee
        .as_deref()
        .into_iter()
        .flat_map(str::split_whitespace)
        .map(Cow::Borrowed);

    let meta = txn
        .meta
        .iter()
        .filter(|(key, _)| !EXCLUDED_META_KEYS.contains(&key.as_str()))
        .map(|(_, value)| Cow::Owned(value.to_string()));

    narration.chain(payee).chain(meta)
}

/// Length of a term as used for vote weighting (characters, not bytes)
pub fn term_len(term: &str) -> usize {
    term.chars().count()
}
