// 🧾 Account Names - Colon-delimited account paths
// "Expenses:Toys:Computer" → root type "Expenses", parent "Expenses:Toys", leaf "Computer"

use serde::{Deserialize, Serialize};

/// Separator between account name segments
pub const SEP: char = ':';

// ============================================================================
// ACCOUNT TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AccountType {
    Assets,
    Liabilities,
    Equity,
    Income,
    Expenses,
}

impl AccountType {
    /// Root type of an account name, `None` for unknown roots
    pub fn of(name: &str) -> Option<Self> {
        match root(name) {
            "Assets" => Some(AccountType::Assets),
            "Liabilities" => Some(AccountType::Liabilities),
            "Equity" => Some(AccountType::Equity),
            "Income" => Some(AccountType::Income),
            "Expenses" => Some(AccountType::Expenses),
            _ => None,
        }
    }

    fn rank(&self) -> usize {
        *self as usize
    }
}

// ============================================================================
// NAME HELPERS
// ============================================================================

/// Split an account name into its segments
pub fn segments(name: &str) -> impl Iterator<Item = &str> {
    name.split(SEP)
}

/// First segment of an account name
pub fn root(name: &str) -> &str {
    name.split(SEP).next().unwrap_or("")
}

/// Everything before the last segment; `""` for a root, `None` for an empty name
pub fn parent(name: &str) -> Option<&str> {
    if name.is_empty() {
        return None;
    }
    Some(name.rfind(SEP).map(|pos| &name[..pos]).unwrap_or(""))
}

/// Last segment; `None` for an empty name
pub fn leaf(name: &str) -> Option<&str> {
    if name.is_empty() {
        return None;
    }
    name.rsplit(SEP).next()
}

/// Canonical ordering: balance sheet roots first, then income statement,
/// unknown roots last, ties broken by name
pub fn sort_key(name: &str) -> (usize, &str) {
    let rank = AccountType::of(name).map(|t| t.rank()).unwrap_or(usize::MAX);
    (rank, name)
}

// ============================================================================
// TESTS
// ============================================================================
