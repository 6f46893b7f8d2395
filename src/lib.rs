// Ledger Review - Core Library
// Account suggestions, tree navigation and duplicate marking for imported transactions

pub mod account;        // Account name helpers
pub mod accounts;       // Account tree
pub mod config;         // JSON configuration
pub mod deduplication;  // Duplicate detection + marking
pub mod error;
pub mod extract;        // Importers and the extraction pipeline
pub mod guesser;        // Term-weighted account suggestions
pub mod ledger;         // Transactions, postings, ledger loading
pub mod logging;
pub mod printer;        // Ledger text output
pub mod review;         // Interactive review session
pub mod selector;       // Cursor navigation over the account tree
pub mod tokenizer;

// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use account::AccountType;
pub use accounts::{AccountNode, AccountTree};
pub use config::{CsvImporterConfig, DedupConfig, ReviewConfig};
pub use deduplication::{
    mark_duplicates, DeduplicationEngine, DuplicateMatch, MarkedEntries, MatchStrategy,
    SimilarityMatcher,
};
pub use error::{ReviewError, ReviewResult};
pub use extract::{extract, extract_from_file, CsvImporter, Extraction, Importer};
pub use guesser::{AccountGuess, GuessItem};
pub use ledger::{Amount, Flag, Ledger, Meta, MetaValue, Posting, Transaction, DUPLICATE_META};
pub use logging::LogBuffer;
pub use printer::{format_entry, print_extracted_entries};
pub use review::{
    Command, EntryReview, Progress, ReviewReport, ReviewSession, ReviewState, ReviewTerminal,
    StepOutcome,
};
pub use selector::AccountSelector;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
