use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{CommandFactory, Parser};
use std::io;
use std::path::{Path, PathBuf};

use ledger_review::{
    extract, logging, print_extracted_entries, AccountGuess, AccountTree, CsvImporter,
    DeduplicationEngine, Ledger, LogBuffer, ReviewConfig, Transaction,
};

/// Extract transactions from a download and classify them interactively
#[derive(Parser, Debug)]
#[command(name = "ledger-review", version)]
struct Cli {
    /// Importer configuration file (JSON)
    #[arg(value_name = "CONFIG_FILENAME")]
    config: PathBuf,

    /// File to import
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Existing ledger (JSON) for de-duplication, account list and training
    #[arg(short = 'e', long = "existing", visible_alias = "previous", short_alias = 'f', value_name = "LEDGER_FILE")]
    existing: Option<PathBuf>,

    /// Write out the entries in descending order
    #[arg(short = 'r', long = "reverse", visible_alias = "descending")]
    reverse: bool,

    /// Seed the account cursor with suggestions
    #[arg(short = 'g', long = "guess", visible_alias = "suggestions", short_alias = 's')]
    guess: bool,

    /// Train the suggestions on the existing ledger first
    #[arg(short = 't', long = "train", visible_alias = "prepopulate", short_alias = 'p')]
    train: bool,

    /// Ignore extracted entries dated before this day (YYYY-MM-DD)
    #[arg(long = "min-date", value_name = "DATE")]
    min_date: Option<NaiveDate>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if !cli.file.exists() {
        Cli::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("File does not exist: '{}'", cli.file.display()),
            )
            .exit();
    }

    let config = ReviewConfig::from_file(&cli.config)?;

    // Log output is held back while the review UI owns the terminal
    let log_buffer = LogBuffer::new();
    logging::init(&config.log_level, Some(log_buffer.clone()))
        .context("Failed to initialize logging")?;

    let result = run(&cli, &config, &log_buffer);
    log_buffer.flush_to(&mut io::stderr())?;
    result
}

fn run(cli: &Cli, config: &ReviewConfig, log_buffer: &LogBuffer) -> Result<()> {
    let ledger = match &cli.existing {
        Some(path) => Some(Ledger::load(path)?),
        None => None,
    };

    let importer = CsvImporter::new(config.importer.clone());
    let engine = DeduplicationEngine::from(&config.dedup);
    let file = cli
        .file
        .canonicalize()
        .with_context(|| format!("Failed to resolve {:?}", cli.file))?;

    let extraction = extract(
        &importer,
        &file,
        ledger.as_ref().map(|l| l.entries.as_slice()),
        &engine,
        cli.min_date,
        !cli.reverse,
    );

    let mut account_names: Vec<String> = ledger
        .as_ref()
        .map(|l| l.accounts().into_iter().collect())
        .unwrap_or_default();
    account_names.extend(config.accounts.iter().cloned());
    let tree = AccountTree::from_names(&account_names);

    let mut guesser = AccountGuess::new();
    if cli.guess && cli.train {
        match &ledger {
            Some(ledger) => {
                guesser.train_from_entries(&ledger.entries, config.pending_posting)?;
            }
            None => log::warn!("--train given without an existing ledger; nothing to train on"),
        }
    }

    let entries = if extraction.entries.is_empty() {
        log::info!("No entries extracted from {:?}", file);
        extraction.entries
    } else {
        // Show what was logged so far before the UI takes over
        log_buffer.flush_to(&mut io::stderr())?;
        review(extraction.entries, &tree, guesser, cli.guess, config)?
    };

    let filename = file_name(&file);
    print_extracted_entries(&entries, &filename, &mut io::stdout().lock())?;
    Ok(())
}

#[cfg(feature = "tui")]
fn review(
    entries: Vec<Transaction>,
    tree: &AccountTree,
    guesser: AccountGuess,
    suggest: bool,
    config: &ReviewConfig,
) -> Result<Vec<Transaction>> {
    use ledger_review::{ui::TuiTerminal, ReviewError, ReviewSession};

    if tree.is_empty() {
        return Err(ReviewError::EmptyAccountTree)
            .context("Provide an existing ledger (-e) or list accounts in the config");
    }

    let mut session = ReviewSession::new(tree, guesser)
        .with_suggestions(suggest)
        .with_pending_posting(config.pending_posting)
        .with_review_duplicates(config.review_duplicates);

    // Terminal is restored when `terminal` drops, before the caller flushes logs
    let mut terminal = TuiTerminal::new()?;
    let report = session.run(entries, &mut terminal)?;
    Ok(report.entries)
}

#[cfg(not(feature = "tui"))]
fn review(
    _entries: Vec<Transaction>,
    _tree: &AccountTree,
    _guesser: AccountGuess,
    _suggest: bool,
    _config: &ReviewConfig,
) -> Result<Vec<Transaction>> {
    anyhow::bail!("Interactive review not available! Rebuild with: cargo build --features tui")
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
