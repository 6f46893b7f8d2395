// 🗂️ Review Session - Classify extracted entries one at a time
//
// Per entry: seed the cursor from the guesser → navigate → commit → train.
// Quitting stops the whole session; entries not yet reviewed pass through
// with their pending posting untouched.

use crate::accounts::AccountTree;
use crate::error::ReviewResult;
use crate::guesser::AccountGuess;
use crate::ledger::Transaction;
use crate::selector::AccountSelector;
use anyhow::Result;

// ============================================================================
// COMMANDS & STATES
// ============================================================================

/// Input accepted while navigating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    PrevSibling,
    NextSibling,
    Ascend,
    Descend,
    Commit,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    Seeded,
    Navigating,
    Committed,
    Aborted,
}

/// Result of reviewing one entry, checked by the session loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    Abort,
}

/// Position of the entry under review (1-based index)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub index: usize,
    pub total: usize,
}

// ============================================================================
// TERMINAL BOUNDARY
// ============================================================================

pub trait ReviewTerminal {
    /// Show the entry and the account tree with the cursor highlighted
    fn draw_selection(
        &mut self,
        txn: &Transaction,
        selector: &AccountSelector<'_>,
        progress: Progress,
    ) -> Result<()>;

    /// Show the resolved entry and its account
    fn draw_resolved(&mut self, txn: &Transaction, account: &str, progress: Progress) -> Result<()>;

    /// Block until the next command
    fn next_command(&mut self) -> Result<Command>;
}

// ============================================================================
// ENTRY REVIEW (per-entry state machine)
// ============================================================================

pub struct EntryReview<'s, 't> {
    selector: &'s mut AccountSelector<'t>,
    state: ReviewState,
    resolved: Option<String>,
}

impl<'s, 't> EntryReview<'s, 't> {
    /// Reset the cursor and move it onto `guess` when there is one
    pub fn seed(selector: &'s mut AccountSelector<'t>, guess: Option<&str>) -> ReviewResult<Self> {
        selector.reset();
        if let Some(account) = guess {
            selector.set_account(account)?;
        }
        Ok(EntryReview {
            selector,
            state: ReviewState::Seeded,
            resolved: None,
        })
    }

    pub fn state(&self) -> ReviewState {
        self.state
    }

    pub fn selector(&self) -> &AccountSelector<'t> {
        &*self.selector
    }

    /// Account chosen by an honored commit
    pub fn resolved(&self) -> Option<&str> {
        self.resolved.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, ReviewState::Committed | ReviewState::Aborted)
    }

    /// Apply one command. Commands after the review finished are ignored.
    pub fn apply(&mut self, command: Command) -> ReviewState {
        if self.is_finished() {
            return self.state;
        }
        self.state = ReviewState::Navigating;

        match command {
            Command::PrevSibling => self.selector.prev_sibling(),
            Command::NextSibling => self.selector.next_sibling(),
            Command::Ascend => self.selector.ascend(),
            Command::Descend => self.selector.descend(),
            Command::Commit => {
                // Only bookable accounts can be committed
                if self.selector.is_selectable() {
                    self.resolved = Some(self.selector.account());
                    self.state = ReviewState::Committed;
                }
            }
            Command::Quit => self.state = ReviewState::Aborted,
        }
        self.state
    }
}

// ============================================================================
// REVIEW SESSION
// ============================================================================

#[derive(Debug, Clone)]
pub struct ReviewReport {
    /// All entries in input order, reviewed ones resolved
    pub entries: Vec<Transaction>,

    /// Entries committed during the session
    pub committed: usize,

    /// True when the user quit before the last entry
    pub aborted: bool,
}

pub struct ReviewSession<'t> {
    tree: &'t AccountTree,
    guesser: AccountGuess,
    suggest: bool,
    pending_posting: usize,
    review_duplicates: bool,
}

impl<'t> ReviewSession<'t> {
    pub fn new(tree: &'t AccountTree, guesser: AccountGuess) -> Self {
        ReviewSession {
            tree,
            guesser,
            suggest: true,
            pending_posting: 1,
            review_duplicates: false,
        }
    }

    /// Builder pattern: seed the cursor from the guesser (default: on).
    /// The guesser keeps learning from commits either way.
    pub fn with_suggestions(mut self, suggest: bool) -> Self {
        self.suggest = suggest;
        self
    }

    /// Builder pattern: index of the posting to resolve (default: 1)
    pub fn with_pending_posting(mut self, index: usize) -> Self {
        self.pending_posting = index;
        self
    }

    /// Builder pattern: also review duplicate-flagged entries (default: off)
    pub fn with_review_duplicates(mut self, review: bool) -> Self {
        self.review_duplicates = review;
        self
    }

    pub fn guesser(&self) -> &AccountGuess {
        &self.guesser
    }

    pub fn into_guesser(self) -> AccountGuess {
        self.guesser
    }

    fn should_review(&self, entry: &Transaction) -> bool {
        self.review_duplicates || !entry.is_duplicate()
    }

    /// Review every entry in order until the user quits
    pub fn run<T: ReviewTerminal>(
        &mut self,
        entries: Vec<Transaction>,
        terminal: &mut T,
    ) -> Result<ReviewReport> {
        let tree = self.tree;
        let mut selector = AccountSelector::new(tree)?;

        let total = entries.iter().filter(|e| self.should_review(e)).count();
        let mut report = ReviewReport {
            entries: Vec::with_capacity(entries.len()),
            committed: 0,
            aborted: false,
        };
        let mut index = 0;

        for entry in entries {
            if report.aborted || !self.should_review(&entry) {
                report.entries.push(entry);
                continue;
            }

            index += 1;
            let progress = Progress { index, total };
            let (entry, outcome) = self.review_entry(entry, &mut selector, terminal, progress)?;
            report.entries.push(entry);

            match outcome {
                StepOutcome::Continue => report.committed += 1,
                StepOutcome::Abort => {
                    log::info!("Review aborted at entry {} of {}", index, total);
                    report.aborted = true;
                }
            }
        }

        log::info!(
            "Review finished: {} of {} entries committed",
            report.committed,
            total
        );
        Ok(report)
    }

    /// Review one entry. Returns the resolved copy on commit, the entry
    /// unchanged on abort.
    pub fn review_entry<T: ReviewTerminal>(
        &mut self,
        entry: Transaction,
        selector: &mut AccountSelector<'t>,
        terminal: &mut T,
        progress: Progress,
    ) -> Result<(Transaction, StepOutcome)> {
        entry.posting(self.pending_posting)?;

        let guess = self.guesser.guess(&entry);
        let seed = if self.suggest { guess.as_deref() } else { None };
        let mut review = EntryReview::seed(selector, seed)?;
        match seed {
            Some(account) => log::debug!(
                "account_guess_used: {}, {:?}",
                account,
                review.selector().cursor()
            ),
            None => log::debug!("account_guess_notused: {:?}", guess),
        }

        while !review.is_finished() {
            terminal.draw_selection(&entry, review.selector(), progress)?;
            let command = terminal.next_command()?;
            review.apply(command);
        }

        let Some(account) = review.resolved().map(str::to_string) else {
            return Ok((entry, StepOutcome::Abort));
        };

        log::debug!("account_selected: {}", account);
        let resolved = entry.with_posting_account(self.pending_posting, &account)?;
        self.guesser.train(&resolved, &account);
        terminal.draw_resolved(&resolved, &account, progress)?;

        Ok((resolved, StepOutcome::Continue))
    }
}

// ============================================================================
// TESTS
// ============================================================================
