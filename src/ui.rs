use crate::ledger::Transaction;
use crate::printer::format_entry;
use crate::review::{Command, Progress, ReviewTerminal};
use crate::selector::{AccountSelector, Level};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::io::{self, Stdout};
use std::thread;
use std::time::Duration;

/// Width of one account column
const COLUMN_WIDTH: u16 = 18;

/// How long a resolved entry stays on screen before the next one
const RESOLVED_PAUSE: Duration = Duration::from_millis(500);

const HELP: &str = "q: Quit    r: Save    w,a,s,d: Select account";

/// Map a key to a review command. Arrow keys mirror w/a/s/d.
pub fn command_for_key(code: KeyCode) -> Option<Command> {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Some(Command::Quit),
        KeyCode::Char('w') | KeyCode::Up => Some(Command::PrevSibling),
        KeyCode::Char('s') | KeyCode::Down => Some(Command::NextSibling),
        KeyCode::Char('d') | KeyCode::Right => Some(Command::Descend),
        KeyCode::Char('a') | KeyCode::Left => Some(Command::Ascend),
        KeyCode::Char('r') | KeyCode::Enter => Some(Command::Commit),
        _ => None,
    }
}

/// Full-screen review terminal. Raw mode and the alternate screen are
/// released when the value is dropped.
pub struct TuiTerminal {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TuiTerminal {
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.hide_cursor()?;
        Ok(TuiTerminal { terminal })
    }
}

impl Drop for TuiTerminal {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

impl ReviewTerminal for TuiTerminal {
    fn draw_selection(
        &mut self,
        txn: &Transaction,
        selector: &AccountSelector<'_>,
        progress: Progress,
    ) -> Result<()> {
        self.terminal.draw(|f| {
            let chunks = screen_layout(f.size());
            render_header(f, chunks[0]);
            render_transaction(f, chunks[1], txn);
            render_accounts(f, chunks[2], selector);
            render_status_bar(f, chunks[3], progress, &selector.account());
        })?;
        Ok(())
    }

    fn draw_resolved(&mut self, txn: &Transaction, account: &str, progress: Progress) -> Result<()> {
        self.terminal.draw(|f| {
            let chunks = screen_layout(f.size());
            render_header(f, chunks[0]);
            render_transaction(f, chunks[1], txn);
            render_resolved(f, chunks[2], account);
            render_status_bar(f, chunks[3], progress, account);
        })?;
        thread::sleep(RESOLVED_PAUSE);
        Ok(())
    }

    fn next_command(&mut self) -> Result<Command> {
        loop {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(command) = command_for_key(key.code) {
                    return Ok(command);
                }
            }
        }
    }
}

fn screen_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Header with key help
            Constraint::Length(10), // Transaction panel
            Constraint::Min(0),     // Account columns
            Constraint::Length(3),  // Status bar
        ])
        .split(area)
        .to_vec()
}

fn render_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "Entries Editor",
            Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        ),
        Span::raw("    "),
        Span::styled(HELP, Style::default().fg(Color::Gray)),
    ]))
    .block(Block::default().borders(Borders::ALL));

    f.render_widget(header, area);
}

fn render_transaction(f: &mut Frame, area: Rect, txn: &Transaction) {
    let lines: Vec<Line> = format_entry(txn)
        .lines()
        .map(|line| Line::from(line.to_string()))
        .collect();

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Transaction"),
    );
    f.render_widget(panel, area);
}

fn level_lines(level: &Level<'_>, active: bool) -> Vec<Line<'static>> {
    level
        .nodes
        .iter()
        .enumerate()
        .map(|(idx, node)| {
            let mut style = Style::default();
            if level.selected == Some(idx) {
                style = style.add_modifier(Modifier::BOLD);
                if active {
                    style = style.add_modifier(Modifier::REVERSED);
                }
            }
            // Bookable accounts are underlined
            if node.selectable {
                style = style.add_modifier(Modifier::UNDERLINED);
            }
            Line::from(Span::styled(
                format!("{:<width$}", node.name, width = COLUMN_WIDTH as usize - 2),
                style,
            ))
        })
        .collect()
}

fn render_accounts(f: &mut Frame, area: Rect, selector: &AccountSelector<'_>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            "Accounts",
            Style::default().add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let levels = selector.levels();
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            levels
                .iter()
                .map(|_| Constraint::Length(COLUMN_WIDTH))
                .chain(std::iter::once(Constraint::Min(0)))
                .collect::<Vec<_>>(),
        )
        .split(inner);

    let active_depth = selector.depth() - 1;
    for (depth, level) in levels.iter().enumerate() {
        let column = Paragraph::new(level_lines(level, depth == active_depth));
        f.render_widget(column, columns[depth]);
    }
}

fn render_resolved(f: &mut Frame, area: Rect, account: &str) {
    let panel = Paragraph::new(vec![
        Line::from(Span::styled(
            "Account:",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            account.to_string(),
            Style::default().fg(Color::Green),
        )),
    ])
    .block(Block::default().borders(Borders::ALL));

    f.render_widget(panel, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, progress: Progress, account: &str) {
    let status = Paragraph::new(Line::from(vec![
        Span::styled(
            format!("Entry {}/{}", progress.index, progress.total),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("  │  "),
        Span::styled(account.to_string(), Style::default().fg(Color::Yellow)),
    ]))
    .block(Block::default().borders(Borders::ALL));

    f.render_widget(status, area);
}
