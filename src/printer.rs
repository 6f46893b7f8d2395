// 🖨️ Printer - Render entries as ledger text
// Duplicates are emitted commented out so the user can still inspect them

use crate::ledger::{MetaValue, Transaction, DUPLICATE_META, FILENAME_META, LINENO_META};
use std::fmt::Write as _;
use std::io::{self, Write};

/// Header written before extracted output
pub const HEADER: &str = ";; -*- mode: beancount -*-";

/// Comment prefix for duplicate entries
pub const COMMENT_PREFIX: &str = "; ";

const INDENT: &str = "  ";

fn is_hidden_key(key: &str) -> bool {
    key == FILENAME_META || key == LINENO_META || key.starts_with("__")
}

/// Double-quoted ledger string; only `"` and `\` are escaped
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

fn format_meta_value(value: &MetaValue) -> String {
    match value {
        MetaValue::Text(s) => quote(s),
        other => other.to_string(),
    }
}

/// Text block for one transaction, newline terminated
pub fn format_entry(txn: &Transaction) -> String {
    let mut out = String::new();

    let _ = write!(out, "{} {}", txn.date, txn.flag.as_char());
    if let Some(payee) = &txn.payee {
        let _ = write!(out, " {}", quote(payee));
    }
    let _ = write!(out, " {}", quote(&txn.narration));
    for tag in &txn.tags {
        let _ = write!(out, " #{}", tag);
    }
    for link in &txn.links {
        let _ = write!(out, " ^{}", link);
    }
    out.push('\n');

    for (key, value) in txn.meta.iter().filter(|(key, _)| !is_hidden_key(key)) {
        let _ = writeln!(out, "{}{}: {}", INDENT, key, format_meta_value(value));
    }

    for posting in &txn.postings {
        match &posting.units {
            Some(units) => {
                let _ = writeln!(out, "{}{:<40} {}", INDENT, posting.account, units);
            }
            None => {
                let _ = writeln!(out, "{}{}", INDENT, posting.account);
            }
        }
        for (key, value) in posting.meta.iter().filter(|(key, _)| !is_hidden_key(key)) {
            let _ = writeln!(out, "{}{}{}: {}", INDENT, INDENT, key, format_meta_value(value));
        }
    }

    out
}

/// Prefix every line of `text` with `prefix`
fn indent_lines(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{}{}\n", prefix, line))
        .collect()
}

/// Text for an extracted entry; duplicates lose their flag and are commented out
pub fn format_extracted_entry(txn: &Transaction) -> String {
    if txn.meta.contains_key(DUPLICATE_META) {
        indent_lines(&format_entry(&txn.without_meta(DUPLICATE_META)), COMMENT_PREFIX)
    } else {
        format_entry(txn)
    }
}

/// Write the extracted output for one source file
pub fn print_extracted_entries<W: Write>(
    entries: &[Transaction],
    filename: &str,
    out: &mut W,
) -> io::Result<()> {
    writeln!(out, "{}", HEADER)?;
    writeln!(out)?;
    writeln!(out, "**** {}", filename)?;
    writeln!(out)?;

    for entry in entries {
        writeln!(out, "{}", format_extracted_entry(entry))?;
    }
    writeln!(out)?;
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Amount, Posting};
    use chrono::NaiveDate;

    fn create_test_transaction() -> Transaction {
        Transaction::new(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), "Latte")
            .with_payee("Starbucks")
            .with_meta("reference", "R1")
            .with_meta(LINENO_META, 2.0)
            .with_posting(Posting::new(
                "Assets:Bank:Checking",
                Some(Amount::new(-4.5, "USD")),
            ))
            .with_posting(Posting::new("Expenses:Coffee", None))
    }

    #[test]
    fn test_format_entry() {
        let text = format_entry(&create_test_transaction());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "2024-01-02 * \"Starbucks\" \"Latte\"");
        assert_eq!(lines[1], "  reference: \"R1\"");
        assert!(lines[2].starts_with("  Assets:Bank:Checking"));
        assert!(lines[2].ends_with("-4.50 USD"));
        assert_eq!(lines[3], "  Expenses:Coffee");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_quote_keeps_whitespace_literal() {
        let txn = Transaction::new(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), "CAF\u{a0}BAR\tX")
            .with_payee("O'Brien \"Bob\"")
            .with_meta("memo", "C:\\TEMP")
            .with_posting(Posting::new("Expenses:Coffee", None));
        let text = format_entry(&txn);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "2024-01-02 * \"O'Brien \\\"Bob\\\"\" \"CAF\u{a0}BAR\tX\""
        );
        assert_eq!(lines[1], "  memo: \"C:\\\\TEMP\"");
        assert!(!text.contains("\\u{"));
        assert!(!text.contains("\\t"));
    }

    #[test]
    fn test_duplicate_is_commented_out() {
        let dup = create_test_transaction().with_meta(DUPLICATE_META, true);
        let text = format_extracted_entry(&dup);

        assert!(text.lines().all(|line| line.starts_with("; ")));
        assert!(!text.contains(DUPLICATE_META));
        assert!(text.contains("; 2024-01-02 * \"Starbucks\" \"Latte\""));
    }

    #[test]
    fn test_print_extracted_entries() {
        let entries = vec![
            create_test_transaction(),
            create_test_transaction().with_meta(DUPLICATE_META, true),
        ];
        let mut out = Vec::new();
        print_extracted_entries(&entries, "statement.csv", &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with(HEADER));
        assert!(text.contains("**** statement.csv"));
        assert_eq!(text.matches("\"Latte\"").count(), 2);
        assert_eq!(text.matches("; 2024-01-02").count(), 1);
    }
}
