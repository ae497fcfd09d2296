// 🏗️ Sales Log Parser
// Raw file → decoded lines → typed, validated transactions

use crate::error::{PipelineError, RecordIssue};
use crate::transaction::Transaction;
use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ============================================================================
// TEXT ENCODINGS
// ============================================================================

/// Encodings tried by [`read_sales_data`], in order
pub const ENCODING_ORDER: [TextEncoding; 3] = [
    TextEncoding::Utf8,
    TextEncoding::Latin1,
    TextEncoding::Windows1252,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextEncoding {
    Utf8,
    Latin1,
    Windows1252,
}

impl TextEncoding {
    pub fn name(&self) -> &str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Latin1 => "latin-1",
            TextEncoding::Windows1252 => "cp1252",
        }
    }

    /// Decode bytes, or None if they are not valid in this encoding
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8 => {
                let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
                std::str::from_utf8(bytes).ok().map(str::to_string)
            }
            // Every byte maps to the code point of the same value
            TextEncoding::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
            TextEncoding::Windows1252 => bytes.iter().map(|&b| cp1252_char(b)).collect(),
        }
    }
}

/// Windows-1252 differs from Latin-1 only in 0x80..=0x9F; five of those are unassigned.
fn cp1252_char(byte: u8) -> Option<char> {
    let c = match byte {
        0x80 => '\u{20AC}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017D}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        0x81 | 0x8D | 0x8F | 0x90 | 0x9D => return None,
        _ => byte as char,
    };
    Some(c)
}

/// Decode with the first encoding in [`ENCODING_ORDER`] that accepts the bytes
pub fn decode_text(bytes: &[u8]) -> Option<(String, TextEncoding)> {
    ENCODING_ORDER
        .iter()
        .find_map(|encoding| encoding.decode(bytes).map(|text| (text, *encoding)))
}

// ============================================================================
// FILE READER
// ============================================================================

/// Read the sales log and return its data lines.
///
/// The header line is discarded, every line is trimmed and blank lines are
/// dropped. A missing file is a [`PipelineError::MissingFile`].
pub fn read_sales_data(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(PipelineError::MissingFile {
            path: path.to_path_buf(),
        }
        .into());
    }

    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    let (text, encoding) = decode_text(&bytes)
        .with_context(|| format!("Could not decode {} with any known encoding", path.display()))?;
    debug!("Decoded {} as {}", path.display(), encoding.name());

    Ok(split_data_lines(&text))
}

/// Drop the header, trim, and skip blank lines
///
/// `\n`, `\r\n` and a lone `\r` all end a line.
pub fn split_data_lines(text: &str) -> Vec<String> {
    // "\r\n" yields an extra empty piece, which the blank filter drops
    text.split(['\n', '\r'])
        .skip(1)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// PARSER
// ============================================================================

/// Output of [`parse_transactions`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseOutcome {
    pub transactions: Vec<Transaction>,
    pub total_parsed: usize,
    pub invalid_removed: usize,
}

impl ParseOutcome {
    pub fn valid_count(&self) -> usize {
        self.transactions.len()
    }

    /// The three counters shown after cleaning
    pub fn summary_lines(&self) -> [String; 3] {
        [
            format!("Total records parsed: {}", self.total_parsed),
            format!("Invalid records removed: {}", self.invalid_removed),
            format!("Valid records after cleaning: {}", self.valid_count()),
        ]
    }
}

/// Parse raw data lines (header already removed) into transactions.
///
/// A bad line is counted and skipped; the parse never aborts.
pub fn parse_transactions<S: AsRef<str>>(lines: &[S]) -> ParseOutcome {
    let mut transactions = Vec::new();
    let mut invalid_removed = 0;

    for (index, line) in lines.iter().enumerate() {
        match Transaction::from_line(line.as_ref()) {
            Ok(tx) => transactions.push(tx),
            Err(issue) => {
                invalid_removed += 1;
                log_rejection(index + 1, &issue);
            }
        }
    }

    let outcome = ParseOutcome {
        transactions,
        total_parsed: lines.len(),
        invalid_removed,
    };
    info!(
        "Parsed {} lines: {} valid, {} invalid",
        outcome.total_parsed,
        outcome.valid_count(),
        outcome.invalid_removed
    );
    outcome
}

fn log_rejection(line_number: usize, issue: &RecordIssue) {
    debug!("Dropping data line {}: {}", line_number, issue);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_names() {
        assert_eq!(TextEncoding::Utf8.name(), "utf-8");
        assert_eq!(TextEncoding::Latin1.name(), "latin-1");
        assert_eq!(TextEncoding::Windows1252.name(), "cp1252");
    }

    #[test]
    fn test_decode_utf8_first() {
        let (text, encoding) = decode_text("Café|Zürich".as_bytes()).unwrap();
        assert_eq!(text, "Café|Zürich");
        assert_eq!(encoding, TextEncoding::Utf8);
    }

    #[test]
    fn test_decode_utf8_drops_bom() {
        let bytes = [0xEF, 0xBB, 0xBF, b'T', b'1'];
        let (text, _) = decode_text(&bytes).unwrap();
        assert_eq!(text, "T1");
    }

    #[test]
    fn test_decode_falls_back_to_latin1() {
        // 0xE9 alone is invalid UTF-8 but 'é' in Latin-1
        let bytes = [b'C', b'a', b'f', 0xE9];
        let (text, encoding) = decode_text(&bytes).unwrap();
        assert_eq!(text, "Café");
        assert_eq!(encoding, TextEncoding::Latin1);
    }

    #[test]
    fn test_cp1252_decoder() {
        let bytes = [0x80, b'5', 0x99];
        assert_eq!(
            TextEncoding::Windows1252.decode(&bytes),
            Some("€5™".to_string())
        );
        assert_eq!(TextEncoding::Windows1252.decode(&[0x81]), None);
    }

    #[test]
    fn test_split_data_lines_skips_header_and_blanks() {
        let text = "TransactionID|Date|ProductID|ProductName|Quantity|UnitPrice|CustomerID|Region\n\
                    T001|2024-01-05|P101|Widget|5|10.00|C001|East\n\
                    \n   \n\
                    T002|2024-01-06|P102|Gadget|1|20.00|C002|West\r\n";
        let lines = split_data_lines(text);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "T001|2024-01-05|P101|Widget|5|10.00|C001|East");
        assert_eq!(lines[1], "T002|2024-01-06|P102|Gadget|1|20.00|C002|West");
    }

    #[test]
    fn test_split_data_lines_old_mac_endings() {
        let text = "TransactionID|Date|ProductID|ProductName|Quantity|UnitPrice|CustomerID|Region\r\
                    T001|2024-01-05|P101|Widget|5|10.00|C001|East\r\
                    \r\
                    T002|2024-01-06|P102|Gadget|1|20.00|C002|West\r";
        let lines = split_data_lines(text);

        assert_eq!(
            lines,
            vec![
                "T001|2024-01-05|P101|Widget|5|10.00|C001|East",
                "T002|2024-01-06|P102|Gadget|1|20.00|C002|West",
            ]
        );
        assert_eq!(parse_transactions(&lines).valid_count(), 2);
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_sales_data(Path::new("definitely/not/here.txt")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::MissingFile { .. })
        ));
    }

    #[test]
    fn test_parse_transactions_counts() {
        let lines = vec![
            "T001|2024-01-05|P101|Widget,Pro|5|10.00|C001|East",
            "T002|2024-01-05|P102|Gadget|3|20.00|C002",
            "T003|2024-01-06|P103|Gizmo|0|5.00|C003|West",
            "T004|2024-01-06|P104|Doohickey|abc|5.00|C004|West",
            "T005|2024-01-07|P105|Thing|2|7.50|C005|North",
        ];

        let outcome = parse_transactions(&lines);

        assert_eq!(outcome.total_parsed, 5);
        assert_eq!(outcome.invalid_removed, 3);
        assert_eq!(outcome.valid_count(), 2);
        assert_eq!(outcome.transactions[0].product_name, "WidgetPro");
        assert_eq!(outcome.transactions[1].transaction_id, "T005");
        assert_eq!(
            outcome.summary_lines(),
            [
                "Total records parsed: 5".to_string(),
                "Invalid records removed: 3".to_string(),
                "Valid records after cleaning: 2".to_string(),
            ]
        );

        println!("✅ Parser counters test passed");
    }

    #[test]
    fn test_parse_empty_input() {
        let lines: Vec<String> = Vec::new();
        let outcome = parse_transactions(&lines);

        assert!(outcome.transactions.is_empty());
        assert_eq!(outcome.total_parsed, 0);
        assert_eq!(outcome.invalid_removed, 0);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let lines = vec![
            "T001|2024-01-05|P101|Widget|5|10.00|C001|East".to_string(),
            "bad line".to_string(),
            "T002|2024-01-05|P102|Gadget|2|1,000.00|C002|West".to_string(),
        ];

        let first = parse_transactions(&lines);
        let second = parse_transactions(&lines);

        assert_eq!(first, second);
        assert_eq!(first.invalid_removed, 1);
    }
}
