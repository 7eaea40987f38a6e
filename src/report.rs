//! Emission of the final table as a textual report.

use std::borrow::Cow;
use std::io::Write;

use bstr::ByteSlice;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WordFreqError};
use crate::table::FrequencyTable;

/// Output formats supported by [`write_report`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// One `count:word` line per entry, word bytes written verbatim.
    #[default]
    Plain,
    /// One JSON object per line with `word` (lossy UTF-8) and `count`.
    Json,
}

#[derive(Serialize)]
struct ReportRecord<'a> {
    word: Cow<'a, str>,
    count: u64,
}

/// Writes every entry of `table` to `writer` in ascending word order.
///
/// An empty table produces no output at all.
pub fn write_report<W: Write>(
    table: &FrequencyTable,
    mut writer: W,
    format: ReportFormat,
) -> Result<()> {
    for (word, count) in table {
        match format {
            ReportFormat::Plain => {
                write!(writer, "{count}:").map_err(|err| WordFreqError::io(err, None))?;
                writer
                    .write_all(word)
                    .and_then(|()| writer.write_all(b"\n"))
                    .map_err(|err| WordFreqError::io(err, None))?;
            }
            ReportFormat::Json => {
                let record = ReportRecord {
                    word: word.to_str_lossy(),
                    count,
                };
                serde_json::to_writer(&mut writer, &record)?;
                writer
                    .write_all(b"\n")
                    .map_err(|err| WordFreqError::io(err, None))?;
            }
        }
    }
    writer.flush().map_err(|err| WordFreqError::io(err, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn sample() -> FrequencyTable {
        let mut table = FrequencyTable::new();
        for word in [&b"a"[..], b"b", b"a", b"b", b"a"] {
            table.record(word).unwrap();
        }
        table
    }

    #[test]
    fn plain_report_lists_count_then_word() {
        let mut out = Vec::new();
        write_report(&sample(), &mut out, ReportFormat::Plain).unwrap();
        assert_eq!(out, b"3:a\n2:b\n");
    }

    #[test]
    fn plain_report_keeps_raw_bytes() {
        let mut table = FrequencyTable::new();
        table.record(b"caf\xe9").unwrap();
        let mut out = Vec::new();
        write_report(&table, &mut out, ReportFormat::Plain).unwrap();
        assert_eq!(out, b"1:caf\xe9\n");
    }

    #[test]
    fn json_report_emits_one_object_per_line() {
        let mut out = Vec::new();
        write_report(&sample(), &mut out, ReportFormat::Json).unwrap();
        let lines: Vec<Value> = out
            .lines()
            .map(|line| serde_json::from_slice(line).expect("valid JSON line"))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["word"], "a");
        assert_eq!(lines[0]["count"], 3);
        assert_eq!(lines[1]["word"], "b");
    }

    #[test]
    fn empty_table_writes_nothing() {
        let mut out = Vec::new();
        write_report(&FrequencyTable::new(), &mut out, ReportFormat::Plain).unwrap();
        assert!(out.is_empty());
    }
}
