//! Run summary and report export
//!
//! Records are written twice: a comma-separated table (every value becomes
//! text) and an indented JSON backup. Both use the column set of the first
//! record; a record with any other column set aborts the export.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use crate::case::Category;
use crate::classify::Verdict;
use crate::error::{Error, Result};
use crate::record::ResultRecord;

/// Verdict counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub pass: usize,
    pub fail: usize,
    pub partial: usize,
    pub error: usize,
}

impl Summary {
    pub fn count(&self, verdict: Verdict) -> usize {
        match verdict {
            Verdict::Pass => self.pass,
            Verdict::Fail => self.fail,
            Verdict::Partial => self.partial,
            Verdict::Error => self.error,
        }
    }
}

/// Executed cases in one corpus category against its minimum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: Category,
    pub executed: usize,
    pub required: usize,
}

impl CategoryCount {
    pub fn met(&self) -> bool {
        self.executed >= self.required
    }
}

/// Derived view over a record collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub summary: Summary,
    pub completeness: Vec<CategoryCount>,
}

impl Report {
    /// True when every category reached its minimum
    pub fn complete(&self) -> bool {
        self.completeness.iter().all(CategoryCount::met)
    }
}

/// Count verdicts and category coverage. Pure; safe to call repeatedly.
pub fn summarize(records: &[ResultRecord]) -> Report {
    let mut summary = Summary {
        total: records.len(),
        ..Default::default()
    };
    let mut executed: HashMap<Category, usize> = HashMap::new();

    for record in records {
        match record.verdict {
            Verdict::Pass => summary.pass += 1,
            Verdict::Fail => summary.fail += 1,
            Verdict::Partial => summary.partial += 1,
            Verdict::Error => summary.error += 1,
        }
        if let Some(category) = Category::of_id(&record.id) {
            *executed.entry(category).or_default() += 1;
        }
    }

    let completeness = Category::ALL
        .into_iter()
        .map(|category| CategoryCount {
            category,
            executed: executed.get(&category).copied().unwrap_or(0),
            required: category.required(),
        })
        .collect();

    Report {
        summary,
        completeness,
    }
}

fn as_object(record: &ResultRecord) -> Result<Map<String, Value>> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::InvalidCase(format!("record serialized to non-object {other}"))),
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn header_cell(name: &str) -> String {
    if name.contains([',', '"', '\n', '\r']) {
        quote(name)
    } else {
        name.to_string()
    }
}

/// Render records as CSV: header row of column names, then one fully quoted
/// row per record. Empty input renders as an empty string.
pub fn to_csv(records: &[ResultRecord]) -> Result<String> {
    let rows = records.iter().map(as_object).collect::<Result<Vec<_>>>()?;
    rows_to_csv(&rows)
}

/// CSV over already-serialized rows. The first row fixes the columns; any
/// later row with a different key set is a [`Error::SchemaMismatch`].
fn rows_to_csv(rows: &[Map<String, Value>]) -> Result<String> {
    let Some(first) = rows.first() else {
        return Ok(String::new());
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(
        headers
            .iter()
            .map(|h| header_cell(h))
            .collect::<Vec<_>>()
            .join(","),
    );

    for (row, object) in rows.iter().enumerate() {
        let same_columns =
            object.len() == headers.len() && headers.iter().all(|h| object.contains_key(h));
        if !same_columns {
            return Err(Error::SchemaMismatch {
                row,
                expected: headers,
                found: object.keys().cloned().collect(),
            });
        }

        let cells: Vec<String> = headers
            .iter()
            .map(|h| quote(&stringify(&object[h.as_str()])))
            .collect();
        lines.push(cells.join(","));
    }

    Ok(lines.join("\n"))
}

/// Split CSV text into rows of fields. Handles quoted fields containing
/// commas, doubled quotes and line breaks; accepts `\n` or `\r\n` row ends.
pub fn parse_csv(text: &str) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut chars = text.chars().peekable();

    if text.is_empty() {
        return Ok(rows);
    }

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            '"' => {
                return Err(Error::CsvParse {
                    line,
                    reason: "quote inside unquoted field".to_string(),
                })
            }
            ',' => row.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
                line += 1;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(Error::CsvParse {
            line,
            reason: "unterminated quoted field".to_string(),
        });
    }
    row.push(field);
    rows.push(row);

    Ok(rows)
}

/// Rebuild records from CSV produced by [`to_csv`]
pub fn records_from_csv(text: &str) -> Result<Vec<ResultRecord>> {
    let mut rows = parse_csv(text)?.into_iter();
    let Some(headers) = rows.next() else {
        return Ok(Vec::new());
    };

    let mut records = Vec::new();
    for (index, row) in rows.enumerate() {
        let line = index + 2;
        if row.len() != headers.len() {
            return Err(Error::CsvParse {
                line,
                reason: format!("expected {} fields, found {}", headers.len(), row.len()),
            });
        }

        let mut object = Map::new();
        for (name, cell) in headers.iter().zip(row) {
            let value = match cell.parse::<u64>() {
                Ok(n) if name == "Execution Time (ms)" => Value::from(n),
                _ => Value::String(cell),
            };
            object.insert(name.clone(), value);
        }

        let record = serde_json::from_value(Value::Object(object)).map_err(|e| Error::CsvParse {
            line,
            reason: e.to_string(),
        })?;
        records.push(record);
    }

    Ok(records)
}

/// Load records from a previous run's `.csv` or `.json` report
pub fn load_records(path: &Path) -> Result<Vec<ResultRecord>> {
    let content = std::fs::read_to_string(path)?;
    let is_csv = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    if is_csv {
        records_from_csv(&content)
    } else {
        Ok(serde_json::from_str(&content)?)
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, content)?;
    Ok(())
}

/// Write the CSV table and the JSON backup. Nothing is written if the
/// records do not share one column set.
pub fn export(records: &[ResultRecord], csv_path: &Path, json_path: &Path) -> Result<()> {
    let csv = to_csv(records)?;
    let json = serde_json::to_string_pretty(records)?;

    debug!("Writing {} records", records.len());
    write_file(csv_path, &csv)?;
    info!("CSV saved to {}", csv_path.display());
    write_file(json_path, &json)?;
    info!("JSON backup saved to {}", json_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classification;
    use crate::corpus::builtin;
    use std::time::Duration;

    fn record(id_index: usize, verdict: Verdict, output: &str) -> ResultRecord {
        let case = builtin().cases()[id_index].clone();
        ResultRecord::completed(
            &case,
            output,
            Classification {
                verdict,
                comment: "Said \"hi\", then left".to_string(),
            },
            Duration::from_millis(1520),
        )
    }

    #[test]
    fn test_summarize_counts() {
        let records = vec![
            record(0, Verdict::Pass, "මම"),
            record(1, Verdict::Fail, ""),
            record(24, Verdict::Pass, ""),
            record(34, Verdict::Partial, "මම"),
        ];
        let report = summarize(&records);
        assert_eq!(
            report.summary,
            Summary {
                total: 4,
                pass: 2,
                fail: 1,
                partial: 1,
                error: 0
            }
        );
        assert_eq!(report.completeness[0].executed, 2);
        assert_eq!(report.completeness[1].executed, 1);
        assert_eq!(report.completeness[2].executed, 1);
        assert!(!report.complete());
    }

    #[test]
    fn test_summarize_is_idempotent() {
        let records = vec![record(0, Verdict::Pass, "මම"), record(25, Verdict::Error, "")];
        assert_eq!(summarize(&records), summarize(&records));
    }

    #[test]
    fn test_completeness_full_corpus() {
        let records: Vec<_> = (0..builtin().len())
            .map(|i| record(i, Verdict::Pass, "මම"))
            .collect();
        assert!(summarize(&records).complete());
    }

    #[test]
    fn test_csv_quoting() {
        let csv = to_csv(&[record(1, Verdict::Pass, "මම ගෙදර යනවා, හැඬැයි\nදැන්")]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Test Case ID,Test Case Description,Input Singlish Text,Expected Output,\
             Actual Output,Pass/Fail,Comments,Execution Time (ms),Input Type/Domain,\
             Sentence/Grammar Focus,Input Length Type,Quality Focus"
        );
        assert!(csv.contains(r#""Said ""hi"", then left""#));
        assert!(csv.contains(r#""1520""#));
        assert!(csv.contains("\"මම ගෙදර යනවා, හැඬැයි\nදැන්\""));
    }

    #[test]
    fn test_csv_empty() {
        assert_eq!(to_csv(&[]).unwrap(), "");
        assert!(records_from_csv("").unwrap().is_empty());
    }

    #[test]
    fn test_csv_rejects_heterogeneous_rows() {
        let first = as_object(&record(0, Verdict::Pass, "මම")).unwrap();
        let mut second = as_object(&record(1, Verdict::Fail, "")).unwrap();
        second.remove("Quality Focus");
        second.insert("Extra".to_string(), Value::from("x"));

        let err = rows_to_csv(&[first, second]).unwrap_err();
        match err {
            Error::SchemaMismatch {
                row,
                expected,
                found,
            } => {
                assert_eq!(row, 1);
                assert!(expected.contains(&"Quality Focus".to_string()));
                assert!(found.contains(&"Extra".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_csv_round_trip() {
        let records = vec![
            record(0, Verdict::Pass, "මම ගෙදර යනවා"),
            record(1, Verdict::Fail, "a, \"b\"\r\nc"),
            record(27, Verdict::Error, ""),
        ];
        let csv = to_csv(&records).unwrap();
        assert_eq!(records_from_csv(&csv).unwrap(), records);
    }

    #[test]
    fn test_parse_csv_rejects_unterminated() {
        assert!(matches!(
            parse_csv("a,\"b\nc"),
            Err(Error::CsvParse { .. })
        ));
    }

    #[test]
    fn test_export_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("out/test-results.csv");
        let json_path = dir.path().join("out/test-results.json");
        let records = vec![record(0, Verdict::Pass, "මම"), record(24, Verdict::Pass, "")];

        export(&records, &csv_path, &json_path).unwrap();

        assert_eq!(load_records(&csv_path).unwrap(), records);
        assert_eq!(load_records(&json_path).unwrap(), records);
        let json = std::fs::read_to_string(&json_path).unwrap();
        assert!(json.contains("\n  {\n    \"Test Case ID\": \"Pos_Fun_0001\""));
    }
}
