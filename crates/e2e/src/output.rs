//! Human-readable run summaries

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use std::path::Path;

use translit_common::{Report, ResultRecord, Verdict};

fn table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Verdict counts followed by the completeness check
pub fn render_summary(report: &Report) -> String {
    let mut counts = table();
    counts.set_header(vec!["Total", "Pass", "Fail", "Partial", "Error"]);
    counts.add_row(vec![
        report.summary.total.to_string(),
        report.summary.count(Verdict::Pass).to_string(),
        report.summary.count(Verdict::Fail).to_string(),
        report.summary.count(Verdict::Partial).to_string(),
        report.summary.count(Verdict::Error).to_string(),
    ]);

    let mut out = String::new();
    out.push_str(&format!("{}\n{counts}\n\n", "Test Summary".bold()));
    out.push_str(&format!("{}\n", "Requirement Check".bold()));
    for entry in &report.completeness {
        let line = format!(
            "  {}: {}/{} required",
            entry.category.label(),
            entry.executed,
            entry.required
        );
        if entry.met() {
            out.push_str(&format!("{}\n", line.green()));
        } else {
            out.push_str(&format!("{}\n", line.red()));
        }
    }

    if report.complete() {
        out.push_str(&format!("{}\n", "✅ All test requirements met!".green().bold()));
    } else {
        out.push_str(&format!("{}\n", "⚠️  Some test requirements not met".yellow().bold()));
    }
    out
}

/// One row per case: id, verdict, time and comment
pub fn render_records(records: &[ResultRecord]) -> String {
    let mut rows = table();
    rows.set_header(vec!["Test Case ID", "Pass/Fail", "Time (ms)", "Comments"]);
    for record in records {
        rows.add_row(vec![
            record.id.clone(),
            record.verdict.to_string(),
            record.execution_ms.to_string(),
            record.comment.clone(),
        ]);
    }
    rows.to_string()
}

pub fn render_files(csv: &Path, json: &Path) -> String {
    format!(
        "{}\n  - {} (Excel-compatible)\n  - {} (backup)\n",
        "Files created:".bold(),
        csv.display(),
        json.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use translit_common::{summarize, Classification};

    #[test]
    fn test_summary_mentions_requirements() {
        colored::control::set_override(false);
        let case = translit_common::corpus::builtin().cases()[0].clone();
        let record = ResultRecord::completed(
            &case,
            "මම",
            Classification {
                verdict: Verdict::Pass,
                comment: "ok".to_string(),
            },
            std::time::Duration::from_millis(3),
        );
        let text = render_summary(&summarize(&[record.clone()]));
        assert!(text.contains("Positive Tests: 1/24 required"));
        assert!(text.contains("UI Tests: 0/1 required"));
        assert!(text.contains("Some test requirements not met"));

        let rows = render_records(&[record]);
        assert!(rows.contains("Pos_Fun_0001"));
    }
}
