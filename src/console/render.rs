//! Text rendering for the console
//!
//! Table, edit form, and the two charts. Everything returns a `String` so
//! output can be checked without a terminal.

use std::fmt::Write;

use crate::import::{CsvParseResult, ErrorLog, ImportReport};
use crate::list::{
    BarDataset, CaseLevel, ChartOptions, EditSession, PageView, ScatterDataset,
    HIGH_CASES_THRESHOLD,
};
use crate::list::chart::format_count;
use crate::records::{Field, Record};

const BAR_WIDTH: usize = 40;
const PLOT_WIDTH: usize = 60;
const PLOT_HEIGHT: usize = 16;
const LABEL_WIDTH: usize = 18;

fn glyph(level: CaseLevel) -> char {
    match level {
        CaseLevel::High => '#',
        CaseLevel::Normal => '=',
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
        out.push('~');
        out
    }
}

fn row(record: &Record) -> String {
    format!(
        "{:<12} {:<20} {:>7} {:>7} {:<10} {:<16}",
        truncate(record.id.as_str(), 12),
        truncate(&record.fields.location, 20),
        format_count(record.fields.cases),
        format_count(record.fields.deaths),
        truncate(&record.fields.date, 10),
        truncate(&record.fields.regions, 16),
    )
}

/// The records table with its pagination line
pub fn render_table(view: &PageView) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<12} {:<20} {:>7} {:>7} {:<10} {:<16}",
        "ID", "Location", "Cases", "Deaths", "Date", "Regions"
    );
    let _ = writeln!(out, "{}", "-".repeat(77));

    if view.records.is_empty() {
        let _ = writeln!(out, "No data found");
    } else {
        for record in &view.records {
            let _ = writeln!(out, "{}", row(record));
        }
    }

    let _ = writeln!(out);
    let _ = write!(
        out,
        "{}Page {} of {}{}  ({} matching)",
        if view.has_previous() { "< prev  " } else { "" },
        view.page,
        view.total_pages,
        if view.has_next() { "  next >" } else { "" },
        view.total_matches,
    );
    out
}

/// The open edit form
pub fn render_edit_form(session: &EditSession) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Editing {}", session.id);
    for field in Field::all() {
        let _ = writeln!(out, "  {:<9} {}", format!("{}:", field.label()), session.draft.get(*field));
    }
    let _ = write!(out, "`set <field> <value>` to change, `save` to update, `cancel` to discard");
    out
}

/// Horizontal bar chart of cases by location
pub fn render_bar_chart(bar: &BarDataset, options: &ChartOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", options.title);

    if bar.data.is_empty() {
        let _ = write!(out, "(no data)");
        return out;
    }

    let max = bar.data.iter().flatten().copied().max().unwrap_or(0).max(1);
    for ((label, value), level) in bar.labels.iter().zip(&bar.data).zip(&bar.levels) {
        let length = value
            .map(|v| ((v as f64 / max as f64) * BAR_WIDTH as f64).round() as usize)
            .unwrap_or(0);
        let _ = writeln!(
            out,
            "{:<width$} |{:<bar_width$}| {}",
            truncate(label, LABEL_WIDTH),
            glyph(*level).to_string().repeat(length),
            options.bar_tooltip(*value),
            width = LABEL_WIDTH,
            bar_width = BAR_WIDTH,
        );
    }

    let _ = write!(
        out,
        "x: {}  y: {}  [{} high (> {})  {} normal]",
        options.x_axis.title,
        options.y_axis.title,
        glyph(CaseLevel::High),
        HIGH_CASES_THRESHOLD,
        glyph(CaseLevel::Normal),
    );
    out
}

/// Scatter plot of deaths against cases
pub fn render_scatter(scatter: &ScatterDataset, options: &ChartOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", options.title);

    let points: Vec<(u64, u64, CaseLevel)> = scatter
        .data
        .iter()
        .filter_map(|p| Some((p.x?, p.y?, p.level)))
        .collect();
    let skipped = scatter.data.len() - points.len();

    if points.is_empty() {
        let _ = write!(out, "(no data)");
        if skipped > 0 {
            let _ = write!(out, " {} point(s) without numbers", skipped);
        }
        return out;
    }

    let max_x = points.iter().map(|p| p.0).max().unwrap_or(0).max(1);
    let max_y = points.iter().map(|p| p.1).max().unwrap_or(0).max(1);

    let mut grid = vec![vec![' '; PLOT_WIDTH]; PLOT_HEIGHT];
    for (x, y, level) in &points {
        let col = ((*x as f64 / max_x as f64) * (PLOT_WIDTH - 1) as f64).round() as usize;
        let row = ((*y as f64 / max_y as f64) * (PLOT_HEIGHT - 1) as f64).round() as usize;
        let cell = &mut grid[PLOT_HEIGHT - 1 - row][col];
        // High points win when they overlap
        if *cell != 'H' {
            *cell = match level {
                CaseLevel::High => 'H',
                CaseLevel::Normal => 'o',
            };
        }
    }

    let _ = writeln!(out, "{} (max {})", options.y_axis.title, max_y);
    for line in grid {
        let _ = writeln!(out, "|{}", line.into_iter().collect::<String>());
    }
    let _ = writeln!(out, "+{}", "-".repeat(PLOT_WIDTH));
    let _ = write!(
        out,
        "{} (max {})  [H high (> {})  o normal]",
        options.x_axis.title, max_x, HIGH_CASES_THRESHOLD
    );
    if skipped > 0 {
        let _ = write!(out, "\n{} point(s) without numbers not plotted", skipped);
    }
    out
}

/// Summary of a parsed CSV file (dry run)
pub fn render_parse_result(result: &CsvParseResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Rows read: {}", result.rows_read);
    let _ = writeln!(out, "Valid rows: {}", result.rows.len());
    let _ = write!(out, "Rows rejected: {}", result.rows_rejected);
    push_errors(&mut out, &result.errors);
    out
}

/// Summary of a completed import
pub fn render_import_report(report: &ImportReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Rows read: {}", report.rows_read);
    let _ = writeln!(out, "Rows rejected: {}", report.rows_rejected);
    let _ = writeln!(out, "Records created: {}", report.created.len());
    let _ = write!(out, "Create failures: {}", report.failed);
    push_errors(&mut out, &report.errors);
    out
}

/// First ten messages, then how many more there were
fn push_errors(out: &mut String, errors: &ErrorLog) {
    if errors.is_empty() {
        return;
    }
    let _ = write!(out, "\nErrors (first 10):");
    for error in errors.messages().iter().take(10) {
        let _ = write!(out, "\n  {}", error);
    }
    let hidden = errors.total().saturating_sub(10);
    if hidden > 0 {
        let _ = write!(out, "\n  ... and {} more errors", hidden);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::derive_datasets;
    use crate::records::{RecordDraft, RecordFields, RecordId};

    fn records() -> Vec<Record> {
        vec![
            Record::new("1", RecordFields::new("Manila", 150, 2, "2023-01-01", "NCR")),
            Record::new("2", RecordFields::new("Cebu", 40, 0, "2023-01-02", "Region VII")),
        ]
    }

    #[test]
    fn test_table_lists_rows_and_pages() {
        let view = PageView {
            records: records(),
            page: 1,
            total_pages: 2,
            total_matches: 17,
        };
        let text = render_table(&view);
        assert!(text.contains("Manila"));
        assert!(text.contains("Region VII"));
        assert!(text.contains("Page 1 of 2  next >"));
        assert!(!text.contains("< prev"));
    }

    #[test]
    fn test_empty_table() {
        let view = PageView {
            records: Vec::new(),
            page: 1,
            total_pages: 0,
            total_matches: 0,
        };
        let text = render_table(&view);
        assert!(text.contains("No data found"));
        assert!(text.contains("Page 1 of 0"));
    }

    #[test]
    fn test_bar_chart_marks_high_records() {
        let charts = derive_datasets(&records());
        let text = render_bar_chart(&charts.bar, &ChartOptions::bar());

        let manila = text.lines().find(|l| l.starts_with("Manila")).unwrap();
        assert!(manila.contains(&"#".repeat(BAR_WIDTH)));
        assert!(manila.ends_with("Cases: 150"));

        let cebu = text.lines().find(|l| l.starts_with("Cebu")).unwrap();
        assert!(cebu.contains('='));
        assert!(!cebu.contains('#'));
    }

    #[test]
    fn test_scatter_plots_points() {
        let mut data = records();
        data[1].fields.deaths = None;
        let charts = derive_datasets(&data);
        let text = render_scatter(&charts.scatter, &ChartOptions::scatter());

        let grid: Vec<&str> = text.lines().filter(|l| l.starts_with('|')).collect();
        assert_eq!(grid.len(), PLOT_HEIGHT);
        assert!(grid.iter().any(|l| l.contains('H')));
        assert!(!grid.iter().any(|l| l.contains('o')));
        assert!(text.contains("1 point(s) without numbers"));
    }

    #[test]
    fn test_edit_form() {
        let session = EditSession {
            id: RecordId::from("1"),
            draft: RecordDraft::from_fields(&records()[0].fields),
        };
        let text = render_edit_form(&session);
        assert!(text.contains("Editing 1"));
        assert!(text.contains("Cases:    150"));
    }

    #[test]
    fn test_import_report_counts_hidden_errors() {
        let mut csv_data = String::from("location,cases,deaths,date,regions\n");
        for _ in 0..120 {
            csv_data.push_str("X,bad,0,2023-01-01,R\n");
        }
        let parsed = crate::import::CsvImporter::new().parse_str(&csv_data).unwrap();
        let text = render_parse_result(&parsed);

        assert!(text.contains("Rows rejected: 120"));
        assert!(text.contains("Line 11: cases"));
        assert!(!text.contains("Line 12:"));
        assert!(text.ends_with("... and 110 more errors"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Manila", 10), "Manila");
        assert_eq!(truncate("Quezon City", 6), "Quezo~");
    }
}
