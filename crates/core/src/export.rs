//! Client-side export of already-fetched lists.
//!
//! Exports are pure, synchronous transforms over the filtered/sorted
//! in-memory list a page is showing; no network calls happen here. Two
//! formats are produced: CSV with every field quoted, and a fixed-width
//! text table for the printable document.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use csv::{QuoteStyle, WriterBuilder};

use crate::models::{Card, StorageEntry, UserProfile};

/// Row source for tabular export.
pub trait Exportable {
    /// Resource name used in export file names.
    const RESOURCE: &'static str;

    /// Column headers.
    fn headers() -> &'static [&'static str];

    /// One row of cells; must have as many cells as there are headers.
    fn row(&self) -> Vec<String>;
}

impl Exportable for Card {
    const RESOURCE: &'static str = "cards";

    fn headers() -> &'static [&'static str] {
        &["uuid", "name_on_card", "holder", "phone", "balance", "blocked"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.uuid.to_string(),
            self.name_on_card.clone(),
            self.user_name.clone().unwrap_or_default(),
            self.user_phone.clone().unwrap_or_default(),
            self.balance.map(|balance| balance.to_string()).unwrap_or_default(),
            self.is_blocked.to_string(),
        ]
    }
}

impl Exportable for UserProfile {
    const RESOURCE: &'static str = "users";

    fn headers() -> &'static [&'static str] {
        &["uuid", "first_name", "last_name", "phone", "address"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.uuid.to_string(),
            self.first_name.clone(),
            self.last_name.clone(),
            self.phone.clone(),
            self.address.clone(),
        ]
    }
}

impl Exportable for StorageEntry {
    const RESOURCE: &'static str = "storages";

    fn headers() -> &'static [&'static str] {
        &["uuid", "commodity", "weight_kg", "check_in", "check_out", "hourly_rate", "active"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.uuid.to_string(),
            self.commodity.clone(),
            self.weight.to_string(),
            self.check_in.to_rfc3339(),
            self.check_out.map(|t| t.to_rfc3339()).unwrap_or_default(),
            self.hourly_rate.to_string(),
            self.is_active().to_string(),
        ]
    }
}

/// Serialize a list to CSV: quoted fields, comma-joined, header row first.
/// An empty list produces a header-only document.
pub fn to_csv<T: Exportable>(items: &[T]) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());
    writer
        .write_record(T::headers())
        .context("failed to write csv header")?;
    for item in items {
        writer.write_record(item.row()).context("failed to write csv row")?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("failed to flush csv writer: {err}"))?;
    String::from_utf8(bytes).context("csv output was not valid utf-8")
}

/// Render a list as a fixed-width text table with a title line, suitable
/// for printing or saving as the tabular document export.
pub fn to_table<T: Exportable>(title: &str, items: &[T]) -> String {
    let headers = T::headers();
    let rows: Vec<Vec<String>> = items.iter().map(Exportable::row).collect();

    let mut widths: Vec<usize> = headers.iter().map(|header| header.len()).collect();
    for row in &rows {
        for (index, cell) in row.iter().enumerate() {
            if index < widths.len() {
                widths[index] = widths[index].max(cell.len());
            }
        }
    }

    let render = |cells: &[String]| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(index, cell)| format!("{cell:<width$}", width = widths[index]))
            .collect::<Vec<_>>()
            .join("  ")
    };

    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    let rule: String = widths
        .iter()
        .map(|width| "-".repeat(*width))
        .collect::<Vec<_>>()
        .join("  ");

    let mut lines = vec![title.to_string(), String::new(), render(&header_cells), rule];
    for row in &rows {
        lines.push(render(row));
    }
    lines.push(String::new());
    lines.join("\n")
}

/// `{resource}_{ISO-date}.{ext}`.
pub fn file_name(resource: &str, extension: &str, date: NaiveDate) -> String {
    format!("{resource}_{}.{extension}", date.format("%Y-%m-%d"))
}

/// Write the CSV export into `dir` using today's date in the file name and
/// return the full path.
pub fn write_csv<T: Exportable>(dir: &Path, items: &[T]) -> Result<PathBuf> {
    let path = dir.join(file_name(T::RESOURCE, "csv", Utc::now().date_naive()));
    let contents = to_csv(items)?;
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Write the text-table export into `dir` and return the full path.
pub fn write_table<T: Exportable>(dir: &Path, title: &str, items: &[T]) -> Result<PathBuf> {
    let path = dir.join(file_name(T::RESOURCE, "txt", Utc::now().date_naive()));
    let contents = to_table(title, items);
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn sample_cards(count: usize) -> Vec<Card> {
        (0..count)
            .map(|index| {
                serde_json::from_value(json!({
                    "uuid": format!("7f8a1c9e-1111-4222-8333-44445555{index:04}"),
                    "name_on_card": format!("CARD {index}"),
                    "is_blocked": index % 2 == 1,
                    "user_name": "Ada Obi",
                    "user_phone": "08012345678",
                    "balance": "100.00"
                }))
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn row_count_matches_input_and_cells_match_headers() {
        let cards = sample_cards(5);
        let csv = to_csv(&cards).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 6);

        let header_columns = lines[0].split(',').count();
        assert_eq!(header_columns, Card::headers().len());
        for line in &lines[1..] {
            assert_eq!(line.split(',').count(), header_columns);
        }
    }

    #[test]
    fn every_field_is_quoted() {
        let cards = sample_cards(1);
        let csv = to_csv(&cards).unwrap();
        for line in csv.lines() {
            assert!(line.starts_with('"') && line.ends_with('"'), "line: {line}");
        }
    }

    #[test]
    fn empty_list_exports_a_header_only_file() {
        let cards = sample_cards(0);
        let csv = to_csv(&cards).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn file_names_embed_resource_and_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(file_name("cards", "csv", date), "cards_2024-05-01.csv");
    }

    #[test]
    fn table_pads_columns_to_a_common_width() {
        let cards = sample_cards(2);
        let table = to_table("Cards", &cards);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "Cards");
        // Header, rule, and data lines all share one width.
        assert_eq!(lines[2].len(), lines[3].len());
        assert_eq!(lines[3].len(), lines[4].len());
    }

    #[test]
    fn write_csv_places_the_file_in_the_requested_directory() {
        let dir = tempdir().unwrap();
        let cards = sample_cards(2);
        let path = write_csv(dir.path(), &cards).unwrap();
        assert!(path.exists());
        assert!(path.file_name().unwrap().to_str().unwrap().starts_with("cards_"));
    }
}
