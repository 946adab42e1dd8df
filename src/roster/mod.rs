mod parser;

use calamine::{open_workbook_auto, Reader};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

use parser::RosterTable;

pub const NICKNAME_COLUMN: &str = "KOL Nickname";
pub const FOLLOWERS_COLUMN: &str = "Followers";
pub const ENGAGEMENT_COLUMN: &str = "Engagement Rate";
pub const OPTIONAL_TEXT_COLUMNS: &[&str] = &["Platform", "Category", "Location", "Bio"];

/// One roster row after cleaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KolRecord {
    #[serde(rename = "KOL Nickname")]
    pub nickname: String,
    #[serde(rename = "Followers")]
    pub followers: u64,
    #[serde(rename = "Engagement Rate")]
    pub engagement_rate: String,
    /// Every other column, keyed by its trimmed header.
    #[serde(flatten)]
    pub columns: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("roster file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("missing required column: {0}")]
    MissingColumn(&'static str),
    #[error("roster has {count} records, above the limit of {limit}")]
    TooLarge { count: usize, limit: usize },
    #[error("unsupported roster format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("workbook has no worksheets")]
    EmptyWorkbook,
    #[error("failed to read roster: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid roster CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to read spreadsheet: {0}")]
    Workbook(#[from] calamine::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RosterFormat {
    Csv,
    Workbook,
}

impl RosterFormat {
    fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(Self::Workbook),
            _ => None,
        }
    }
}

/// Reads and cleans a roster from a spreadsheet or CSV file.
pub fn load_roster<P: AsRef<Path>>(path: P) -> Result<Vec<KolRecord>, RosterError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(RosterError::NotFound(path.to_path_buf()));
    }

    let table = match RosterFormat::from_path(path) {
        Some(RosterFormat::Csv) => parser::read_csv(File::open(path)?)?,
        Some(RosterFormat::Workbook) => read_workbook(path)?,
        None => return Err(RosterError::UnsupportedFormat(path.to_path_buf())),
    };

    info!(
        path = %path.display(),
        rows = table.rows.len(),
        columns = ?table.headers,
        "roster loaded"
    );
    parser::records_from_table(table)
}

/// Reads a roster from CSV text.
pub fn roster_from_csv<R: Read>(reader: R) -> Result<Vec<KolRecord>, RosterError> {
    let table = parser::read_csv(reader)?;
    parser::records_from_table(table)
}

fn read_workbook(path: &Path) -> Result<RosterTable, RosterError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(RosterError::EmptyWorkbook)??;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|row| row.iter().map(|cell| cell.to_string().trim().to_string()).collect())
        .unwrap_or_default();
    let rows = rows
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect();

    Ok(RosterTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::io::Write;

    #[test]
    fn load_roster_reports_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("List.xlsx");
        match load_roster(&missing) {
            Err(RosterError::NotFound(path)) => assert_eq!(path, missing),
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[test]
    fn load_roster_rejects_unknown_extensions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("roster.txt");
        File::create(&path).expect("create file");
        assert!(matches!(
            load_roster(&path),
            Err(RosterError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn load_roster_reads_csv_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("List.CSV");
        let mut file = File::create(&path).expect("create file");
        writeln!(file, "KOL Nickname,Followers,Engagement Rate,Platform").expect("write");
        writeln!(file, "Jane Doe,536k,4.2%,Instagram").expect("write");

        let records = load_roster(&path).expect("roster loads");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].followers, 536_000);
        assert_eq!(
            records[0].columns.get("Platform").map(String::as_str),
            Some("Instagram")
        );
    }

    #[test]
    fn load_roster_reads_first_worksheet() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("List.xlsx");

        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, header) in ["  KOL Nickname ", "Followers", "Engagement Rate ", " Platform"]
            .into_iter()
            .enumerate()
        {
            sheet.write_string(0, col as u16, header).expect("write header");
        }
        sheet.write_string(1, 0, "Jane Doe").expect("write cell");
        sheet.write_number(1, 1, 1_300_000.0).expect("write cell");
        sheet.write_string(1, 2, "4.5%").expect("write cell");
        sheet.write_string(1, 3, "Instagram").expect("write cell");
        sheet.write_string(2, 0, "李雷").expect("write cell");
        sheet.write_string(2, 1, "536k").expect("write cell");
        sheet.write_string(2, 3, "Weibo").expect("write cell");
        workbook.add_worksheet().write_string(0, 0, "ignored").expect("write cell");
        workbook.save(&path).expect("save workbook");

        let records = load_roster(&path).expect("roster loads");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].nickname, "Jane Doe");
        assert_eq!(records[0].followers, 1_300_000);
        assert_eq!(records[0].engagement_rate, "4.5%");
        assert_eq!(
            records[0].columns.get("Platform").map(String::as_str),
            Some("Instagram")
        );
        assert_eq!(records[1].followers, 536_000);
        assert_eq!(records[1].engagement_rate, "N/A");
    }

    #[test]
    fn blank_worksheet_reports_missing_column() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("List.xlsx");

        let mut workbook = rust_xlsxwriter::Workbook::new();
        workbook.add_worksheet();
        workbook.save(&path).expect("save workbook");

        assert!(matches!(
            load_roster(&path),
            Err(RosterError::MissingColumn(NICKNAME_COLUMN))
        ));
    }

    #[test]
    fn corrupt_workbook_is_a_workbook_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("List.xlsx");
        std::fs::write(&path, b"not a zip archive").expect("write file");

        assert!(matches!(load_roster(&path), Err(RosterError::Workbook(_))));
    }

    #[test]
    fn record_serializes_with_roster_headers() {
        let records = roster_from_csv(Cursor::new(
            "KOL Nickname,Followers,Engagement Rate,Location\nJane,1k,3%,SG\n",
        ))
        .expect("roster parses");

        let value = serde_json::to_value(&records[0]).expect("serialize");
        assert_eq!(value["KOL Nickname"], "Jane");
        assert_eq!(value["Followers"], 1000);
        assert_eq!(value["Engagement Rate"], "3%");
        assert_eq!(value["Location"], "SG");
    }

    #[test]
    fn empty_roster_is_not_an_error() {
        let records = roster_from_csv(Cursor::new("KOL Nickname,Followers,Engagement Rate\n"))
            .expect("roster parses");
        assert!(records.is_empty());
    }
}
