use super::{
    KolRecord, RosterError, ENGAGEMENT_COLUMN, FOLLOWERS_COLUMN, NICKNAME_COLUMN,
    OPTIONAL_TEXT_COLUMNS,
};
use std::collections::BTreeMap;
use std::io::Read;

/// Raw cell text as read from a CSV file or the first worksheet.
#[derive(Debug, Default)]
pub(crate) struct RosterTable {
    pub(crate) headers: Vec<String>,
    pub(crate) rows: Vec<Vec<String>>,
}

pub(crate) fn read_csv<R: Read>(reader: R) -> Result<RosterTable, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()?
        .iter()
        .map(|header| header.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RosterTable { headers, rows })
}

pub(crate) fn records_from_table(table: RosterTable) -> Result<Vec<KolRecord>, RosterError> {
    let RosterTable { headers, rows } = table;
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|header| header == name)
            .ok_or(RosterError::MissingColumn(name))
    };

    let nickname_at = column(NICKNAME_COLUMN)?;
    let followers_at = column(FOLLOWERS_COLUMN)?;
    let engagement_at = column(ENGAGEMENT_COLUMN)?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let cell = |index: usize| row.get(index).map(String::as_str).unwrap_or("");

        let engagement = cell(engagement_at).trim();
        let engagement_rate = if engagement.is_empty() {
            "N/A".to_string()
        } else {
            engagement.to_string()
        };

        let mut columns = BTreeMap::new();
        for (index, header) in headers.iter().enumerate() {
            if header.is_empty() || [nickname_at, followers_at, engagement_at].contains(&index) {
                continue;
            }
            let value = if OPTIONAL_TEXT_COLUMNS.contains(&header.as_str()) {
                clean_text(cell(index))
            } else {
                cell(index).to_string()
            };
            columns.insert(header.clone(), value);
        }

        records.push(KolRecord {
            nickname: clean_text(cell(nickname_at)),
            followers: parse_followers(cell(followers_at)),
            engagement_rate,
            columns,
        });
    }

    Ok(records)
}

pub(crate) fn clean_text(value: &str) -> String {
    value.trim().replace("\r\n", " ").replace('\n', " ")
}

/// Parses follower counts such as `1.3M`, `536k` or `12000`; anything else is 0.
pub(crate) fn parse_followers(value: &str) -> u64 {
    let value = value.trim().to_lowercase();

    let (number, multiplier) = if value.contains('m') {
        (value.replace('m', ""), 1_000_000.0)
    } else if value.contains('k') {
        (value.replace('k', ""), 1_000.0)
    } else if !value.is_empty() && value.chars().all(|ch| ch.is_ascii_digit()) {
        return value.parse().unwrap_or(0);
    } else {
        return 0;
    };

    match number.trim().parse::<f64>() {
        Ok(parsed) if parsed.is_finite() && parsed >= 0.0 => (parsed * multiplier) as u64,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn followers_support_suffixes_and_plain_numbers() {
        assert_eq!(parse_followers("1.3M"), 1_300_000);
        assert_eq!(parse_followers(" 536k "), 536_000);
        assert_eq!(parse_followers("2.5K"), 2_500);
        assert_eq!(parse_followers("12000"), 12_000);
        assert_eq!(parse_followers(""), 0);
        assert_eq!(parse_followers("1,234"), 0);
        assert_eq!(parse_followers("lots"), 0);
        assert_eq!(parse_followers("-3k"), 0);
    }

    #[test]
    fn clean_text_trims_and_flattens_newlines() {
        assert_eq!(clean_text("  Beauty\nLifestyle \r\n"), "Beauty Lifestyle");
    }

    #[test]
    fn csv_headers_are_trimmed() {
        let table = read_csv(Cursor::new(" KOL Nickname ,Followers\nJane,1k\n")).expect("parse");
        assert_eq!(table.headers, vec!["KOL Nickname", "Followers"]);
        assert_eq!(table.rows, vec![vec!["Jane".to_string(), "1k".to_string()]]);
    }

    #[test]
    fn records_require_core_columns() {
        let table = RosterTable {
            headers: vec!["KOL Nickname".into(), "Followers".into()],
            rows: Vec::new(),
        };
        match records_from_table(table) {
            Err(RosterError::MissingColumn(column)) => assert_eq!(column, "Engagement Rate"),
            other => panic!("expected missing column, got {other:?}"),
        }
    }

    #[test]
    fn records_clean_values_and_keep_extra_columns() {
        let table = RosterTable {
            headers: vec![
                "KOL Nickname".into(),
                "Followers".into(),
                "Engagement Rate".into(),
                "Bio".into(),
                "Handle".into(),
            ],
            rows: vec![
                vec![
                    " Jane Doe\n".into(),
                    "1.3M".into(),
                    "".into(),
                    " Travel\nFood ".into(),
                    " @jane ".into(),
                ],
                vec!["".into(), " ".into()],
            ],
        };

        let records = records_from_table(table).expect("records");
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.nickname, "Jane Doe");
        assert_eq!(record.followers, 1_300_000);
        assert_eq!(record.engagement_rate, "N/A");
        assert_eq!(record.columns.get("Bio").map(String::as_str), Some("Travel Food"));
        assert_eq!(record.columns.get("Handle").map(String::as_str), Some(" @jane "));
    }
}
