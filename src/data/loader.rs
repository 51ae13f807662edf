use crate::data::bar::Bar;
use crate::data::table::BarTable;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use csv::{ReaderBuilder, StringRecord};
use indexmap::IndexMap;
use std::path::Path;
use tracing::info;

const TIME_COLUMNS: [&str; 2] = ["time", "timestamp"];
const PRICE_COLUMNS: [&str; 6] = ["open", "high", "low", "close", "high_time", "low_time"];

//column positions resolved from the header row
struct Layout {
    time: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    high_time: usize,
    low_time: usize,
    features: Vec<(usize, String)>,
}

impl Layout {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| anyhow!("Missing required column '{}'", name))
        };

        let time = TIME_COLUMNS
            .iter()
            .find_map(|name| headers.iter().position(|h| h.trim() == *name))
            .ok_or_else(|| anyhow!("Missing time column (expected 'time' or 'timestamp')"))?;

        let features = headers
            .iter()
            .enumerate()
            .filter(|(i, h)| {
                *i != time && !PRICE_COLUMNS.contains(&h.trim()) && !TIME_COLUMNS.contains(&h.trim())
            })
            .map(|(i, h)| (i, h.trim().to_string()))
            .collect();

        Ok(Layout {
            time,
            open: find("open")?,
            high: find("high")?,
            low: find("low")?,
            close: find("close")?,
            high_time: find("high_time")?,
            low_time: find("low_time")?,
            features,
        })
    }
}

//parses rfc3339 or a naive "%Y-%m-%d %H:%M:%S" timestamp taken as utc
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .map(|naive| naive.and_utc())
        .with_context(|| format!("Unrecognised timestamp '{}'", raw))
}

//empty cells, "nan" and "inf" all load as non-finite floats so they can be dropped later
fn parse_value(raw: &str) -> Result<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(f64::NAN);
    }
    raw.parse::<f64>()
        .with_context(|| format!("Invalid numeric value '{}'", raw))
}

fn field<'a>(record: &'a StringRecord, index: usize, line: usize) -> Result<&'a str> {
    record
        .get(index)
        .ok_or_else(|| anyhow!("Short record at line {}", line))
}

//loads a bar table from a csv file
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<BarTable> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .context(format!("Failed to open CSV file: {:?}", path))?;

    let headers = reader.headers()?.clone();
    let layout = Layout::from_headers(&headers)
        .context(format!("Bad header row in {:?}", path))?;

    let mut bars = Vec::new();

    for (index, result) in reader.records().enumerate() {
        let line = index + 2;
        let record = result.context(format!("Failed to parse CSV record at line {}", line))?;

        let timestamp = parse_timestamp(field(&record, layout.time, line)?)
            .context(format!("Bad timestamp at line {}", line))?;
        let high_time = parse_timestamp(field(&record, layout.high_time, line)?)
            .context(format!("Bad high_time at line {}", line))?;
        let low_time = parse_timestamp(field(&record, layout.low_time, line)?)
            .context(format!("Bad low_time at line {}", line))?;

        let price = |i: usize| -> Result<f64> {
            parse_value(field(&record, i, line)?).context(format!("Bad price at line {}", line))
        };

        let mut features = IndexMap::with_capacity(layout.features.len());
        for (i, name) in &layout.features {
            let value = parse_value(field(&record, *i, line)?)
                .context(format!("Bad value for '{}' at line {}", name, line))?;
            features.insert(name.clone(), value);
        }

        bars.push(Bar::new_unchecked(
            timestamp,
            price(layout.open)?,
            price(layout.high)?,
            price(layout.low)?,
            price(layout.close)?,
            high_time,
            low_time,
            features,
        ));
    }

    let table = BarTable::new(bars);
    info!(rows = table.len(), path = ?path, "loaded bar table");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    #[test]
    fn timestamps_accept_rfc3339_and_naive_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 11, 4, 9, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-11-04 09:30:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-11-04T09:30:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-11-04T10:30:00+01:00").unwrap(), expected);
        assert!(parse_timestamp("04/11/2024").is_err());
    }

    #[test]
    fn timestamp_column_and_empty_cells() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timestamp,open,high,low,close,high_time,low_time,rsi").unwrap();
        writeln!(
            file,
            "2024-11-04 10:00:00,1,2,0.5,1.5,2024-11-04 10:10:00,2024-11-04 10:20:00,"
        )
        .unwrap();
        writeln!(
            file,
            "2024-11-04 09:00:00,1,2,0.5,1.5,2024-11-04 09:10:00,2024-11-04 09:20:00,55"
        )
        .unwrap();

        let table = load_csv(file.path()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.bars()[0].feature("rsi"), Some(55.0));
        assert!(table.bars()[1].feature("rsi").unwrap().is_nan());
    }

    #[test]
    fn bad_number_reports_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "time,open,high,low,close,high_time,low_time").unwrap();
        writeln!(
            file,
            "2024-11-04 10:00:00,abc,2,0.5,1.5,2024-11-04 10:10:00,2024-11-04 10:20:00"
        )
        .unwrap();
        assert!(load_csv(file.path()).is_err());
    }
}
