//! CSV loading for bar streams and daily PnL sequences.
//!
//! Bars: `timestamp,open,high,low,close,volume` with RFC 3339 timestamps
//! carrying an explicit offset. Daily PnL: `date,pnl` as written by the
//! backtest export. Rows are parsed, never repaired; ordering and sanity are
//! the engine's concern.

use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use openmo_core::domain::Bar;
use openmo_core::DailyPnl;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{path} line {line}: {source}")]
    Row {
        path: PathBuf,
        line: u64,
        #[source]
        source: csv::Error,
    },
    #[error("{0} contains no data rows")]
    Empty(PathBuf),
}

#[derive(Debug, Deserialize)]
struct DailyPnlRow {
    date: NaiveDate,
    pnl: f64,
}

/// Load an ordered bar stream.
pub fn load_bars_csv(path: &Path) -> Result<Vec<Bar>, LoadError> {
    let bars: Vec<Bar> = read_rows(path)?;
    info!(path = %path.display(), bars = bars.len(), "loaded bars");
    Ok(bars)
}

/// Load a `date,pnl` file into a daily PnL sequence, keeping file order.
pub fn load_daily_pnl_csv(path: &Path) -> Result<DailyPnl, LoadError> {
    let rows: Vec<DailyPnlRow> = read_rows(path)?;
    info!(path = %path.display(), days = rows.len(), "loaded daily PnL");
    Ok(DailyPnl::from_rows(rows.into_iter().map(|r| (r.date, r.pnl))))
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, LoadError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_path(path)
        .map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row = record.map_err(|source| LoadError::Row {
            path: path.to_path_buf(),
            line: source.position().map_or(0, |p| p.line()),
            source,
        })?;
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(LoadError::Empty(path.to_path_buf()));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parses_bars_with_offsets() {
        let file = csv_file(
            "timestamp,open,high,low,close,volume\n\
             2024-03-04T09:30:00-05:00,5000,5006,4998,5004,1200\n\
             2024-03-04T14:35:00+00:00, 5004 , 5010 , 5001 , 5009 , 900\n",
        );
        let bars = load_bars_csv(file.path()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 5004.0);
        assert_eq!(bars[1].volume, 900.0);
        assert_eq!(bars[1].timestamp.offset().local_minus_utc(), 0);
    }

    #[test]
    fn reports_line_of_bad_row() {
        let file = csv_file(
            "timestamp,open,high,low,close,volume\n\
             2024-03-04T09:30:00-05:00,5000,5006,4998,5004,1200\n\
             not-a-time,5000,5006,4998,5004,1200\n",
        );
        match load_bars_csv(file.path()) {
            Err(LoadError::Row { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected row error, got {other:?}"),
        }
    }

    #[test]
    fn empty_file_is_an_error() {
        let file = csv_file("timestamp,open,high,low,close,volume\n");
        assert!(matches!(load_bars_csv(file.path()), Err(LoadError::Empty(_))));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(matches!(
            load_bars_csv(Path::new("/no/such/bars.csv")),
            Err(LoadError::Open { .. })
        ));
    }

    #[test]
    fn parses_daily_pnl_in_file_order() {
        let file = csv_file("date,pnl\n2024-03-05,-40.5\n2024-03-04,120\n");
        let daily = load_daily_pnl_csv(file.path()).unwrap();
        assert_eq!(daily.values(), vec![-40.5, 120.0]);
        assert_eq!(daily.days[0].date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    }
}
