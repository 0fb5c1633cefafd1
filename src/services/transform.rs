use std::collections::HashMap;
use polars::prelude::*;
use tracing::{debug, info, warn};
use crate::error::{EtlError, Result};
use crate::models::{CarListing, Column};
use crate::services::excel::SOURCE_ROW_COLUMN;

/// Normalized, deduplicated listings of one run.
///
/// The batch can be iterated any number of times and always yields the same records in
/// the same order.
#[derive(Debug, Clone, Default)]
pub struct ListingBatch {
    records: Vec<CarListing>,
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub duplicates_removed: usize,
}

impl ListingBatch {
    pub fn iter(&self) -> std::slice::Iter<'_, CarListing> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&CarListing> {
        self.records.iter().find(|r| r.id == id)
    }
}

impl<'a> IntoIterator for &'a ListingBatch {
    type Item = &'a CarListing;
    type IntoIter = std::slice::Iter<'a, CarListing>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// `price / (distance / 1000)` rounded to two decimals; `None` when either input is missing
/// or the distance is zero.
pub fn price_per_1000km(price: Option<f64>, distance: Option<f64>) -> Option<f64> {
    match (price, distance) {
        (Some(p), Some(d)) if d != 0.0 => Some(round2(p / (d / 1000.0))),
        _ => None,
    }
}

fn round2(v: f64) -> f64 {
    let scaled = v * 100.0;
    if scaled.is_finite() {
        scaled.round() / 100.0
    } else {
        v
    }
}

enum RawColumn {
    Numeric(Float64Chunked),
    Text(StringChunked),
    Missing,
}

enum RawCell<'a> {
    Number(f64),
    Text(&'a str),
    Null,
}

impl RawColumn {
    fn from_frame(df: &DataFrame, headers: &[&str], column: Column) -> Result<Self> {
        let Some(name) = column.resolve(headers) else {
            return Ok(RawColumn::Missing);
        };
        let series = df.column(name)?;
        debug!("Column {} <- {} ({})", column.name(), name, series.dtype());

        if series.dtype().is_numeric() {
            Ok(RawColumn::Numeric(series.cast(&DataType::Float64)?.f64()?.clone()))
        } else {
            Ok(RawColumn::Text(series.cast(&DataType::String)?.str()?.clone()))
        }
    }

    fn cell(&self, idx: usize) -> RawCell<'_> {
        let cell = match self {
            RawColumn::Numeric(ca) => ca.get(idx).map(RawCell::Number),
            RawColumn::Text(ca) => ca.get(idx).map(RawCell::Text),
            RawColumn::Missing => None,
        };
        cell.unwrap_or(RawCell::Null)
    }
}

/// Typed accessors over one source row, reporting failures with the row number.
struct RowReader<'a> {
    columns: &'a HashMap<Column, RawColumn>,
    idx: usize,
    sheet_row: usize,
}

impl RowReader<'_> {
    fn cell(&self, column: Column) -> RawCell<'_> {
        self.columns
            .get(&column)
            .map_or(RawCell::Null, |raw| raw.cell(self.idx))
    }

    fn invalid(&self, column: Column, value: impl ToString) -> EtlError {
        EtlError::InvalidValue {
            row: self.sheet_row,
            column: column.name().to_string(),
            value: value.to_string(),
        }
    }

    fn text(&self, column: Column) -> Option<String> {
        match self.cell(column) {
            RawCell::Number(f) if f.fract() == 0.0 && f.abs() < 1e15 => {
                Some(format!("{}", f as i64))
            }
            RawCell::Number(f) => Some(f.to_string()),
            RawCell::Text(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            RawCell::Null => None,
        }
    }

    fn number(&self, column: Column) -> Result<Option<f64>> {
        match self.cell(column) {
            RawCell::Number(f) if f.is_nan() => Ok(None),
            RawCell::Number(f) => Ok(Some(f)),
            RawCell::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                // "200 000" style thousand separators are common in exports.
                let compact: String = trimmed
                    .chars()
                    .filter(|c| *c != ' ' && *c != '\u{a0}')
                    .collect();
                match compact.parse::<f64>() {
                    Ok(v) if v.is_finite() => Ok(Some(v)),
                    _ => Err(self.invalid(column, trimmed)),
                }
            }
            RawCell::Null => Ok(None),
        }
    }

    fn non_negative(&self, column: Column) -> Result<Option<f64>> {
        match self.number(column)? {
            Some(v) if v < 0.0 => Err(self.invalid(column, v)),
            v => Ok(v),
        }
    }

    fn integer(&self, column: Column, min: i64) -> Result<Option<i64>> {
        match self.number(column)? {
            Some(v) if v.fract() != 0.0 || v < min as f64 => Err(self.invalid(column, v)),
            Some(v) => Ok(Some(v as i64)),
            None => Ok(None),
        }
    }

    fn listing(&self) -> Result<Option<CarListing>> {
        let Some(id) = self.text(Column::Id) else {
            return Ok(None);
        };

        let price = self.non_negative(Column::Price)?;
        let distance = self.non_negative(Column::Distance)?;

        Ok(Some(CarListing {
            id,
            make: self.text(Column::Make),
            model: self.text(Column::Model),
            price,
            distance,
            price_per_1000km: price_per_1000km(price, distance),
            model_year: self.integer(Column::ModelYear, 1900)?,
            fuel: self.text(Column::Fuel),
            body_type: self.text(Column::BodyType),
            horsepower: self.integer(Column::Horsepower, 0)?,
            registration: self.text(Column::Registration),
        }))
    }
}

/// Maps the raw frame onto the listing schema, computes `price_per_1000km` and keeps the
/// last occurrence of every id.
pub fn transform(df: &DataFrame) -> Result<ListingBatch> {
    info!("Transform: normalizing {} rows", df.height());

    let headers = df.get_column_names();
    let columns = Column::ALL
        .iter()
        .map(|&col| Ok((col, RawColumn::from_frame(df, &headers, col)?)))
        .collect::<Result<HashMap<_, _>>>()?;

    // Frames built without worksheet positions are taken as header-on-row-1, no gaps.
    let sheet_rows = match df.column(SOURCE_ROW_COLUMN) {
        Ok(series) => Some(series.cast(&DataType::Int64)?.i64()?.clone()),
        Err(_) => None,
    };

    let mut records = Vec::with_capacity(df.height());
    let mut rows_skipped = 0;
    for idx in 0..df.height() {
        let sheet_row = sheet_rows
            .as_ref()
            .and_then(|rows| rows.get(idx))
            .map_or(idx + 2, |row| row as usize);
        let row = RowReader { columns: &columns, idx, sheet_row };
        match row.listing()? {
            Some(listing) => records.push(listing),
            None => rows_skipped += 1,
        }
    }
    if rows_skipped > 0 {
        warn!("Transform: {} rows without id skipped", rows_skipped);
    }

    let before = records.len();
    let records = dedup_last_wins(records);
    let duplicates_removed = before - records.len();
    if duplicates_removed > 0 {
        info!("Transform: {} duplicates (id) removed", duplicates_removed);
    }

    info!("Transform: {} records ready", records.len());
    Ok(ListingBatch {
        records,
        rows_read: df.height(),
        rows_skipped,
        duplicates_removed,
    })
}

/// Keeps the last record for each id, at the position of that last occurrence.
fn dedup_last_wins(records: Vec<CarListing>) -> Vec<CarListing> {
    let last_seen: HashMap<&str, usize> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (r.id.as_str(), i))
        .collect();
    let keep: Vec<bool> = records
        .iter()
        .enumerate()
        .map(|(i, r)| last_seen.get(r.id.as_str()) == Some(&i))
        .collect();

    records
        .into_iter()
        .zip(keep)
        .filter_map(|(r, keep)| keep.then_some(r))
        .collect()
}
