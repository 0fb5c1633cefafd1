use super::types::{ColumnKind, SheetSelector, SOURCE_ROW_COLUMN};
use super::utils::*;
use std::collections::HashSet;
use std::path::Path;
use calamine::{open_workbook_auto, Data, Reader};
use polars::prelude::*;
use tracing::{debug, error, info};
use crate::error::{EtlError, Result};
use crate::models::Column;

/// Reads one worksheet of a spreadsheet into a `DataFrame`, header row first.
pub struct ExcelExtractor {
    sheet: SheetSelector,
}

impl ExcelExtractor {
    pub fn new(sheet: SheetSelector) -> Self {
        Self { sheet }
    }

    pub fn read_sheet(&self, path: &Path) -> Result<DataFrame> {
        info!("Extract: reading {} (sheet={})", path.display(), self.sheet);

        if !path.exists() {
            error!("Spreadsheet not found: {}", path.display());
            return Err(EtlError::SourceNotFound(path.to_path_buf()));
        }

        let mut workbook = open_workbook_auto(path).map_err(|e| {
            error!("Failed to open workbook {}: {}", path.display(), e);
            EtlError::Format(format!("Failed to open workbook {}: {}", path.display(), e))
        })?;

        let sheet_names = workbook.sheet_names();
        debug!("Workbook sheets: {:?}", sheet_names);
        let sheet_name = self.pick_sheet(&sheet_names)?;

        let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
            EtlError::Format(format!("Failed to read worksheet {}: {}", sheet_name, e))
        })?;
        let rows: Vec<Vec<Data>> = range.rows().map(|row| row.to_vec()).collect();
        info!("Extract: sheet {} has {} rows including header", sheet_name, rows.len());

        // The range starts at the first used cell, not necessarily A1.
        let header_row = range.start().map_or(1, |(row, _)| row as usize + 1);
        frame_from_sheet_rows(&rows, header_row)
    }

    fn pick_sheet(&self, sheet_names: &[String]) -> Result<String> {
        let picked = match &self.sheet {
            SheetSelector::First => sheet_names.first(),
            SheetSelector::Name(name) => sheet_names.iter().find(|s| *s == name),
            SheetSelector::Index(idx) => sheet_names.get(*idx),
        };

        picked.cloned().ok_or_else(|| {
            EtlError::Format(format!(
                "Sheet {} not found (available: {})",
                self.sheet,
                sheet_names.join(", ")
            ))
        })
    }
}

/// Builds the raw table from worksheet rows, with the header in worksheet row 1.
/// See [`frame_from_sheet_rows`].
pub fn frame_from_rows(rows: &[Vec<Data>]) -> Result<DataFrame> {
    frame_from_sheet_rows(rows, 1)
}

/// Builds the raw table from worksheet rows whose first row (the header) sits at the 1-based
/// worksheet row `header_row`. Fully blank rows are dropped; every kept row carries its
/// worksheet row number in [`SOURCE_ROW_COLUMN`]. Fails when a required listing column has
/// no matching header.
pub fn frame_from_sheet_rows(rows: &[Vec<Data>], header_row: usize) -> Result<DataFrame> {
    let header_cells = rows
        .first()
        .ok_or_else(|| EtlError::Format("Sheet is empty".to_string()))?;

    let mut existing_names = HashSet::new();
    let headers: Vec<String> = header_cells
        .iter()
        .map(|cell| {
            let raw = cell_text(cell).unwrap_or_default();
            clean_column_name(&raw, &mut existing_names)
        })
        .collect();

    let missing: Vec<&str> = Column::ALL
        .iter()
        .filter(|col| col.is_required() && col.resolve(&headers).is_none())
        .map(|col| col.name())
        .collect();
    if !missing.is_empty() {
        error!("Missing required columns {:?}; headers were {:?}", missing, headers);
        return Err(EtlError::Format(format!(
            "Missing required column(s): {} (found: {})",
            missing.join(", "),
            headers.join(", ")
        )));
    }

    let (sheet_rows, data_rows): (Vec<i64>, Vec<&Vec<Data>>) = rows
        .iter()
        .enumerate()
        .skip(1) // header
        .filter(|(_, row)| row.iter().any(|cell| cell_text(cell).is_some()))
        .map(|(offset, row)| ((header_row + offset) as i64, row))
        .unzip();
    let blank = rows.len() - 1 - data_rows.len();
    if blank > 0 {
        debug!("Dropped {} blank rows", blank);
    }

    let mut columns: Vec<Series> = headers
        .iter()
        .enumerate()
        .map(|(col_idx, header)| {
            let values: Vec<&Data> = data_rows
                .iter()
                .map(|row| row.get(col_idx).unwrap_or(&Data::Empty))
                .collect();

            match detect_column_kind(values.iter().copied()) {
                ColumnKind::Numeric => {
                    let nums: Vec<Option<f64>> = values.iter().map(|v| cell_number(v)).collect();
                    Series::new(header, nums)
                }
                ColumnKind::Text => {
                    let strings: Vec<Option<String>> =
                        values.iter().map(|v| cell_text(v)).collect();
                    Series::new(header, strings)
                }
            }
        })
        .collect();
    columns.push(Series::new(SOURCE_ROW_COLUMN, sheet_rows));

    let df = DataFrame::new(columns)?;
    debug!("Raw frame shape: {} rows x {} columns", df.height(), df.width());
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    #[test]
    fn builds_typed_frame() {
        let rows = vec![
            vec![s("Id"), s("Make"), s("Model"), s("Price"), s("Distance")],
            vec![Data::Float(1.0), s("Volvo"), s("V70"), Data::Float(10000.0), Data::Int(50000)],
            vec![Data::Empty, Data::Empty, Data::Empty, Data::Empty, Data::Empty],
            vec![Data::Float(2.0), s("Saab"), Data::Empty, s("n/a"), Data::Empty],
        ];

        let df = frame_from_rows(&rows).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(
            df.get_column_names(),
            vec!["id", "make", "model", "price", "distance", SOURCE_ROW_COLUMN]
        );
        assert_eq!(df.column("id").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("price").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("distance").unwrap().dtype(), &DataType::Float64);

        let distance = df.column("distance").unwrap().f64().unwrap();
        assert_eq!(distance.get(0), Some(50000.0));
        assert_eq!(distance.get(1), None);

        // Worksheet rows: header is 1, the blank row 3 is gone.
        let sheet_rows = df.column(SOURCE_ROW_COLUMN).unwrap().i64().unwrap();
        assert_eq!(sheet_rows.get(0), Some(2));
        assert_eq!(sheet_rows.get(1), Some(4));
    }

    #[test]
    fn offsets_rows_by_header_position() {
        let rows = vec![
            vec![s("id"), s("price"), s("distance")],
            vec![s("a"), Data::Int(1), Data::Int(1)],
        ];
        let df = frame_from_sheet_rows(&rows, 3).unwrap();
        let sheet_rows = df.column(SOURCE_ROW_COLUMN).unwrap().i64().unwrap();
        assert_eq!(sheet_rows.get(0), Some(4));
    }

    #[test]
    fn accepts_original_export_headers() {
        // The listing export has no make or model column.
        let rows = vec![
            vec![
                s("Url"),
                s("Registreringsnummer"),
                s("Modellår"),
                s("Pris (kr)"),
                s("Mätarställning (km)"),
                s("Bränsle"),
                s("Biltyp"),
                s("Hästkrafter"),
            ],
            vec![
                s("http://test.se/1"),
                s("ABC123"),
                Data::Int(2020),
                Data::Int(200000),
                Data::Int(5000),
                s("Bensin"),
                s("Kombi"),
                Data::Int(150),
            ],
        ];
        let df = frame_from_rows(&rows).unwrap();
        assert_eq!(df.height(), 1);
        assert!(Column::Make.resolve(&df.get_column_names()).is_none());
    }

    #[test]
    fn accepts_swedish_make_and_model() {
        let rows = vec![
            vec![s("Url"), s("Märke"), s("Modell"), s("Pris (kr)"), s("Mätarställning (km)")],
            vec![s("http://test.se/1"), s("Volvo"), s("V70"), Data::Int(200000), Data::Int(5000)],
        ];
        let df = frame_from_rows(&rows).unwrap();
        assert_eq!(Column::Make.resolve(&df.get_column_names()), Some("märke"));
    }

    #[test]
    fn rejects_missing_columns() {
        let rows = vec![vec![s("id"), s("make"), s("model"), s("price")]];
        match frame_from_rows(&rows) {
            Err(EtlError::Format(msg)) => assert!(msg.contains("distance"), "{}", msg),
            other => panic!("expected format error, got {:?}", other),
        }
    }

    #[test]
    fn rejects_empty_sheet() {
        assert!(matches!(frame_from_rows(&[]), Err(EtlError::Format(_))));
    }

    #[test]
    fn missing_file_is_source_not_found() {
        let extractor = ExcelExtractor::new(SheetSelector::First);
        let err = extractor
            .read_sheet(Path::new("definitely/not/here.xlsx"))
            .unwrap_err();
        assert!(matches!(err, EtlError::SourceNotFound(_)));
    }

    #[test]
    fn picks_sheet_by_selector() {
        let names = vec!["Blad1".to_string(), "Blad2".to_string()];
        let by_index = ExcelExtractor::new(SheetSelector::Index(1));
        assert_eq!(by_index.pick_sheet(&names).unwrap(), "Blad2");

        let by_name = ExcelExtractor::new(SheetSelector::Name("Blad1".into()));
        assert_eq!(by_name.pick_sheet(&names).unwrap(), "Blad1");

        let missing = ExcelExtractor::new(SheetSelector::Index(5));
        assert!(matches!(missing.pick_sheet(&names), Err(EtlError::Format(_))));
    }
}
