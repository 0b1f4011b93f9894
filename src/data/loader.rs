use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::{can_cast_types, cast};
use arrow::datatypes::{DataType, Field, Float32Type, Float64Type, Int32Type, Int64Type};
use csv::{ReaderBuilder, StringRecord, Trim};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{parse_year, CellValue, RawRecord, RawTable};
use crate::error::{PipelineError, Result};

pub const COUNTRY_NAME: &str = "Country Name";
pub const COUNTRY_CODE: &str = "Country Code";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a wide table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` – delimited text, one column per year
/// * `.parquet`      – the same layout written with `df.to_parquet()`
pub fn load_file(path: &Path, delimiter: u8) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" | "txt" => load_csv(path, delimiter),
        "parquet" | "pq" => load_parquet(path),
        other => Err(PipelineError::UnsupportedFormat(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row `Country Name, Country Code, [metadata...], 1960, 1961, ...`.
/// Year cells may be empty.
fn load_csv(path: &Path, delimiter: u8) -> Result<RawTable> {
    let file = File::open(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let csv_err = |source| PipelineError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::Headers)
        .from_reader(BufReader::new(file));

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    let layout = ColumnLayout::from_headers(&headers)?;

    let mut records = Vec::new();
    let mut row = StringRecord::new();
    while reader.read_record(&mut row).map_err(csv_err)? {
        records.push(layout.record(|idx| CellValue::from_text(row.get(idx).unwrap_or(""))));
    }

    log::debug!(
        "Read {} rows with {} year columns from {}",
        records.len(),
        layout.years.len(),
        path.display()
    );
    Ok(layout.into_table(headers, records))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with the same wide layout as the CSV.
///
/// String columns become text cells, numeric columns numeric cells and
/// nulls empty cells. Narrow integers, unsigned and decimal columns are
/// widened to `Float64`; dictionary and view strings are read as `Utf8`.
/// Works with files written by both **Pandas** and **Polars**.
fn load_parquet(path: &Path) -> Result<RawTable> {
    let file = File::open(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let pq_err = |source| PipelineError::Parquet {
        path: path.to_path_buf(),
        source,
    };
    let arrow_err = |source| PipelineError::Arrow {
        path: path.to_path_buf(),
        source,
    };

    let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(pq_err)?;

    // The schema is validated even when the file holds no rows.
    let schema = builder.schema().clone();
    let headers: Vec<String> = schema
        .fields()
        .iter()
        .map(|f| f.name().trim().to_string())
        .collect();
    let layout = ColumnLayout::from_headers(&headers)?;
    let targets = schema
        .fields()
        .iter()
        .map(|f| cast_target(f))
        .collect::<Result<Vec<_>>>()?;

    let reader = builder.build().map_err(pq_err)?;
    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.map_err(arrow_err)?;
        let columns = batch
            .columns()
            .iter()
            .zip(&targets)
            .map(|(col, target)| match target {
                Some(dt) => cast(col, dt),
                None => Ok(col.clone()),
            })
            .collect::<std::result::Result<Vec<ArrayRef>, _>>()
            .map_err(arrow_err)?;

        for row in 0..batch.num_rows() {
            records.push(layout.record(|idx| extract_cell(&columns[idx], row)));
        }
    }

    log::debug!(
        "Read {} rows with {} year columns from {}",
        records.len(),
        layout.years.len(),
        path.display()
    );
    Ok(layout.into_table(headers, records))
}

/// Type a column must be cast to before `extract_cell` can read it, or
/// `None` if it is read as stored.
fn cast_target(field: &Field) -> Result<Option<DataType>> {
    match field.data_type() {
        DataType::Null
        | DataType::Utf8
        | DataType::LargeUtf8
        | DataType::Int32
        | DataType::Int64
        | DataType::Float32
        | DataType::Float64 => Ok(None),
        dt if dt.is_numeric() => Ok(Some(DataType::Float64)),
        dt if can_cast_types(dt, &DataType::Utf8) => Ok(Some(DataType::Utf8)),
        other => Err(PipelineError::UnsupportedColumnType {
            column: field.name().clone(),
            data_type: other.to_string(),
        }),
    }
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Empty;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::from_text(col.as_string::<i32>().value(row)),
        DataType::LargeUtf8 => CellValue::from_text(col.as_string::<i64>().value(row)),
        DataType::Int32 => CellValue::Number(col.as_primitive::<Int32Type>().value(row) as f64),
        DataType::Int64 => CellValue::Number(col.as_primitive::<Int64Type>().value(row) as f64),
        DataType::Float32 => CellValue::Number(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => CellValue::Number(col.as_primitive::<Float64Type>().value(row)),
        // `DataType::Null`; everything else was cast by `cast_target`.
        _ => CellValue::Empty,
    }
}

// ---------------------------------------------------------------------------
// Column layout shared by both loaders
// ---------------------------------------------------------------------------

/// Positions of the key, metadata and year columns within a header.
struct ColumnLayout {
    code: usize,
    name: Option<usize>,
    metadata: Vec<(usize, String)>,
    years: Vec<(usize, String)>,
}

impl ColumnLayout {
    fn from_headers(headers: &[String]) -> Result<Self> {
        let code = headers
            .iter()
            .position(|h| h == COUNTRY_CODE)
            .ok_or_else(|| PipelineError::MissingColumn {
                column: COUNTRY_CODE.to_string(),
            })?;
        let name = headers.iter().position(|h| h == COUNTRY_NAME);

        let mut metadata = Vec::new();
        let mut years = Vec::new();
        let mut seen_years = HashSet::new();
        for (idx, header) in headers.iter().enumerate() {
            if idx == code || Some(idx) == name {
                continue;
            }
            if let Some(year) = parse_year(header) {
                // Cells are keyed by header, so a second `2010` would shadow the first.
                if !seen_years.insert(year) {
                    return Err(PipelineError::DuplicateColumn {
                        column: header.clone(),
                    });
                }
                years.push((idx, header.clone()));
            } else {
                metadata.push((idx, header.clone()));
            }
        }

        Ok(Self {
            code,
            name,
            metadata,
            years,
        })
    }

    /// Build one record, reading each column through `cell`.
    fn record(&self, cell: impl Fn(usize) -> CellValue) -> RawRecord {
        let country_code = cell(self.code).to_string();
        let country_name = match self.name {
            Some(idx) => cell(idx).to_string(),
            None => country_code.clone(),
        };
        let metadata = self
            .metadata
            .iter()
            .map(|(idx, header)| (header.clone(), cell(*idx).to_string()))
            .collect();
        let cells: BTreeMap<String, CellValue> = self
            .years
            .iter()
            .map(|(idx, header)| (header.clone(), cell(*idx)))
            .collect();

        RawRecord {
            country_name,
            country_code,
            metadata,
            cells,
        }
    }

    fn into_table(self, columns: Vec<String>, records: Vec<RawRecord>) -> RawTable {
        RawTable {
            columns,
            year_columns: self.years.into_iter().map(|(_, h)| h).collect(),
            records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::data::model::YearRange;
    use crate::data::reshape::melt;
    use arrow::array::{
        DictionaryArray, Float64Array, Int16Array, Int64Array, StringArray, UInt8Array,
    };
    use arrow::datatypes::Schema;
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    fn create_test_csv(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_load_csv_world_bank_layout() {
        let tmp = create_test_csv(
            "\
Country Name,Country Code,Indicator Name,Indicator Code,2010,2011
France,FRA,Gross capital formation,NE.GDI.TOTL.CD,2646,
Germany,DEU,Gross capital formation,NE.GDI.TOTL.CD,3400,3500",
        );
        let table = load_file(tmp.path(), b',').unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.year_columns, vec!["2010", "2011"]);
        let fra = &table.records[0];
        assert_eq!(fra.country_name, "France");
        assert_eq!(fra.country_code, "FRA");
        assert_eq!(fra.metadata["Indicator Code"], "NE.GDI.TOTL.CD");
        assert_eq!(fra.cells["2010"], CellValue::Text("2646".into()));
        assert_eq!(fra.cells["2011"], CellValue::Empty);
    }

    #[test]
    fn test_load_csv_custom_delimiter_and_bom() {
        let tmp = create_test_csv("\u{feff}Country Code;2010\nFRA;1,5");
        let table = load_file(tmp.path(), b';').unwrap();
        assert_eq!(table.columns[0], "Country Code");
        assert_eq!(table.records[0].country_name, "FRA");
        assert_eq!(table.records[0].cells["2010"], CellValue::Text("1,5".into()));
    }

    #[test]
    fn test_load_csv_header_only() {
        let tmp = create_test_csv("Country Name,Country Code,2010");
        let table = load_file(tmp.path(), b',').unwrap();
        assert!(table.is_empty());
        assert_eq!(table.year_columns, vec!["2010"]);
    }

    #[test]
    fn test_missing_country_code_is_parse_error() {
        let tmp = create_test_csv("Country Name,2010\nFrance,2646");
        let err = load_file(tmp.path(), b',').unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("Country Code"));
    }

    #[test]
    fn test_ragged_row_is_parse_error() {
        let tmp = create_test_csv("Country Code,2010,2011\nFRA,1,2,3");
        let err = load_file(tmp.path(), b',').unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_missing_file_is_file_error() {
        let err = load_file(Path::new("/definitely/not/here.csv"), b',').unwrap_err();
        assert_eq!(err.kind(), ErrorKind::File);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_file(Path::new("data.xlsx"), b',').unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat(ref e) if e == "xlsx"));
    }

    fn write_parquet(schema: Arc<Schema>, batch: Option<RecordBatch>) -> NamedTempFile {
        let tmp = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(tmp.reopen().unwrap(), schema, None).unwrap();
        if let Some(batch) = batch {
            writer.write(&batch).unwrap();
        }
        writer.close().unwrap();
        tmp
    }

    #[test]
    fn test_duplicate_year_header_is_parse_error() {
        let tmp = create_test_csv("Country Code,2010,2010\nFRA,1,999");
        let err = load_file(tmp.path(), b',').unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(matches!(err, PipelineError::DuplicateColumn { ref column } if column == "2010"));

        // Same year spelled differently is still the same column.
        let tmp = create_test_csv("Country Code,2010, 2010\nFRA,1,999");
        assert!(load_file(tmp.path(), b',').is_err());
    }

    #[test]
    fn test_load_parquet_wide_table() {
        let schema = Arc::new(Schema::new(vec![
            Field::new(COUNTRY_NAME, DataType::Utf8, false),
            Field::new(COUNTRY_CODE, DataType::Utf8, false),
            Field::new("2010", DataType::Float64, true),
            Field::new("2011", DataType::Int64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["France", "Germany"])),
                Arc::new(StringArray::from(vec!["FRA", "DEU"])),
                Arc::new(Float64Array::from(vec![Some(2646.0), None])),
                Arc::new(Int64Array::from(vec![Some(2630), Some(3500)])),
            ],
        )
        .unwrap();

        let tmp = write_parquet(schema, Some(batch));

        let table = load_file(tmp.path(), b',').unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0].cells["2010"], CellValue::Number(2646.0));
        assert_eq!(table.records[1].cells["2010"], CellValue::Empty);
        assert_eq!(table.records[1].cells["2011"], CellValue::Number(3500.0));
    }

    #[test]
    fn test_load_parquet_without_rows_keeps_schema() {
        let schema = Arc::new(Schema::new(vec![
            Field::new(COUNTRY_CODE, DataType::Utf8, false),
            Field::new("2010", DataType::Float64, true),
        ]));
        let tmp = write_parquet(schema, None);

        let table = load_file(tmp.path(), b',').unwrap();
        assert!(table.is_empty());
        assert_eq!(table.year_columns, vec!["2010"]);
        let ds = melt(&table, YearRange::new(2010, 2010).unwrap()).unwrap();
        assert!(ds.is_empty());
    }

    #[test]
    fn test_parquet_without_country_code_is_parse_error_even_when_empty() {
        let schema = Arc::new(Schema::new(vec![
            Field::new(COUNTRY_NAME, DataType::Utf8, false),
            Field::new("2010", DataType::Float64, true),
        ]));
        let tmp = write_parquet(schema, None);

        let err = load_file(tmp.path(), b',').unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(matches!(err, PipelineError::MissingColumn { ref column } if column == COUNTRY_CODE));
    }

    #[test]
    fn test_parquet_narrow_and_categorical_columns() {
        let schema = Arc::new(Schema::new(vec![
            Field::new(
                COUNTRY_CODE,
                DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8)),
                false,
            ),
            Field::new("2010", DataType::Int16, true),
            Field::new("2011", DataType::UInt8, true),
        ]));
        let codes: DictionaryArray<Int32Type> = vec!["FRA", "DEU", "FRA"].into_iter().collect();
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(codes),
                Arc::new(Int16Array::from(vec![Some(5), None, Some(-3)])),
                Arc::new(UInt8Array::from(vec![Some(7), Some(8), Some(9)])),
            ],
        )
        .unwrap();
        let tmp = write_parquet(schema, Some(batch));

        let table = load_file(tmp.path(), b',').unwrap();
        let codes: Vec<&str> = table.records.iter().map(|r| r.country_code.as_str()).collect();
        assert_eq!(codes, vec!["FRA", "DEU", "FRA"]);
        assert_eq!(table.records[0].cells["2010"], CellValue::Number(5.0));
        assert_eq!(table.records[1].cells["2010"], CellValue::Empty);
        assert_eq!(table.records[2].cells["2010"], CellValue::Number(-3.0));
        assert_eq!(table.records[1].cells["2011"], CellValue::Number(8.0));
    }
}
