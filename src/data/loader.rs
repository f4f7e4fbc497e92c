use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int32Type, Int64Type, TimeUnit,
    TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType,
    TimestampSecondType,
};
use chrono::NaiveDateTime;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ProjectionMask;

use super::model::{
    ColumnSet, OptionalColumn, Trip, TripFields, TripTable, END_STATION, END_TIME,
    START_STATION, START_TIME, TRIP_DURATION,
};
use super::source::DatasetDescriptor;
use crate::config::SourceFormat;
use crate::error::{CityError, Result};

/// Timestamp layout of the `Start Time` / `End Time` columns.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const TIMESTAMP_FORMAT_FRACTIONAL: &str = "%Y-%m-%d %H:%M:%S%.f";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the base table for a city.
///
/// The header (or Parquet schema) is read first to find which optional
/// columns exist; only mandatory and present optional columns are read.
/// Any row that fails to parse aborts the whole load.
pub fn load(descriptor: &DatasetDescriptor) -> Result<TripTable> {
    if !descriptor.exists() {
        return Err(CityError::DatasetNotFound {
            city: descriptor.city().to_string(),
            path: descriptor.path().to_path_buf(),
        });
    }

    log::info!("Loading {} from {}", descriptor.city(), descriptor.path().display());
    let table = match descriptor.format() {
        SourceFormat::Csv => load_csv(descriptor.path())?,
        SourceFormat::Parquet => load_parquet(descriptor.path())?,
    };
    log::info!(
        "Loaded {} trips for {} (optional columns: {:?})",
        table.len(),
        descriptor.city(),
        table.columns().iter().collect::<Vec<_>>()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Column layout: where each loaded column sits in the source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnLayout {
    start_time: usize,
    end_time: usize,
    duration: usize,
    start_station: usize,
    end_station: usize,
    user_type: Option<usize>,
    gender: Option<usize>,
    birth_year: Option<usize>,
}

impl ColumnLayout {
    fn from_headers<'a>(headers: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let headers: Vec<&str> = headers.into_iter().collect();
        let position = |name: &str| headers.iter().position(|h| *h == name);
        let required = |name: &str| {
            position(name).ok_or_else(|| CityError::MissingColumn(name.to_string()))
        };

        Ok(Self {
            start_time: required(START_TIME)?,
            end_time: required(END_TIME)?,
            duration: required(TRIP_DURATION)?,
            start_station: required(START_STATION)?,
            end_station: required(END_STATION)?,
            user_type: position(OptionalColumn::UserType.header()),
            gender: position(OptionalColumn::Gender.header()),
            birth_year: position(OptionalColumn::BirthYear.header()),
        })
    }

    fn columns(&self) -> ColumnSet {
        let mut set = ColumnSet::default();
        for (column, index) in [
            (OptionalColumn::UserType, self.user_type),
            (OptionalColumn::Gender, self.gender),
            (OptionalColumn::BirthYear, self.birth_year),
        ] {
            if index.is_some() {
                set.insert(column);
            }
        }
        set
    }

    /// Source indices of every column that gets loaded.
    fn indices(&self) -> Vec<usize> {
        let mut indices = vec![
            self.start_time,
            self.end_time,
            self.duration,
            self.start_station,
            self.end_station,
        ];
        indices.extend([self.user_type, self.gender, self.birth_year].into_iter().flatten());
        indices
    }
}

// ---------------------------------------------------------------------------
// Cell parsing shared by both formats
// ---------------------------------------------------------------------------

pub(crate) fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT_FRACTIONAL))
        .ok()
}

fn timestamp_cell(value: &str, row: usize, column: &str) -> Result<NaiveDateTime> {
    parse_timestamp(value).ok_or_else(|| CityError::MalformedTimestamp {
        row,
        column: column.to_string(),
        value: value.to_string(),
    })
}

fn malformed_number(value: &str, row: usize, column: &str) -> CityError {
    CityError::MalformedNumber {
        row,
        column: column.to_string(),
        value: value.to_string(),
    }
}

fn duration_cell(value: &str, row: usize) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| malformed_number(value, row, TRIP_DURATION))
}

/// Empty or NaN birth years are missing values, not errors.
fn birth_year_cell(value: &str, row: usize) -> Result<Option<f64>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let year = trimmed
        .parse::<f64>()
        .map_err(|_| malformed_number(value, row, OptionalColumn::BirthYear.header()))?;
    Ok(Some(year).filter(|y| y.is_finite()))
}

fn text_cell(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<TripTable> {
    let mut reader = csv::Reader::from_path(path)?;
    let layout = ColumnLayout::from_headers(reader.headers()?.iter())?;
    log::debug!("CSV column layout: {layout:?}");

    let mut trips = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        let row = row_no + 1;
        let cell = |idx: usize| record.get(idx).unwrap_or("");
        let optional = |idx: Option<usize>| idx.and_then(|i| text_cell(cell(i)));

        let birth_year = match layout.birth_year {
            Some(idx) => birth_year_cell(cell(idx), row)?,
            None => None,
        };

        trips.push(Trip::new(TripFields {
            start_time: timestamp_cell(cell(layout.start_time), row, START_TIME)?,
            end_time: timestamp_cell(cell(layout.end_time), row, END_TIME)?,
            duration: duration_cell(cell(layout.duration), row)?,
            start_station: text_cell(cell(layout.start_station)),
            end_station: text_cell(cell(layout.end_station)),
            user_type: optional(layout.user_type),
            gender: optional(layout.gender),
            birth_year,
        }));
    }

    Ok(TripTable::new(trips, layout.columns()))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with the same column names as the CSV layout.
///
/// Timestamps may be stored as strings or as Arrow timestamps; numeric
/// columns may be integers or floats (or numeric strings).
fn load_parquet(path: &Path) -> Result<TripTable> {
    let file = std::fs::File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let layout = ColumnLayout::from_headers(
        builder.schema().fields().iter().map(|f| f.name().as_str()),
    )?;
    let columns = layout.columns();
    let mask = ProjectionMask::roots(builder.parquet_schema(), layout.indices());
    let reader = builder.with_projection(mask).build()?;

    let mut trips = Vec::new();
    let mut offset = 0;
    for batch_result in reader {
        let batch = batch_result?;
        let schema = batch.schema();
        // Indices shift after projection.
        let layout =
            ColumnLayout::from_headers(schema.fields().iter().map(|f| f.name().as_str()))?;

        for idx in 0..batch.num_rows() {
            let row = offset + idx + 1;
            let col = |i: usize| batch.column(i);

            let birth_year = match layout.birth_year {
                Some(i) => arrow_number(col(i), idx, row, OptionalColumn::BirthYear.header())?
                    .filter(|y| y.is_finite()),
                None => None,
            };
            let duration = arrow_number(col(layout.duration), idx, row, TRIP_DURATION)?
                .filter(|d| d.is_finite())
                .ok_or_else(|| malformed_number("<null>", row, TRIP_DURATION))?;

            trips.push(Trip::new(TripFields {
                start_time: arrow_timestamp(col(layout.start_time), idx, row, START_TIME)?,
                end_time: arrow_timestamp(col(layout.end_time), idx, row, END_TIME)?,
                duration,
                start_station: arrow_text(col(layout.start_station), idx, START_STATION)?,
                end_station: arrow_text(col(layout.end_station), idx, END_STATION)?,
                user_type: optional_text(&batch, layout.user_type, idx, OptionalColumn::UserType)?,
                gender: optional_text(&batch, layout.gender, idx, OptionalColumn::Gender)?,
                birth_year,
            }));
        }
        offset += batch.num_rows();
    }

    Ok(TripTable::new(trips, columns))
}

// -- Arrow helpers --

fn unsupported(col: &ArrayRef, column: &str) -> CityError {
    CityError::UnsupportedColumnType {
        column: column.to_string(),
        data_type: col.data_type().to_string(),
    }
}

fn arrow_str<'a>(col: &'a ArrayRef, idx: usize) -> Option<&'a str> {
    match col.data_type() {
        DataType::Utf8 => Some(col.as_string::<i32>().value(idx)),
        DataType::LargeUtf8 => Some(col.as_string::<i64>().value(idx)),
        _ => None,
    }
}

fn arrow_text(col: &ArrayRef, idx: usize, column: &str) -> Result<Option<String>> {
    if col.is_null(idx) {
        return Ok(None);
    }
    let value = arrow_str(col, idx).ok_or_else(|| unsupported(col, column))?;
    Ok(text_cell(value))
}

fn optional_text(
    batch: &arrow::record_batch::RecordBatch,
    index: Option<usize>,
    idx: usize,
    column: OptionalColumn,
) -> Result<Option<String>> {
    match index {
        Some(i) => arrow_text(batch.column(i), idx, column.header()),
        None => Ok(None),
    }
}

fn arrow_timestamp(
    col: &ArrayRef,
    idx: usize,
    row: usize,
    column: &str,
) -> Result<NaiveDateTime> {
    if col.is_null(idx) {
        return timestamp_cell("", row, column);
    }
    let parsed = match col.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 => {
            let value = arrow_str(col, idx).unwrap_or_default();
            return timestamp_cell(value, row, column);
        }
        DataType::Timestamp(TimeUnit::Second, _) => {
            col.as_primitive::<TimestampSecondType>().value_as_datetime(idx)
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            col.as_primitive::<TimestampMillisecondType>().value_as_datetime(idx)
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            col.as_primitive::<TimestampMicrosecondType>().value_as_datetime(idx)
        }
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            col.as_primitive::<TimestampNanosecondType>().value_as_datetime(idx)
        }
        _ => return Err(unsupported(col, column)),
    };
    parsed.ok_or_else(|| CityError::MalformedTimestamp {
        row,
        column: column.to_string(),
        value: "<out of range>".to_string(),
    })
}

fn arrow_number(col: &ArrayRef, idx: usize, row: usize, column: &str) -> Result<Option<f64>> {
    if col.is_null(idx) {
        return Ok(None);
    }
    let value = match col.data_type() {
        DataType::Int32 => col.as_primitive::<Int32Type>().value(idx) as f64,
        DataType::Int64 => col.as_primitive::<Int64Type>().value(idx) as f64,
        DataType::Float32 => col.as_primitive::<Float32Type>().value(idx) as f64,
        DataType::Float64 => col.as_primitive::<Float64Type>().value(idx),
        DataType::Utf8 | DataType::LargeUtf8 => {
            let text = arrow_str(col, idx).unwrap_or_default();
            if text.trim().is_empty() {
                return Ok(None);
            }
            text.trim()
                .parse::<f64>()
                .map_err(|_| malformed_number(text, row, column))?
        }
        _ => return Err(unsupported(col, column)),
    };
    Ok(Some(value))
}
