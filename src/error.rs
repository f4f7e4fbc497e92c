use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while loading, filtering or querying a city.
///
/// Absent optional columns are deliberately not represented here: they are a
/// normal outcome and surface as [`crate::stats::ColumnStat::Absent`].
#[derive(Debug, Error)]
pub enum CityError {
    #[error("{city} does not have a corresponding data file ({})", .path.display())]
    DatasetNotFound { city: String, path: PathBuf },

    #[error("row {row}: column '{column}' has unparseable timestamp '{value}'")]
    MalformedTimestamp {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: column '{column}' has unparseable number '{value}'")]
    MalformedNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("data file is missing required column '{0}'")]
    MissingColumn(String),

    #[error("column '{column}' has unsupported type {data_type}")]
    UnsupportedColumnType { column: String, data_type: String },

    #[error(
        "'{token}' is not a valid filter input (expected 'all' or whole numbers from {lower} to {})",
        .upper - 1
    )]
    InvalidFilterInput { token: String, lower: u32, upper: u32 },

    #[error("no filter has been applied yet")]
    NoActiveFilter,

    #[error("no trips match the current filter")]
    EmptyView,

    /// The view has trips, but none of them records a value for the column.
    #[error("no {column} recorded for the trips matching the current filter")]
    NoRecordedValues { column: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

impl CityError {
    /// Whether the caller can fix the input and try again without reloading.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CityError::DatasetNotFound { .. }
                | CityError::InvalidFilterInput { .. }
                | CityError::EmptyView
                | CityError::NoRecordedValues { .. }
        )
    }
}

pub type Result<T, E = CityError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_error_reports_inclusive_upper_bound() {
        let err = CityError::InvalidFilterInput {
            token: "7".to_string(),
            lower: 1,
            upper: 7,
        };
        assert_eq!(
            err.to_string(),
            "'7' is not a valid filter input (expected 'all' or whole numbers from 1 to 6)"
        );
    }

    #[test]
    fn unrecorded_values_do_not_claim_an_empty_view() {
        let err = CityError::NoRecordedValues {
            column: "Birth Year".into(),
        };
        assert_eq!(
            err.to_string(),
            "no Birth Year recorded for the trips matching the current filter"
        );
    }

    #[test]
    fn retryable_classification() {
        assert!(CityError::EmptyView.is_retryable());
        assert!(CityError::DatasetNotFound {
            city: "atlantis".into(),
            path: PathBuf::from("data/atlantis.csv"),
        }
        .is_retryable());
        assert!(CityError::NoRecordedValues {
            column: "Birth Year".into()
        }
        .is_retryable());
        assert!(!CityError::NoActiveFilter.is_retryable());
        assert!(!CityError::MissingColumn("Start Time".into()).is_retryable());
    }
}
