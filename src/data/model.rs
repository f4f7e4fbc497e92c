use std::fmt;

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Column names (case-exact headers of the source files)
// ---------------------------------------------------------------------------

pub const START_TIME: &str = "Start Time";
pub const END_TIME: &str = "End Time";
pub const TRIP_DURATION: &str = "Trip Duration";
pub const START_STATION: &str = "Start Station";
pub const END_STATION: &str = "End Station";

/// Columns every city dataset must provide.
pub const MANDATORY_COLUMNS: [&str; 5] =
    [START_TIME, END_TIME, TRIP_DURATION, START_STATION, END_STATION];

/// Joins start and end station into a trip label.
pub const TRIP_SEPARATOR: &str = " to ";

// ---------------------------------------------------------------------------
// OptionalColumn / ColumnSet – which demographic columns a city has
// ---------------------------------------------------------------------------

/// Demographic columns only some cities publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionalColumn {
    UserType,
    Gender,
    BirthYear,
}

impl OptionalColumn {
    pub const ALL: [OptionalColumn; 3] = [
        OptionalColumn::UserType,
        OptionalColumn::Gender,
        OptionalColumn::BirthYear,
    ];

    pub fn header(self) -> &'static str {
        match self {
            OptionalColumn::UserType => "User Type",
            OptionalColumn::Gender => "Gender",
            OptionalColumn::BirthYear => "Birth Year",
        }
    }
}

impl fmt::Display for OptionalColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// Capability set recorded at load: which optional columns the source had.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ColumnSet {
    user_type: bool,
    gender: bool,
    birth_year: bool,
}

impl ColumnSet {
    /// Every optional column present.
    pub fn all() -> Self {
        Self {
            user_type: true,
            gender: true,
            birth_year: true,
        }
    }

    pub fn contains(&self, column: OptionalColumn) -> bool {
        match column {
            OptionalColumn::UserType => self.user_type,
            OptionalColumn::Gender => self.gender,
            OptionalColumn::BirthYear => self.birth_year,
        }
    }

    pub fn insert(&mut self, column: OptionalColumn) {
        match column {
            OptionalColumn::UserType => self.user_type = true,
            OptionalColumn::Gender => self.gender = true,
            OptionalColumn::BirthYear => self.birth_year = true,
        }
    }

    pub fn with(mut self, column: OptionalColumn) -> Self {
        self.insert(column);
        self
    }

    /// Present columns in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = OptionalColumn> + '_ {
        OptionalColumn::ALL
            .into_iter()
            .filter(|column| self.contains(*column))
    }
}

// ---------------------------------------------------------------------------
// Trip – one row of the base table
// ---------------------------------------------------------------------------

/// Source fields of one trip, as read from the data file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripFields {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    /// Seconds.
    pub duration: f64,
    /// `None` when the source cell is empty.
    pub start_station: Option<String>,
    pub end_station: Option<String>,
    pub user_type: Option<String>,
    pub gender: Option<String>,
    pub birth_year: Option<f64>,
}

/// Calendar facets and trip label computed from [`TripFields`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedColumns {
    /// 0 = Monday … 6 = Sunday.
    pub start_day: u32,
    pub end_day: u32,
    pub start_hour: u32,
    pub end_hour: u32,
    /// 1 = January … 12 = December.
    pub start_month: u32,
    /// Missing when either station is missing.
    pub trip_label: Option<String>,
}

impl DerivedColumns {
    pub fn derive(fields: &TripFields) -> Self {
        Self {
            start_day: fields.start_time.weekday().num_days_from_monday(),
            end_day: fields.end_time.weekday().num_days_from_monday(),
            start_hour: fields.start_time.hour(),
            end_hour: fields.end_time.hour(),
            start_month: fields.start_time.month(),
            trip_label: match (&fields.start_station, &fields.end_station) {
                (Some(start), Some(end)) => Some(format!("{start}{TRIP_SEPARATOR}{end}")),
                _ => None,
            },
        }
    }
}

/// A loaded trip. Derived columns are computed on construction and cannot be
/// edited independently of the source fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trip {
    #[serde(flatten)]
    fields: TripFields,
    #[serde(flatten)]
    derived: DerivedColumns,
}

impl Trip {
    pub fn new(fields: TripFields) -> Self {
        let derived = DerivedColumns::derive(&fields);
        Self { fields, derived }
    }

    pub fn fields(&self) -> &TripFields {
        &self.fields
    }

    pub fn derived(&self) -> &DerivedColumns {
        &self.derived
    }
}

// ---------------------------------------------------------------------------
// TripTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The base table for one city. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct TripTable {
    trips: Vec<Trip>,
    columns: ColumnSet,
}

impl TripTable {
    pub fn new(trips: Vec<Trip>, columns: ColumnSet) -> Self {
        Self { trips, columns }
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    /// Optional columns this dataset provides.
    pub fn columns(&self) -> ColumnSet {
        self.columns
    }

    /// Number of trips.
    pub fn len(&self) -> usize {
        self.trips.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn sample_fields() -> TripFields {
        TripFields {
            // 2017-01-01 was a Sunday.
            start_time: at("2017-01-01 23:50:00"),
            end_time: at("2017-01-02 00:10:00"),
            duration: 1200.0,
            start_station: Some("Canal St".to_string()),
            end_station: Some("Clark St".to_string()),
            user_type: None,
            gender: None,
            birth_year: None,
        }
    }

    #[test]
    fn derives_calendar_facets_from_timestamps() {
        let trip = Trip::new(sample_fields());
        let derived = trip.derived();
        assert_eq!(derived.start_day, 6);
        assert_eq!(derived.end_day, 0);
        assert_eq!(derived.start_hour, 23);
        assert_eq!(derived.end_hour, 0);
        assert_eq!(derived.start_month, 1);
        assert_eq!(derived.trip_label.as_deref(), Some("Canal St to Clark St"));
    }

    #[test]
    fn missing_station_leaves_trip_label_unset() {
        let mut fields = sample_fields();
        fields.end_station = None;
        assert_eq!(Trip::new(fields).derived().trip_label, None);
    }

    #[test]
    fn rederiving_reproduces_stored_columns() {
        let trip = Trip::new(sample_fields());
        assert_eq!(&DerivedColumns::derive(trip.fields()), trip.derived());
    }

    #[test]
    fn column_set_iterates_present_columns_in_order() {
        let set = ColumnSet::default()
            .with(OptionalColumn::BirthYear)
            .with(OptionalColumn::UserType);
        let present: Vec<_> = set.iter().collect();
        assert_eq!(present, vec![OptionalColumn::UserType, OptionalColumn::BirthYear]);
        assert!(!set.contains(OptionalColumn::Gender));
        assert_eq!(ColumnSet::all().iter().count(), 3);
    }
}
