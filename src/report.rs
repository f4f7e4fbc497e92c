//! Structured statistics for one filtered view, and their console rendering.

use std::fmt::Write as _;

use serde::Serialize;

use crate::data::filter::{day_name, month_name};
use crate::data::model::OptionalColumn;
use crate::error::{CityError, Result};
use crate::stats::{BirthYearStats, ColumnStat, ValueCounts};

/// One block of a [`CityReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Section<T> {
    Ready(T),
    /// The filter matched no rows.
    Empty,
    /// The filter matched rows, but none records this column.
    Unrecorded(String),
    Absent(OptionalColumn),
}

impl<T> Section<T> {
    /// Folds [`CityError::EmptyView`] and [`CityError::NoRecordedValues`] into
    /// sections; other errors pass through.
    pub fn from_result(result: Result<T>) -> Result<Self> {
        match result {
            Ok(value) => Ok(Section::Ready(value)),
            Err(CityError::EmptyView) => Ok(Section::Empty),
            Err(CityError::NoRecordedValues { column }) => Ok(Section::Unrecorded(column)),
            Err(e) => Err(e),
        }
    }

    pub fn from_column(result: Result<ColumnStat<T>>) -> Result<Self> {
        Ok(match Section::from_result(result)? {
            Section::Ready(ColumnStat::Available(value)) => Section::Ready(value),
            Section::Ready(ColumnStat::Absent(column)) | Section::Absent(column) => {
                Section::Absent(column)
            }
            Section::Empty => Section::Empty,
            Section::Unrecorded(column) => Section::Unrecorded(column),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopularTimes {
    pub month: u32,
    pub day: u32,
    pub hour: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopularStations {
    pub start: String,
    pub end: String,
    pub trip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripDurations {
    pub total_days: f64,
    pub mean_minutes: f64,
}

/// Every statistic for a city's active filtered view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityReport {
    pub city: String,
    pub filter: String,
    pub trip_count: usize,
    pub popular_times: Section<PopularTimes>,
    pub popular_stations: Section<PopularStations>,
    pub durations: Section<TripDurations>,
    pub user_types: Section<ValueCounts<String>>,
    pub genders: Section<ValueCounts<String>>,
    pub birth_years: Section<BirthYearStats>,
}

// ---------------------------------------------------------------------------
// Text rendering
// ---------------------------------------------------------------------------

const NO_DATA: &str = "no data for this selection";

fn section_line<T>(
    out: &mut String,
    heading: &str,
    section: &Section<T>,
    body: impl Fn(&T) -> String,
) {
    let text = match section {
        Section::Ready(value) => body(value),
        Section::Empty => format!("  {NO_DATA}\n"),
        Section::Unrecorded(column) => format!("  no {column} recorded for this selection\n"),
        Section::Absent(column) => format!("  {column} is not available for this city\n"),
    };
    let _ = write!(out, "\n{heading}\n{text}");
}

fn counts_body(counts: &ValueCounts<String>) -> String {
    counts
        .entries()
        .iter()
        .map(|(value, count)| format!("  {value}: {count}\n"))
        .collect()
}

/// Render a report for the console.
pub fn render(report: &CityReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} bikeshare statistics ({}): {} trips",
        report.city, report.filter, report.trip_count
    );

    section_line(&mut out, "Popular times of travel", &report.popular_times, |t| {
        format!(
            "  Most common month: {}\n  Most common day: {}\n  Most common start hour: {:02}:00\n",
            month_name(t.month).unwrap_or("?"),
            day_name(t.day).unwrap_or("?"),
            t.hour
        )
    });
    section_line(&mut out, "Popular stations and trip", &report.popular_stations, |s| {
        format!(
            "  Most common start station: {}\n  Most common end station: {}\n  \
             Most common trip: {}\n",
            s.start, s.end, s.trip
        )
    });
    section_line(&mut out, "Trip duration", &report.durations, |d| {
        format!(
            "  Total travel time: {:.2} days\n  Mean travel time: {:.2} minutes\n",
            d.total_days, d.mean_minutes
        )
    });
    section_line(&mut out, "User types", &report.user_types, counts_body);
    section_line(&mut out, "Gender", &report.genders, counts_body);
    section_line(&mut out, "Birth year", &report.birth_years, |b| {
        format!(
            "  Earliest: {}\n  Most recent: {}\n  Most common: {}\n",
            b.earliest, b.latest, b.most_common
        )
    });
    out
}
