use std::ops::Range;

use serde::Serialize;

use super::model::{Trip, TripTable};
use crate::error::{CityError, Result};

/// Months covered by the published datasets (January to June).
pub const MONTH_RANGE: Range<u32> = 1..7;
/// Weekdays, 0 = Monday.
pub const DAY_RANGE: Range<u32> = 0..7;

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];
const DAY_NAMES: [&str; 7] = [
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
];

/// English name of a month number (1-based).
pub fn month_name(month: u32) -> Option<&'static str> {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_NAMES.get(i as usize))
        .copied()
}

/// English name of a weekday number (0 = Monday).
pub fn day_name(day: u32) -> Option<&'static str> {
    DAY_NAMES.get(day as usize).copied()
}

// ---------------------------------------------------------------------------
// Token grammar
// ---------------------------------------------------------------------------

/// Parse a filter input against the half-open range `[lower, upper)`.
///
/// `all` (any case) selects the full range. Otherwise every whitespace
/// separated token must be an integer inside the range; the first bad token
/// rejects the whole input. Duplicates are kept as given.
pub fn parse_range(input: &str, lower: u32, upper: u32) -> Result<Vec<u32>> {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("all") {
        return Ok((lower..upper).collect());
    }

    let invalid = |token: &str| CityError::InvalidFilterInput {
        token: token.to_string(),
        lower,
        upper,
    };

    if trimmed.is_empty() {
        return Err(invalid(trimmed));
    }

    trimmed
        .split_whitespace()
        .map(|token| {
            token
                .parse::<i64>()
                .ok()
                .filter(|v| (i64::from(lower)..i64::from(upper)).contains(v))
                .map(|v| v as u32)
                .ok_or_else(|| invalid(token))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Filter specification
// ---------------------------------------------------------------------------

/// One axis of a filter: everything in range, or an explicit subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    All,
    Only(Vec<u32>),
}

impl Selection {
    pub fn parse(input: &str, range: Range<u32>) -> Result<Self> {
        let values = parse_range(input, range.start, range.end)?;
        if input.trim().eq_ignore_ascii_case("all") {
            Ok(Selection::All)
        } else {
            Ok(Selection::Only(values))
        }
    }

    /// Membership mask indexed by value.
    fn mask(&self, range: Range<u32>) -> Vec<bool> {
        let mut mask = vec![false; range.end as usize];
        let values: Vec<u32> = match self {
            Selection::All => range.collect(),
            Selection::Only(values) => values.clone(),
        };
        for v in values {
            if let Some(slot) = mask.get_mut(v as usize) {
                *slot = true;
            }
        }
        mask
    }

    fn describe(&self, all_label: &str, name: fn(u32) -> Option<&'static str>) -> String {
        match self {
            Selection::All => all_label.to_string(),
            Selection::Only(values) => {
                let mut seen = Vec::new();
                for &v in values {
                    if !seen.contains(&v) {
                        seen.push(v);
                    }
                }
                seen.iter()
                    .filter_map(|&v| name(v))
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }
    }
}

/// Months and weekdays a filtered view keeps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterSpec {
    pub months: Selection,
    pub days: Selection,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            months: Selection::All,
            days: Selection::All,
        }
    }
}

impl FilterSpec {
    /// Parse raw month and day inputs; both must be valid.
    pub fn parse(months: &str, days: &str) -> Result<Self> {
        Ok(Self {
            months: Selection::parse(months, MONTH_RANGE)?,
            days: Selection::parse(days, DAY_RANGE)?,
        })
    }

    /// Human-readable summary, e.g. `months: January, March; days: all days`.
    pub fn describe(&self) -> String {
        format!(
            "months: {}; days: {}",
            self.months.describe("all months", month_name),
            self.days.describe("all days", day_name)
        )
    }
}

// ---------------------------------------------------------------------------
// Filtered view
// ---------------------------------------------------------------------------

/// Rows of the base table matching a [`FilterSpec`], in table order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilteredView {
    spec: FilterSpec,
    description: String,
    rows: Vec<usize>,
}

impl FilteredView {
    pub fn build(table: &TripTable, spec: FilterSpec) -> Self {
        let rows = filtered_indices(table, &spec);
        let description = spec.describe();
        Self {
            spec,
            description,
            rows,
        }
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Base-table indices of the matching trips.
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Matching trips, in table order.
    pub fn trips<'a>(&'a self, table: &'a TripTable) -> impl Iterator<Item = &'a Trip> + 'a {
        self.rows.iter().map(move |&i| &table.trips()[i])
    }
}

/// Return indices of trips whose start month AND start weekday are selected.
pub fn filtered_indices(table: &TripTable, spec: &FilterSpec) -> Vec<usize> {
    let months = spec.months.mask(MONTH_RANGE);
    let days = spec.days.mask(DAY_RANGE);
    let selected = |mask: &[bool], v: u32| mask.get(v as usize).copied().unwrap_or(false);

    table
        .trips()
        .iter()
        .enumerate()
        .filter(|(_, trip)| {
            let derived = trip.derived();
            selected(&days, derived.start_day) && selected(&months, derived.start_month)
        })
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;
    use crate::data::model::{ColumnSet, TripFields};

    fn trip(start: &str) -> Trip {
        let start = NaiveDateTime::parse_from_str(start, "%Y-%m-%d %H:%M:%S").unwrap();
        Trip::new(TripFields {
            start_time: start,
            end_time: start,
            duration: 60.0,
            start_station: Some("A".into()),
            end_station: Some("B".into()),
            user_type: None,
            gender: None,
            birth_year: None,
        })
    }

    fn table() -> TripTable {
        TripTable::new(
            vec![
                trip("2017-01-02 08:00:00"), // Monday, January
                trip("2017-01-07 08:00:00"), // Saturday, January
                trip("2017-02-06 08:00:00"), // Monday, February
                trip("2017-07-03 08:00:00"), // Monday, July
            ],
            ColumnSet::default(),
        )
    }

    #[test]
    fn all_selects_full_range() {
        assert_eq!(parse_range("all", 1, 7).unwrap(), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(parse_range(" ALL ", 0, 7).unwrap(), (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn explicit_tokens_keep_order_and_duplicates() {
        assert_eq!(parse_range("2 4", 1, 7).unwrap(), vec![2, 4]);
        assert_eq!(parse_range("4 2 4", 1, 7).unwrap(), vec![4, 2, 4]);
    }

    #[test]
    fn out_of_range_token_rejects_whole_input() {
        let err = parse_range("0 7", 1, 7).unwrap_err();
        assert!(matches!(
            err,
            CityError::InvalidFilterInput { ref token, lower: 1, upper: 7 } if token == "0"
        ));

        let err = parse_range("3 7", 1, 7).unwrap_err();
        assert!(matches!(err, CityError::InvalidFilterInput { ref token, .. } if token == "7"));
    }

    #[test]
    fn non_numeric_and_empty_inputs_are_rejected() {
        for input in ["two", "1-3", "-1", "", "   ", "2.5"] {
            assert!(
                matches!(parse_range(input, 1, 7), Err(CityError::InvalidFilterInput { .. })),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn filter_is_conjunction_of_month_and_day() {
        let table = table();
        let spec = FilterSpec::parse("1", "0").unwrap();
        assert_eq!(filtered_indices(&table, &spec), vec![0]);

        let spec = FilterSpec::parse("1 2", "0").unwrap();
        assert_eq!(filtered_indices(&table, &spec), vec![0, 2]);
    }

    #[test]
    fn all_all_keeps_only_covered_months() {
        let table = table();
        let view = FilteredView::build(&table, FilterSpec::default());
        // July lies outside the covered months.
        assert_eq!(view.rows(), &[0, 1, 2]);
    }

    #[test]
    fn description_names_months_and_days() {
        let spec = FilterSpec::parse("3 1 3", "all").unwrap();
        assert_eq!(spec.describe(), "months: March, January; days: all days");

        let spec = FilterSpec::parse("all", "5 6").unwrap();
        assert_eq!(spec.describe(), "months: all months; days: Saturday, Sunday");
    }

    #[test]
    fn names_are_bounded() {
        assert_eq!(month_name(1), Some("January"));
        assert_eq!(month_name(0), None);
        assert_eq!(month_name(13), None);
        assert_eq!(day_name(6), Some("Sunday"));
        assert_eq!(day_name(7), None);
    }
}
