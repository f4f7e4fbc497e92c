//! Aggregate helpers over filtered trips.
//!
//! Ties are broken by first occurrence: when several values share the highest
//! count, the one seen earliest in the filtered view wins. Frequency tables
//! use the same order (count descending, then first occurrence).

use std::collections::HashMap;
use std::hash::Hash;

use serde::Serialize;

use crate::data::model::OptionalColumn;

/// Outcome of a query over an optional column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum ColumnStat<T> {
    Available(T),
    /// The dataset does not carry this column. Informational, not a failure.
    Absent(OptionalColumn),
}

impl<T> ColumnStat<T> {
    pub fn available(self) -> Option<T> {
        match self {
            ColumnStat::Available(value) => Some(value),
            ColumnStat::Absent(_) => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, ColumnStat::Absent(_))
    }
}

/// Frequency table ordered by descending count, ties by first occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCounts<T> {
    entries: Vec<(T, usize)>,
}

impl<T: Eq + Hash + Clone> ValueCounts<T> {
    pub fn from_values(values: impl IntoIterator<Item = T>) -> Self {
        let mut slots: HashMap<T, usize> = HashMap::new();
        let mut entries: Vec<(T, usize)> = Vec::new();
        for value in values {
            match slots.get(&value) {
                Some(&slot) => entries[slot].1 += 1,
                None => {
                    slots.insert(value.clone(), entries.len());
                    entries.push((value, 1));
                }
            }
        }
        // Stable: equal counts stay in first-seen order.
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        Self { entries }
    }
}

impl<T> ValueCounts<T> {
    pub fn entries(&self) -> &[(T, usize)] {
        &self.entries
    }

    /// The most common value.
    pub fn mode(&self) -> Option<&T> {
        self.entries.first().map(|(value, _)| value)
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: PartialEq> ValueCounts<T> {
    pub fn count_of(&self, value: &T) -> usize {
        self.entries
            .iter()
            .find(|(v, _)| v == value)
            .map_or(0, |(_, count)| *count)
    }
}

/// Most common value; `None` for an empty input.
pub fn mode<T: Eq + Hash + Clone>(values: impl IntoIterator<Item = T>) -> Option<T> {
    ValueCounts::from_values(values).mode().cloned()
}

/// Arithmetic mean; `None` for an empty input.
pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Earliest, latest and most common birth year of a filtered view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BirthYearStats {
    pub earliest: i32,
    pub latest: i32,
    pub most_common: i32,
}

impl BirthYearStats {
    /// Truncates to whole years; `None` when no year is recorded.
    pub fn from_years(years: impl IntoIterator<Item = f64>) -> Option<Self> {
        let years: Vec<i32> = years.into_iter().map(|y| y as i32).collect();
        Some(Self {
            earliest: *years.iter().min()?,
            latest: *years.iter().max()?,
            most_common: mode(years.iter().copied())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_are_sorted_descending() {
        let counts = ValueCounts::from_values(["b", "a", "a", "c", "a", "c"]);
        assert_eq!(counts.entries(), &[("a", 3), ("c", 2), ("b", 1)]);
        assert_eq!(counts.total(), 6);
        assert_eq!(counts.count_of(&"c"), 2);
        assert_eq!(counts.count_of(&"z"), 0);
    }

    #[test]
    fn ties_resolve_to_first_occurrence() {
        assert_eq!(mode([3, 1, 1, 3, 2]), Some(3));
        assert_eq!(mode(["x", "y"]), Some("x"));
        let counts = ValueCounts::from_values([5, 4, 4, 5, 9]);
        assert_eq!(counts.entries(), &[(5, 2), (4, 2), (9, 1)]);
    }

    #[test]
    fn empty_inputs_have_no_mode_or_mean() {
        assert_eq!(mode(Vec::<u32>::new()), None);
        assert_eq!(mean(Vec::new()), None);
        assert!(ValueCounts::<u32>::from_values([]).is_empty());
    }

    #[test]
    fn mean_of_values() {
        assert_eq!(mean([1.0, 2.0, 6.0]), Some(3.0));
    }

    #[test]
    fn birth_years_are_whole_years() {
        let stats = BirthYearStats::from_years([1985.0, 1990.7, 1990.2, 1961.0]).unwrap();
        assert_eq!(
            stats,
            BirthYearStats {
                earliest: 1961,
                latest: 1990,
                most_common: 1990,
            }
        );
        assert_eq!(BirthYearStats::from_years([]), None);
    }

    #[test]
    fn column_stat_accessors() {
        assert_eq!(ColumnStat::Available(3).available(), Some(3));
        let absent: ColumnStat<u32> = ColumnStat::Absent(OptionalColumn::Gender);
        assert!(absent.is_absent());
        assert_eq!(absent.available(), None);
    }
}
