use crate::config::DataConfig;
use crate::data::filter::{FilterSpec, FilteredView};
use crate::data::loader::load;
use crate::data::model::{OptionalColumn, Trip, TripTable, END_STATION, START_STATION};
use crate::data::source::{resolve, DatasetDescriptor};
use crate::error::{CityError, Result};
use crate::report::{CityReport, PopularStations, PopularTimes, Section, TripDurations};
use crate::stats::{mean, mode, BirthYearStats, ColumnStat, ValueCounts};

/// Label for trips whose gender was not recorded.
pub const UNKNOWN_GENDER: &str = "Unknown";

const SECONDS_PER_MINUTE: f64 = 60.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// One city's analysis session: the loaded base table plus, once
/// [`City::filter`] has succeeded, the active filtered view.
///
/// Every aggregate query reads the active view and fails with
/// [`CityError::NoActiveFilter`] before the first filter.
#[derive(Debug, Clone)]
pub struct City {
    name: String,
    table: TripTable,
    view: Option<FilteredView>,
}

impl City {
    /// Resolve, check and load a city in one step.
    pub fn new(city: &str, config: &DataConfig) -> Result<Self> {
        Self::open(&resolve(city, config))
    }

    pub fn open(descriptor: &DatasetDescriptor) -> Result<Self> {
        let table = load(descriptor)?;
        Ok(Self::from_table(descriptor.city(), table))
    }

    /// Wrap an already loaded table.
    pub fn from_table(name: &str, table: TripTable) -> Self {
        Self {
            name: title_case(name),
            table,
            view: None,
        }
    }

    /// Display name, e.g. `New York City`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_table(&self) -> &TripTable {
        &self.table
    }

    /// The active view, if a filter has been applied.
    pub fn filtered_view(&self) -> Option<&FilteredView> {
        self.view.as_ref()
    }

    pub fn filter_description(&self) -> Option<&str> {
        self.view.as_ref().map(FilteredView::description)
    }

    // -----------------------------------------------------------------------
    // Filtering
    // -----------------------------------------------------------------------

    /// Parse month and day inputs and replace the active view.
    ///
    /// On invalid input the previous view (if any) stays active.
    pub fn filter(&mut self, months: &str, days: &str) -> Result<&FilteredView> {
        let spec = FilterSpec::parse(months, days)?;
        Ok(self.apply_filter(spec))
    }

    pub fn apply_filter(&mut self, spec: FilterSpec) -> &FilteredView {
        let view = FilteredView::build(&self.table, spec);
        log::info!(
            "{}: {} of {} trips match ({})",
            self.name,
            view.len(),
            self.table.len(),
            view.description()
        );
        self.view.insert(view)
    }

    fn active_view(&self) -> Result<&FilteredView> {
        self.view.as_ref().ok_or(CityError::NoActiveFilter)
    }

    /// Trips of the active view; fails if there are none.
    fn trips(&self) -> Result<impl Iterator<Item = &Trip> + '_> {
        let view = self.active_view()?;
        if view.is_empty() {
            return Err(CityError::EmptyView);
        }
        Ok(view.trips(&self.table))
    }

    fn optional_trips(
        &self,
        column: OptionalColumn,
    ) -> Result<Option<impl Iterator<Item = &Trip> + '_>> {
        let trips = self.trips()?;
        Ok(self.table.columns().contains(column).then_some(trips))
    }

    /// Every trip in the active view, possibly none.
    pub fn raw_rows(&self) -> Result<Vec<&Trip>> {
        Ok(self.active_view()?.trips(&self.table).collect())
    }

    // -----------------------------------------------------------------------
    // Popular times
    // -----------------------------------------------------------------------

    /// Most common start month (1 = January).
    pub fn most_common_month(&self) -> Result<u32> {
        self.mode_of(|t| t.derived().start_month)
    }

    /// Most common start weekday (0 = Monday).
    pub fn most_common_day(&self) -> Result<u32> {
        self.mode_of(|t| t.derived().start_day)
    }

    /// Most common start hour (0–23).
    pub fn most_common_hour(&self) -> Result<u32> {
        self.mode_of(|t| t.derived().start_hour)
    }

    // -----------------------------------------------------------------------
    // Popular stations and trips
    // -----------------------------------------------------------------------

    // Trips without a recorded station are skipped.

    pub fn most_common_start_station(&self) -> Result<String> {
        self.recorded_mode_of(START_STATION, |t| t.fields().start_station.clone())
    }

    pub fn most_common_end_station(&self) -> Result<String> {
        self.recorded_mode_of(END_STATION, |t| t.fields().end_station.clone())
    }

    /// Most common start/end station combination as a trip label.
    pub fn most_common_trip(&self) -> Result<String> {
        self.recorded_mode_of("trip", |t| t.derived().trip_label.clone())
    }

    fn mode_of<T, F>(&self, key: F) -> Result<T>
    where
        T: Eq + std::hash::Hash + Clone,
        F: Fn(&Trip) -> T,
    {
        mode(self.trips()?.map(key)).ok_or(CityError::EmptyView)
    }

    fn recorded_mode_of<T, F>(&self, column: &str, key: F) -> Result<T>
    where
        T: Eq + std::hash::Hash + Clone,
        F: Fn(&Trip) -> Option<T>,
    {
        mode(self.trips()?.filter_map(key)).ok_or_else(|| no_recorded_values(column))
    }

    // -----------------------------------------------------------------------
    // Trip duration
    // -----------------------------------------------------------------------

    pub fn total_trip_duration_days(&self) -> Result<f64> {
        let seconds: f64 = self.trips()?.map(|t| t.fields().duration).sum();
        Ok(seconds / SECONDS_PER_DAY)
    }

    pub fn mean_trip_duration_minutes(&self) -> Result<f64> {
        mean(self.trips()?.map(|t| t.fields().duration))
            .map(|seconds| seconds / SECONDS_PER_MINUTE)
            .ok_or(CityError::EmptyView)
    }

    // -----------------------------------------------------------------------
    // Demographics
    // -----------------------------------------------------------------------

    /// Trips per user type. Unrecorded user types are not counted.
    pub fn user_types(&self) -> Result<ColumnStat<ValueCounts<String>>> {
        let column = OptionalColumn::UserType;
        Ok(match self.optional_trips(column)? {
            Some(trips) => ColumnStat::Available(ValueCounts::from_values(
                trips.filter_map(|t| t.fields().user_type.clone()),
            )),
            None => ColumnStat::Absent(column),
        })
    }

    /// Trips per gender, with unrecorded genders counted as [`UNKNOWN_GENDER`].
    pub fn genders(&self) -> Result<ColumnStat<ValueCounts<String>>> {
        let column = OptionalColumn::Gender;
        Ok(match self.optional_trips(column)? {
            Some(trips) => ColumnStat::Available(ValueCounts::from_values(trips.map(|t| {
                t.fields()
                    .gender
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_GENDER.to_string())
            }))),
            None => ColumnStat::Absent(column),
        })
    }

    /// Earliest, latest and most common birth year.
    ///
    /// Fails with [`CityError::NoRecordedValues`] when no trip in a non-empty
    /// view has a recorded birth year.
    pub fn birth_year_stats(&self) -> Result<ColumnStat<BirthYearStats>> {
        let column = OptionalColumn::BirthYear;
        match self.optional_trips(column)? {
            Some(trips) => {
                BirthYearStats::from_years(trips.filter_map(|t| t.fields().birth_year))
                    .map(ColumnStat::Available)
                    .ok_or_else(|| no_recorded_values(column.header()))
            }
            None => Ok(ColumnStat::Absent(column)),
        }
    }

    // -----------------------------------------------------------------------
    // Report
    // -----------------------------------------------------------------------

    pub fn popular_times(&self) -> Result<PopularTimes> {
        Ok(PopularTimes {
            month: self.most_common_month()?,
            day: self.most_common_day()?,
            hour: self.most_common_hour()?,
        })
    }

    pub fn popular_stations(&self) -> Result<PopularStations> {
        Ok(PopularStations {
            start: self.most_common_start_station()?,
            end: self.most_common_end_station()?,
            trip: self.most_common_trip()?,
        })
    }

    pub fn trip_durations(&self) -> Result<TripDurations> {
        Ok(TripDurations {
            total_days: self.total_trip_duration_days()?,
            mean_minutes: self.mean_trip_duration_minutes()?,
        })
    }

    /// Every statistic for the active view. Only [`CityError::NoActiveFilter`]
    /// escapes; empty views and absent columns become report sections.
    pub fn summary(&self) -> Result<CityReport> {
        let view = self.active_view()?;

        let popular_times = Section::from_result(self.popular_times())?;
        let popular_stations = Section::from_result(self.popular_stations())?;
        let durations = Section::from_result(self.trip_durations())?;

        Ok(CityReport {
            city: self.name.clone(),
            filter: view.description().to_string(),
            trip_count: view.len(),
            popular_times,
            popular_stations,
            durations,
            user_types: Section::from_column(self.user_types())?,
            genders: Section::from_column(self.genders())?,
            birth_years: Section::from_column(self.birth_year_stats())?,
        })
    }
}

fn no_recorded_values(column: &str) -> CityError {
    CityError::NoRecordedValues {
        column: column.to_string(),
    }
}

fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
