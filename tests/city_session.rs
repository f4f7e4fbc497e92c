//! End-to-end tests: load city files from disk, filter, and query.

use std::path::Path;

use bikeshare_stats::data::model::{DerivedColumns, OptionalColumn};
use bikeshare_stats::stats::ColumnStat;
use bikeshare_stats::{City, CityError, DataConfig, SourceFormat};

const CHICAGO: &str = "\
Start Time,End Time,Trip Duration,Start Station,End Station,User Type,Gender,Birth Year
2017-01-02 08:05:00,2017-01-02 08:20:00,900,Canal St,Clark St,Subscriber,Male,1984.0
2017-01-02 08:30:00,2017-01-02 08:40:00,600,Canal St,Clark St,Subscriber,,1991.0
2017-01-04 17:10:00,2017-01-04 17:40:30,1830,Clark St,Canal St,Customer,,
2017-02-11 13:00:00,2017-02-11 13:20:00,1200,Lake St,Canal St,Customer,Female,
2017-03-06 08:15:00,2017-03-06 08:25:00,600,Canal St,Lake St,Subscriber,Female,1984.0
2017-06-30 23:55:00,2017-07-01 00:10:00,900,Lake St,Clark St,Subscriber,Male,1970.0
";

const WASHINGTON: &str = "\
Start Time,End Time,Trip Duration,Start Station,End Station,User Type
2017-04-03 07:00:00,2017-04-03 07:20:00,1200.5,14th St,Fairfax Dr,Subscriber
2017-04-03 07:30:00,2017-04-03 07:50:00,1199.5,14th St,Fairfax Dr,Customer
";

fn setup(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, contents) in files {
        std::fs::write(dir.path().join(name), contents).unwrap();
    }
    dir
}

fn csv_config(dir: &Path) -> DataConfig {
    DataConfig::new(dir, SourceFormat::Csv)
}

#[test]
fn loads_every_data_row() {
    let dir = setup(&[("chicago.csv", CHICAGO)]);
    let city = City::new("Chicago", &csv_config(dir.path())).unwrap();
    assert_eq!(city.base_table().len(), CHICAGO.lines().count() - 1);
    assert_eq!(city.name(), "Chicago");
}

#[test]
fn derived_columns_match_their_sources() {
    let dir = setup(&[("chicago.csv", CHICAGO)]);
    let city = City::new("chicago", &csv_config(dir.path())).unwrap();
    for trip in city.base_table().trips() {
        assert_eq!(&DerivedColumns::derive(trip.fields()), trip.derived());
    }
    let last = city.base_table().trips().last().unwrap().derived();
    // Friday 30 June, ending Saturday 1 July.
    assert_eq!((last.start_day, last.end_day), (4, 5));
    assert_eq!((last.start_hour, last.end_hour), (23, 0));
}

#[test]
fn unknown_city_is_retryable() {
    let dir = setup(&[]);
    let err = City::new("Springfield", &csv_config(dir.path())).unwrap_err();
    assert!(matches!(err, CityError::DatasetNotFound { .. }));
    assert!(err.is_retryable());
}

#[test]
fn multi_word_city_names_resolve_to_underscored_files() {
    let dir = setup(&[("new_york_city.csv", CHICAGO)]);
    let city = City::new("new york city", &csv_config(dir.path())).unwrap();
    assert_eq!(city.name(), "New York City");
}

#[test]
fn malformed_timestamp_aborts_construction() {
    let broken = CHICAGO.replace("2017-02-11 13:00:00", "2017-02-31 13:00:00");
    let dir = setup(&[("chicago.csv", &broken)]);
    let err = City::new("chicago", &csv_config(dir.path())).unwrap_err();
    assert!(matches!(err, CityError::MalformedTimestamp { row: 4, .. }));
    assert!(!err.is_retryable());
}

#[test]
fn aggregates_need_a_filter_first() {
    let dir = setup(&[("chicago.csv", CHICAGO)]);
    let city = City::new("chicago", &csv_config(dir.path())).unwrap();
    assert!(matches!(city.most_common_hour(), Err(CityError::NoActiveFilter)));
    assert!(matches!(city.user_types(), Err(CityError::NoActiveFilter)));
    assert!(city.filtered_view().is_none());
}

#[test]
fn month_filter_restricts_results() {
    let dir = setup(&[("chicago.csv", CHICAGO)]);
    let mut city = City::new("chicago", &csv_config(dir.path())).unwrap();

    let view = city.filter("1", "all").unwrap();
    assert_eq!(view.len(), 3);
    assert_eq!(city.most_common_month().unwrap(), 1);
    assert!(city
        .raw_rows()
        .unwrap()
        .iter()
        .all(|t| t.derived().start_month == 1));
    assert_eq!(city.most_common_trip().unwrap(), "Canal St to Clark St");
    assert_eq!(city.mean_trip_duration_minutes().unwrap(), 18.5);
    assert_eq!(
        city.filter_description(),
        Some("months: January; days: all days")
    );
}

#[test]
fn all_all_covers_the_whole_table() {
    let dir = setup(&[("chicago.csv", CHICAGO)]);
    let mut city = City::new("chicago", &csv_config(dir.path())).unwrap();
    let view = city.filter("ALL", "all").unwrap();
    assert_eq!(view.len(), city.base_table().len());

    let total_seconds: f64 = city
        .base_table()
        .trips()
        .iter()
        .map(|t| t.fields().duration)
        .sum();
    assert_eq!(city.total_trip_duration_days().unwrap(), total_seconds / 86_400.0);
    assert_eq!(city.most_common_start_station().unwrap(), "Canal St");
    assert_eq!(city.most_common_hour().unwrap(), 8);
}

#[test]
fn repeated_filters_are_identical() {
    let dir = setup(&[("chicago.csv", CHICAGO)]);
    let mut city = City::new("chicago", &csv_config(dir.path())).unwrap();

    let first = city.filter("1 3", "0 2").unwrap().clone();
    let first_report = city.summary().unwrap();
    let second = city.filter("1 3", "0 2").unwrap().clone();
    let second_report = city.summary().unwrap();

    assert_eq!(first, second);
    assert_eq!(first_report, second_report);
}

#[test]
fn gender_unknowns_and_birth_years() {
    let dir = setup(&[("chicago.csv", CHICAGO)]);
    let mut city = City::new("chicago", &csv_config(dir.path())).unwrap();
    city.filter("all", "all").unwrap();

    let genders = city.genders().unwrap().available().unwrap();
    assert_eq!(genders.count_of(&"Unknown".to_string()), 2);
    assert_eq!(genders.count_of(&"Male".to_string()), 2);
    assert_eq!(genders.count_of(&"Female".to_string()), 2);
    // Three-way tie: Male is seen first.
    assert_eq!(genders.mode().map(String::as_str), Some("Male"));

    let years = city.birth_year_stats().unwrap().available().unwrap();
    assert_eq!((years.earliest, years.latest, years.most_common), (1970, 1991, 1984));
}

#[test]
fn missing_demographic_columns_are_reported_not_raised() {
    let dir = setup(&[("washington.csv", WASHINGTON)]);
    let mut city = City::new("washington", &csv_config(dir.path())).unwrap();
    city.filter("4", "0").unwrap();

    assert_eq!(city.genders().unwrap(), ColumnStat::Absent(OptionalColumn::Gender));
    assert!(city.birth_year_stats().unwrap().is_absent());
    let users = city.user_types().unwrap().available().unwrap();
    assert_eq!(users.mode().map(String::as_str), Some("Subscriber"));
    assert_eq!(city.total_trip_duration_days().unwrap(), 2400.0 / 86_400.0);
}

#[test]
fn empty_selection_reports_empty_view() {
    let dir = setup(&[("chicago.csv", CHICAGO)]);
    let mut city = City::new("chicago", &csv_config(dir.path())).unwrap();
    // No Sunday trips in May.
    assert!(city.filter("5", "6").unwrap().is_empty());

    assert!(matches!(city.mean_trip_duration_minutes(), Err(CityError::EmptyView)));
    assert!(matches!(city.most_common_day(), Err(CityError::EmptyView)));
    assert!(matches!(city.genders(), Err(CityError::EmptyView)));
    assert!(city.summary().is_ok());
}

#[test]
fn bad_filter_input_leaves_session_usable() {
    let dir = setup(&[("chicago.csv", CHICAGO)]);
    let mut city = City::new("chicago", &csv_config(dir.path())).unwrap();

    let err = city.filter("0 7", "all").unwrap_err();
    assert!(matches!(err, CityError::InvalidFilterInput { .. }));
    assert!(matches!(city.most_common_hour(), Err(CityError::NoActiveFilter)));

    city.filter("2", "all").unwrap();
    assert!(city.filter("2", "monday").is_err());
    assert_eq!(city.most_common_month().unwrap(), 2);
}

#[test]
fn empty_station_cells_never_win_a_mode() {
    let sparse = "\
Start Time,End Time,Trip Duration,Start Station,End Station
2017-01-02 08:05:00,2017-01-02 08:20:00,900,,Clark St
2017-01-02 09:05:00,2017-01-02 09:20:00,900,,Clark St
2017-01-03 10:05:00,2017-01-03 10:20:00,900,Canal St,Clark St
";
    let dir = setup(&[("chicago.csv", sparse)]);
    let mut city = City::new("chicago", &csv_config(dir.path())).unwrap();
    city.filter("all", "all").unwrap();

    assert_eq!(city.most_common_start_station().unwrap(), "Canal St");
    assert_eq!(city.most_common_trip().unwrap(), "Canal St to Clark St");
    assert_eq!(city.raw_rows().unwrap().len(), 3);
}
