//! Bikeshare trip-history statistics.
//!
//! A [`City`] loads one city's trip file, derives calendar columns, and
//! answers aggregate queries over the trips matching a month/weekday filter.
//!
//! ```no_run
//! use bikeshare_stats::{City, DataConfig};
//!
//! let mut city = City::new("chicago", &DataConfig::default())?;
//! city.filter("1 2", "all")?;
//! println!("busiest hour: {}", city.most_common_hour()?);
//! # Ok::<(), bikeshare_stats::CityError>(())
//! ```

pub mod city;
pub mod config;
pub mod data;
pub mod error;
pub mod prompt;
pub mod report;
pub mod stats;

pub use city::City;
pub use config::{DataConfig, SourceFormat};
pub use error::CityError;
