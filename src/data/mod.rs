/// Data layer: trip types, dataset resolution, loading, and filtering.
///
/// Architecture:
/// ```text
///   city name
///        │
///        ▼
///   ┌──────────┐
///   │  source   │  name → data/<city_name>.<ext>, existence check
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  header/schema → column layout → parse rows → TripTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │  TripTable    │  Vec<Trip> (source + derived columns), ColumnSet
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  month/weekday predicate → FilteredView (row indices)
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod source;
