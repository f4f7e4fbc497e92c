use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use parquet::arrow::ArrowWriter;

use bikeshare_stats::data::loader::TIMESTAMP_FORMAT;

const STATIONS: [&str; 6] = [
    "Canal St & Adams St",
    "Clinton St & Madison St",
    "Streeter Dr & Grand Ave",
    "Lake Shore Dr & Monroe St",
    "Michigan Ave & Oak St",
    "Theater on the Lake",
];
const USER_TYPES: [&str; 2] = ["Subscriber", "Customer"];
const GENDERS: [&str; 2] = ["Male", "Female"];
const TRIPS: usize = 2_000;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len() as u64) as usize]
    }
}

struct SampleTrip {
    start: NaiveDateTime,
    end: NaiveDateTime,
    duration: i64,
    start_station: &'static str,
    end_station: &'static str,
    user_type: &'static str,
    gender: Option<&'static str>,
    birth_year: Option<f64>,
}

fn generate(rng: &mut SimpleRng) -> Result<Vec<SampleTrip>> {
    let first_day = NaiveDate::from_ymd_opt(2017, 1, 1).context("invalid start date")?;
    let mut trips = Vec::with_capacity(TRIPS);
    for _ in 0..TRIPS {
        // January to June 2017 (181 days), commuter-heavy hours.
        let day = first_day + Duration::days(rng.below(181) as i64);
        let hour = [7, 8, 8, 9, 12, 17, 17, 18, 22][rng.below(9) as usize];
        let start = day
            .and_hms_opt(hour, rng.below(60) as u32, rng.below(60) as u32)
            .context("invalid start time")?;
        let duration = 120 + rng.below(2_400) as i64;
        let user_type = rng.pick(&USER_TYPES);
        let subscriber = user_type == "Subscriber";

        trips.push(SampleTrip {
            start,
            end: start + Duration::seconds(duration),
            duration,
            start_station: rng.pick(&STATIONS),
            end_station: rng.pick(&STATIONS),
            user_type,
            gender: subscriber.then(|| rng.pick(&GENDERS)),
            birth_year: subscriber.then(|| 1950.0 + rng.below(50) as f64),
        });
    }
    Ok(trips)
}

fn write_csv(path: &Path, trips: &[SampleTrip]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    writer.write_record([
        "Start Time",
        "End Time",
        "Trip Duration",
        "Start Station",
        "End Station",
        "User Type",
        "Gender",
        "Birth Year",
    ])?;
    for trip in trips {
        writer.write_record([
            trip.start.format(TIMESTAMP_FORMAT).to_string(),
            trip.end.format(TIMESTAMP_FORMAT).to_string(),
            trip.duration.to_string(),
            trip.start_station.to_string(),
            trip.end_station.to_string(),
            trip.user_type.to_string(),
            trip.gender.unwrap_or_default().to_string(),
            trip.birth_year.map(|y| format!("{y:.1}")).unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, trips: &[SampleTrip]) -> Result<()> {
    let timestamps = |f: fn(&SampleTrip) -> NaiveDateTime| {
        StringArray::from(
            trips
                .iter()
                .map(|t| f(t).format(TIMESTAMP_FORMAT).to_string())
                .collect::<Vec<_>>(),
        )
    };
    let text = |f: fn(&SampleTrip) -> Option<&'static str>| {
        StringArray::from(trips.iter().map(f).collect::<Vec<_>>())
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new("Start Time", DataType::Utf8, false),
        Field::new("End Time", DataType::Utf8, false),
        Field::new("Trip Duration", DataType::Int64, false),
        Field::new("Start Station", DataType::Utf8, false),
        Field::new("End Station", DataType::Utf8, false),
        Field::new("User Type", DataType::Utf8, true),
        Field::new("Gender", DataType::Utf8, true),
        Field::new("Birth Year", DataType::Float64, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(timestamps(|t| t.start)),
            Arc::new(timestamps(|t| t.end)),
            Arc::new(Int64Array::from(trips.iter().map(|t| t.duration).collect::<Vec<_>>())),
            Arc::new(text(|t| Some(t.start_station))),
            Arc::new(text(|t| Some(t.end_station))),
            Arc::new(text(|t| Some(t.user_type))),
            Arc::new(text(|t| t.gender)),
            Arc::new(Float64Array::from(trips.iter().map(|t| t.birth_year).collect::<Vec<_>>())),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating Parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);
    let trips = generate(&mut rng)?;

    let dir = Path::new("data");
    std::fs::create_dir_all(dir).context("creating data directory")?;
    write_csv(&dir.join("sample_city.csv"), &trips)?;
    write_parquet(&dir.join("sample_city.parquet"), &trips)?;

    log::info!("Wrote {} trips to {}", trips.len(), dir.display());
    println!("Wrote {} sample trips to data/sample_city.{{csv,parquet}}", trips.len());
    Ok(())
}
