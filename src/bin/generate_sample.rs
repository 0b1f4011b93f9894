use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const FIRST_YEAR: i32 = 1960;
const LAST_YEAR: i32 = 2022;
const INDICATOR_NAME: &str = "Gross fixed capital formation (current US$)";
const INDICATOR_CODE: &str = "NE.GDI.FTOT.CD";

/// (name, code, starting value in US$, mean yearly growth)
const COUNTRIES: &[(&str, &str, f64, f64)] = &[
    ("France", "FRA", 1.8e10, 0.055),
    ("Germany", "DEU", 2.6e10, 0.050),
    ("Italy", "ITA", 1.5e10, 0.052),
    ("Spain", "ESP", 6.0e9, 0.065),
    ("United Kingdom", "GBR", 1.9e10, 0.053),
    ("Netherlands", "NLD", 4.0e9, 0.058),
    ("Poland", "POL", 3.0e9, 0.060),
    ("Sweden", "SWE", 3.5e9, 0.054),
];

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
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// One value per year; early years are sometimes unreported (`None`).
fn generate_series(start: f64, growth: f64, rng: &mut SimpleRng) -> Vec<Option<f64>> {
    let mut value = start;
    (FIRST_YEAR..=LAST_YEAR)
        .map(|year| {
            value *= 1.0 + rng.gauss(growth, 0.04);
            let unreported = year < 1970 && rng.next_f64() < 0.3;
            (!unreported).then_some(value.round())
        })
        .collect()
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let years: Vec<String> = (FIRST_YEAR..=LAST_YEAR).map(|y| y.to_string()).collect();
    let series: Vec<Vec<Option<f64>>> = COUNTRIES
        .iter()
        .map(|&(_, _, start, growth)| generate_series(start, growth, &mut rng))
        .collect();

    std::fs::create_dir_all("data").context("creating data directory")?;
    write_csv(Path::new("data/inv_data.csv"), &years, &series)?;
    write_parquet(Path::new("data/inv_data.parquet"), &years, &series)?;

    println!(
        "Wrote {} countries × {} years to data/inv_data.csv and data/inv_data.parquet",
        COUNTRIES.len(),
        years.len()
    );
    Ok(())
}

fn write_csv(path: &Path, years: &[String], series: &[Vec<Option<f64>>]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;

    let mut header = vec!["Country Name", "Country Code", "Indicator Name", "Indicator Code"];
    header.extend(years.iter().map(String::as_str));
    writer.write_record(&header)?;

    for (&(name, code, _, _), values) in COUNTRIES.iter().zip(series) {
        let mut row = vec![
            name.to_string(),
            code.to_string(),
            INDICATOR_NAME.to_string(),
            INDICATOR_CODE.to_string(),
        ];
        row.extend(values.iter().map(|v| v.map(|v| v.to_string()).unwrap_or_default()));
        writer.write_record(&row)?;
    }
    writer.flush().context("flushing CSV file")?;
    Ok(())
}

fn write_parquet(path: &Path, years: &[String], series: &[Vec<Option<f64>>]) -> Result<()> {
    let n = COUNTRIES.len();
    let names: Vec<&str> = COUNTRIES.iter().map(|c| c.0).collect();
    let codes: Vec<&str> = COUNTRIES.iter().map(|c| c.1).collect();

    let mut fields = vec![
        Field::new("Country Name", DataType::Utf8, false),
        Field::new("Country Code", DataType::Utf8, false),
        Field::new("Indicator Name", DataType::Utf8, false),
        Field::new("Indicator Code", DataType::Utf8, false),
    ];
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(names)),
        Arc::new(StringArray::from(codes)),
        Arc::new(StringArray::from(vec![INDICATOR_NAME; n])),
        Arc::new(StringArray::from(vec![INDICATOR_CODE; n])),
    ];
    for (i, year) in years.iter().enumerate() {
        fields.push(Field::new(year, DataType::Float64, true));
        let values: Float64Array = series.iter().map(|s| s[i]).collect();
        columns.push(Arc::new(values));
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path).context("creating Parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating Parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing Parquet writer")?;
    Ok(())
}
