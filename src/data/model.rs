use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::error::{PipelineError, Result};

/// First year of the default reporting window.
pub const MIN_YEAR: i32 = 2010;
/// Last year (inclusive) of the default reporting window.
pub const MAX_YEAR: i32 = 2022;

// ---------------------------------------------------------------------------
// CellValue – a single year cell of the wide table
// ---------------------------------------------------------------------------

/// A raw year cell before coercion. CSV cells always arrive as text; Parquet
/// cells keep their numeric type.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Empty,
}

impl CellValue {
    /// Build a cell from delimited text. Blank text is an empty cell.
    pub fn from_text(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }

    /// Coerce to `f64`; anything that is not a number becomes NaN.
    pub fn as_f64(&self) -> f64 {
        match self {
            CellValue::Number(v) => *v,
            CellValue::Text(s) => s.parse::<f64>().unwrap_or(f64::NAN),
            CellValue::Empty => f64::NAN,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(v) => write!(f, "{v}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Empty => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// RawRecord / RawTable – the wide table as loaded
// ---------------------------------------------------------------------------

/// One country row of the source file.
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub country_name: String,
    pub country_code: String,
    /// Non-year columns (indicator name, indicator code, ...).
    pub metadata: BTreeMap<String, String>,
    /// Year column header → cell.
    pub cells: BTreeMap<String, CellValue>,
}

/// The loaded wide table.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// All header names in file order.
    pub columns: Vec<String>,
    /// Header names that parse as a year, in file order.
    pub year_columns: Vec<String>,
    pub records: Vec<RawRecord>,
}

impl RawTable {
    /// Header name of the column holding `year`, if any.
    pub fn year_column(&self, year: i32) -> Option<&str> {
        self.year_columns
            .iter()
            .find(|h| parse_year(h) == Some(year))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Interpret a header as a year column name.
pub fn parse_year(header: &str) -> Option<i32> {
    header.trim().parse::<i32>().ok()
}

// ---------------------------------------------------------------------------
// YearRange
// ---------------------------------------------------------------------------

/// Inclusive range of years, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct YearRange {
    start: i32,
    end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Result<Self> {
        if start > end {
            return Err(PipelineError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }

    pub fn contains(&self, year: i32) -> bool {
        self.start <= year && year <= self.end
    }

    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.start..=self.end
    }

    /// Number of years in the range.
    pub fn len(&self) -> usize {
        (self.end - self.start) as usize + 1
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self {
            start: MIN_YEAR,
            end: MAX_YEAR,
        }
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}–{}", self.start, self.end)
    }
}

// ---------------------------------------------------------------------------
// Observation – one row of the long table
// ---------------------------------------------------------------------------

/// A single (country, year, value) observation. `value` is NaN for "no data".
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub country_code: String,
    pub year: i32,
    pub value: f64,
}

impl Observation {
    pub fn has_value(&self) -> bool {
        !self.value.is_nan()
    }
}

// ---------------------------------------------------------------------------
// Observations – the reshaped dataset
// ---------------------------------------------------------------------------

/// The full long-format dataset, immutable once built.
#[derive(Debug, Clone)]
pub struct Observations {
    pub records: Vec<Observation>,
    /// The year window the records were melted over.
    pub range: YearRange,
    /// Country code → display name, from the `Country Name` column.
    pub names: BTreeMap<String, String>,
}

impl Observations {
    pub fn new(records: Vec<Observation>, range: YearRange) -> Self {
        Self {
            records,
            range,
            names: BTreeMap::new(),
        }
    }

    pub fn with_names(mut self, names: BTreeMap<String, String>) -> Self {
        self.names = names;
        self
    }

    /// Display name for `code`, falling back to the code itself.
    pub fn name_of<'a>(&'a self, code: &'a str) -> &'a str {
        self.names.get(code).map_or(code, String::as_str)
    }

    /// Unique country codes in the order they first appear.
    pub fn countries(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter(|o| seen.insert(o.country_code.as_str()))
            .map(|o| o.country_code.clone())
            .collect()
    }

    /// Smallest and largest year present, `None` when empty.
    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        let min = self.records.iter().map(|o| o.year).min()?;
        let max = self.records.iter().map(|o| o.year).max()?;
        Some((min, max))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
