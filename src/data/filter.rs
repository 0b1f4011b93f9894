use std::collections::BTreeSet;
use std::fmt;

use super::format::format_grouped;
use super::model::{Observation, Observations};
use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// Range / country filter
// ---------------------------------------------------------------------------

/// Observations whose country is selected and whose year is within
/// `min_year..=max_year`.
///
/// An empty selection or an inverted range yields an empty result rather
/// than an error; the caller decides whether to warn about it.
pub fn range_filter(
    observations: &Observations,
    min_year: i32,
    max_year: i32,
    countries: &BTreeSet<String>,
) -> Vec<Observation> {
    if countries.is_empty() || min_year > max_year {
        return Vec::new();
    }
    observations
        .records
        .iter()
        .filter(|o| min_year <= o.year && o.year <= max_year)
        .filter(|o| countries.contains(&o.country_code))
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Growth metric
// ---------------------------------------------------------------------------

/// Ratio of the last to the first value, or `n/a` when it is undefined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Growth {
    Multiple(f64),
    NotAvailable,
}

impl Growth {
    /// `n/a` when `first` is zero or NaN, or when `last` is NaN.
    pub fn between(first: f64, last: f64) -> Self {
        if first.is_nan() || first == 0.0 || last.is_nan() {
            Growth::NotAvailable
        } else {
            Growth::Multiple(last / first)
        }
    }
}

impl fmt::Display for Growth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Growth::Multiple(r) => write!(f, "{}x", format_grouped(*r, 2)),
            Growth::NotAvailable => write!(f, "n/a"),
        }
    }
}

/// First/last values of one country over a year span, already scaled by the
/// display unit.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthMetric {
    pub country_code: String,
    pub from_year: i32,
    pub to_year: i32,
    pub first_value: f64,
    pub last_value: f64,
    pub growth: Growth,
}

/// Compare `country`'s value at `from_year` and `to_year`.
///
/// Both values are divided by `unit_divisor` (e.g. `1e9` to report billions)
/// before the growth check; a positive divisor keeps zero and NaN intact.
/// A country without a record at either year is a lookup error, never `n/a`.
pub fn growth_metric(
    observations: &Observations,
    country: &str,
    from_year: i32,
    to_year: i32,
    unit_divisor: f64,
) -> Result<GrowthMetric> {
    let first_value = lookup(observations, country, from_year)? / unit_divisor;
    let last_value = lookup(observations, country, to_year)? / unit_divisor;

    Ok(GrowthMetric {
        country_code: country.to_string(),
        from_year,
        to_year,
        first_value,
        last_value,
        growth: Growth::between(first_value, last_value),
    })
}

/// Value of the first record for (country, year).
fn lookup(observations: &Observations, country: &str, year: i32) -> Result<f64> {
    observations
        .records
        .iter()
        .find(|o| o.year == year && o.country_code == country)
        .map(|o| o.value)
        .ok_or_else(|| PipelineError::Lookup {
            country: country.to_string(),
            year,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::YearRange;
    use crate::error::ErrorKind;

    fn obs(code: &str, year: i32, value: f64) -> Observation {
        Observation {
            country_code: code.to_string(),
            year,
            value,
        }
    }

    fn dataset() -> Observations {
        Observations::new(
            vec![
                obs("FRA", 2010, 2646.0),
                obs("FRA", 2015, 2400.0),
                obs("FRA", 2020, 2630.0),
                obs("DEU", 2010, f64::NAN),
                obs("DEU", 2015, 3000.0),
                obs("DEU", 2020, 3900.0),
                obs("ITA", 2010, 0.0),
                obs("ITA", 2020, 10.0),
            ],
            YearRange::new(2010, 2020).unwrap(),
        )
    }

    fn set(codes: &[&str]) -> BTreeSet<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn filter_keeps_only_selected_countries_in_range() {
        let ds = dataset();
        let out = range_filter(&ds, 2015, 2020, &set(&["FRA", "ITA"]));

        assert!(out
            .iter()
            .all(|o| (2015..=2020).contains(&o.year) && (o.country_code == "FRA" || o.country_code == "ITA")));
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn filter_with_empty_selection_is_empty() {
        assert!(range_filter(&dataset(), 2010, 2020, &BTreeSet::new()).is_empty());
    }

    #[test]
    fn filter_with_inverted_range_is_empty() {
        assert!(range_filter(&dataset(), 2020, 2010, &set(&["FRA"])).is_empty());
    }

    #[test]
    fn filter_ignores_unknown_countries() {
        assert!(range_filter(&dataset(), 2010, 2020, &set(&["XXX"])).is_empty());
    }

    #[test]
    fn growth_for_france() {
        let m = growth_metric(&dataset(), "FRA", 2010, 2020, 1.0).unwrap();
        assert_eq!(m.first_value, 2646.0);
        assert_eq!(m.last_value, 2630.0);
        assert_eq!(m.growth.to_string(), "0.99x");
    }

    #[test]
    fn growth_applies_unit_divisor() {
        let m = growth_metric(&dataset(), "DEU", 2015, 2020, 1000.0).unwrap();
        assert_eq!(m.first_value, 3.0);
        assert_eq!(m.last_value, 3.9);
        assert_eq!(m.growth.to_string(), "1.30x");
    }

    #[test]
    fn growth_from_nan_is_not_available() {
        let m = growth_metric(&dataset(), "DEU", 2010, 2020, 1.0).unwrap();
        assert_eq!(m.growth, Growth::NotAvailable);
        assert_eq!(m.growth.to_string(), "n/a");
    }

    #[test]
    fn growth_from_zero_is_not_available() {
        let m = growth_metric(&dataset(), "ITA", 2010, 2020, 1e9).unwrap();
        assert_eq!(m.growth, Growth::NotAvailable);
    }

    #[test]
    fn growth_to_nan_is_not_available() {
        let m = growth_metric(&dataset(), "DEU", 2020, 2010, 1.0).unwrap();
        assert_eq!(m.first_value, 3900.0);
        assert_eq!(m.growth, Growth::NotAvailable);
    }

    #[test]
    fn missing_country_is_a_lookup_error() {
        let err = growth_metric(&dataset(), "ESP", 2010, 2020, 1.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lookup);
    }

    #[test]
    fn missing_year_is_a_lookup_error() {
        let err = growth_metric(&dataset(), "ITA", 2015, 2020, 1.0).unwrap_err();
        assert!(matches!(err, PipelineError::Lookup { ref country, year: 2015 } if country == "ITA"));
    }

    #[test]
    fn large_ratio_is_grouped() {
        assert_eq!(Growth::Multiple(1234.5).to_string(), "1,234.50x");
    }
}
