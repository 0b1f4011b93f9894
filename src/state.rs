use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::color::ColorMap;
use crate::config::DashboardConfig;
use crate::data::cache;
use crate::data::filter::{growth_metric, range_filter, GrowthMetric};
use crate::data::model::{Observation, Observations};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Outcome of the growth metric for one selected country.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricCard {
    Ready(GrowthMetric),
    /// The country has no record at one of the requested years.
    Unavailable { country: String, reason: String },
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// File the current dataset was read from.
    pub data_path: PathBuf,

    /// Loaded dataset (None until a file loads successfully).
    pub dataset: Option<Arc<Observations>>,

    /// Every country in the dataset, in file order.
    pub countries: Vec<String>,

    /// Selected countries, in the order they were picked.
    pub selected: Vec<String>,

    /// Smallest and largest year in the dataset (slider bounds).
    pub year_bounds: (i32, i32),

    pub from_year: i32,
    pub to_year: i32,

    /// Observations passing the current filters (cached).
    pub visible: Vec<Observation>,

    /// One card per selected country (cached).
    pub metrics: Vec<MetricCard>,

    pub color_map: ColorMap,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let (min, max) = (config.data.min_year, config.data.max_year);
        Self {
            data_path: config.data.path.clone(),
            config,
            dataset: None,
            countries: Vec::new(),
            selected: Vec::new(),
            year_bounds: (min, max),
            from_year: min,
            to_year: max,
            visible: Vec::new(),
            metrics: Vec::new(),
            color_map: ColorMap::default(),
            status_message: None,
        }
    }

    /// Load `path` through the process-wide cache and make it current.
    /// Failures leave the previous dataset in place and set the status line.
    /// Returns whether the dataset was replaced.
    pub fn load(&mut self, path: &Path) -> bool {
        let loaded = self
            .config
            .year_range()
            .and_then(|range| Ok((range, self.config.delimiter()?)))
            .and_then(|(range, delimiter)| Ok(cache::load_cached(path, range, delimiter)?));

        match loaded {
            Ok(dataset) => {
                log::info!(
                    "Showing {} observations for {} countries from {}",
                    dataset.len(),
                    dataset.countries().len(),
                    path.display()
                );
                self.data_path = path.to_path_buf();
                self.set_dataset(dataset);
                true
            }
            Err(e) => {
                log::error!("Failed to load {}: {e:#}", path.display());
                self.status_message = Some(format!("Error: {e:#}"));
                false
            }
        }
    }

    /// Drop the cached copy of the current file and read it again. The
    /// selection and year window survive, minus countries no longer present.
    pub fn reload(&mut self) {
        let path = self.data_path.clone();
        let dropped = cache::invalidate(&path);
        log::debug!("Invalidated {dropped} cache entries for {}", path.display());

        let selected = std::mem::take(&mut self.selected);
        let (from, to) = (self.from_year, self.to_year);
        if self.load(&path) {
            self.selected = selected
                .into_iter()
                .filter(|c| self.countries.contains(c))
                .collect();
            self.set_year_range(from, to);
        } else {
            self.selected = selected;
        }
    }

    /// Ingest a dataset: reset bounds, default selection and colours.
    pub fn set_dataset(&mut self, dataset: Arc<Observations>) {
        self.countries = dataset.countries();
        self.color_map = ColorMap::new(&self.countries);
        self.year_bounds = dataset
            .year_bounds()
            .unwrap_or((dataset.range.start(), dataset.range.end()));
        self.from_year = self.year_bounds.0;
        self.to_year = self.year_bounds.1;

        self.selected = self
            .config
            .display
            .default_countries
            .iter()
            .filter(|c| self.countries.contains(c))
            .cloned()
            .collect();
        if self.selected.len() < self.config.display.default_countries.len() {
            log::warn!(
                "Some default countries are not in the data: {:?}",
                self.config.display.default_countries
            );
        }

        self.dataset = Some(dataset);
        self.status_message = None;
        self.refilter();
    }

    /// Move the year window, keeping it inside the data and `from <= to`.
    pub fn set_year_range(&mut self, from: i32, to: i32) {
        let (lo, hi) = self.year_bounds;
        let from = from.clamp(lo, hi);
        let to = to.clamp(lo, hi);
        self.from_year = from.min(to);
        self.to_year = from.max(to);
        self.refilter();
    }

    pub fn is_selected(&self, country: &str) -> bool {
        self.selected.iter().any(|c| c == country)
    }

    /// Toggle a single country in the multiselect.
    pub fn toggle_country(&mut self, country: &str) {
        if self.is_selected(country) {
            self.selected.retain(|c| c != country);
        } else {
            self.selected.push(country.to_string());
        }
        self.refilter();
    }

    pub fn select_all(&mut self) {
        for country in &self.countries {
            if !self.selected.contains(country) {
                self.selected.push(country.clone());
            }
        }
        self.refilter();
    }

    pub fn select_none(&mut self) {
        self.selected.clear();
        self.refilter();
    }

    /// Recompute `visible` and `metrics` after a filter change.
    pub fn refilter(&mut self) {
        let Some(ds) = &self.dataset else {
            return;
        };
        let selection: BTreeSet<String> = self.selected.iter().cloned().collect();
        self.visible = range_filter(ds, self.from_year, self.to_year, &selection);

        let divisor = self.config.display.unit_divisor;
        self.metrics = self
            .selected
            .iter()
            .map(
                |country| match growth_metric(ds, country, self.from_year, self.to_year, divisor) {
                    Ok(metric) => MetricCard::Ready(metric),
                    Err(e) => MetricCard::Unavailable {
                        country: country.clone(),
                        reason: e.to_string(),
                    },
                },
            )
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::Growth;
    use crate::data::model::YearRange;

    fn obs(code: &str, year: i32, value: f64) -> Observation {
        Observation {
            country_code: code.to_string(),
            year,
            value,
        }
    }

    fn state() -> AppState {
        let mut config = DashboardConfig::load_default().unwrap();
        config.display.unit_divisor = 1.0;
        config.display.default_countries = vec!["FRA".into(), "ESP".into()];
        let mut state = AppState::new(config);
        state.set_dataset(Arc::new(Observations::new(
            vec![
                obs("FRA", 2010, 2646.0),
                obs("FRA", 2020, 2630.0),
                obs("DEU", 2010, f64::NAN),
                obs("DEU", 2020, 3900.0),
                obs("ITA", 2020, 10.0),
            ],
            YearRange::new(2010, 2020).unwrap(),
        )));
        state
    }

    #[test]
    fn default_selection_keeps_only_known_countries() {
        let s = state();
        assert_eq!(s.selected, vec!["FRA"]);
        assert_eq!((s.from_year, s.to_year), (2010, 2020));
        assert_eq!(s.visible.len(), 2);
    }

    #[test]
    fn metrics_follow_the_selection_order() {
        let mut s = state();
        s.toggle_country("ITA");
        s.toggle_country("DEU");

        assert_eq!(s.metrics.len(), 3);
        match &s.metrics[0] {
            MetricCard::Ready(m) => assert_eq!(m.growth.to_string(), "0.99x"),
            other => panic!("unexpected card {other:?}"),
        }
        assert!(
            matches!(&s.metrics[1], MetricCard::Unavailable { country, .. } if country == "ITA")
        );
        assert!(
            matches!(&s.metrics[2], MetricCard::Ready(m) if m.growth == Growth::NotAvailable)
        );
    }

    #[test]
    fn empty_selection_clears_views() {
        let mut s = state();
        s.select_none();
        assert!(s.selected.is_empty());
        assert!(s.visible.is_empty());
        assert!(s.metrics.is_empty());

        s.select_all();
        assert_eq!(s.selected, vec!["FRA", "DEU", "ITA"]);
    }

    #[test]
    fn year_range_is_clamped_and_ordered() {
        let mut s = state();
        s.set_year_range(2030, 1990);
        assert_eq!((s.from_year, s.to_year), (2010, 2020));
        s.set_year_range(2020, 2020);
        assert_eq!(s.visible.len(), 1);
    }

    #[test]
    fn reload_keeps_selection_and_year_window() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inv.csv");
        std::fs::write(
            &path,
            "Country Code,2010,2011,2012\nFRA,1,2,3\nDEU,4,5,6\nITA,7,8,9\n",
        )
        .unwrap();
        let mut config = DashboardConfig::load_default().unwrap();
        config.data.min_year = 2010;
        config.data.max_year = 2012;
        let mut s = AppState::new(config);
        assert!(s.load(&path));
        assert_eq!(s.selected, vec!["FRA", "DEU"]);

        s.toggle_country("FRA");
        s.toggle_country("ITA");
        s.set_year_range(2011, 2012);

        // DEU disappears from the file; ITA stays picked.
        std::fs::write(&path, "Country Code,2010,2011,2012\nFRA,1,2,3\nITA,7,8,9\n").unwrap();
        s.reload();

        assert_eq!(s.selected, vec!["ITA"]);
        assert_eq!((s.from_year, s.to_year), (2011, 2012));
        assert_eq!(s.visible.len(), 2);
        assert_eq!(s.metrics.len(), 1);
    }

    #[test]
    fn failed_reload_keeps_selection() {
        let mut s = state();
        s.toggle_country("DEU");
        s.data_path = PathBuf::from("/definitely/not/here.csv");
        s.reload();
        assert_eq!(s.selected, vec!["FRA", "DEU"]);
    }

    #[test]
    fn failed_load_keeps_previous_dataset() {
        let mut s = state();
        assert!(!s.load(Path::new("/definitely/not/here.csv")));
        assert!(s.dataset.is_some());
        assert!(s.status_message.as_deref().unwrap_or("").starts_with("Error"));
    }
}
