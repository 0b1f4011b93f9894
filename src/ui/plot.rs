use std::collections::BTreeMap;

use eframe::egui::Ui;
use egui_plot::{Legend, Line, Plot, PlotPoints};

use crate::data::model::Observation;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Time-series chart (central panel)
// ---------------------------------------------------------------------------

/// Render one line per selected country, x = year, y = scaled value.
pub fn time_series_plot(ui: &mut Ui, state: &AppState, height: f32) {
    let display = &state.config.display;
    let series = series_segments(&state.visible, display.unit_divisor);

    Plot::new("time_series_plot")
        .legend(Legend::default())
        .height(height)
        .x_axis_label("Year")
        .y_axis_label(format!("{} ({})", display.indicator_label, display.unit_suffix))
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for (country, segments) in &series {
                let color = state.color_map.color_for(country);
                // Segments of one country share a name so the legend shows it once.
                for segment in segments {
                    let points: PlotPoints = segment.iter().copied().collect();
                    let line = Line::new(points).name(country).color(color).width(1.5);
                    plot_ui.line(line);
                }
            }
        });
}

/// Group rows by country, sort by year, scale, and split each series at
/// missing values so gaps are drawn as gaps.
pub fn series_segments(rows: &[Observation], divisor: f64) -> BTreeMap<String, Vec<Vec<[f64; 2]>>> {
    let mut by_country: BTreeMap<String, Vec<&Observation>> = BTreeMap::new();
    for row in rows {
        by_country
            .entry(row.country_code.clone())
            .or_default()
            .push(row);
    }

    by_country
        .into_iter()
        .map(|(country, mut rows)| {
            rows.sort_by_key(|o| o.year);
            let mut segments: Vec<Vec<[f64; 2]>> = Vec::new();
            let mut current = Vec::new();
            for o in rows {
                if o.has_value() {
                    current.push([o.year as f64, o.value / divisor]);
                } else if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
            }
            if !current.is_empty() {
                segments.push(current);
            }
            (country, segments)
        })
        .collect()
}
