use eframe::egui::{Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::filter::{Growth, GrowthMetric};
use crate::data::format::{format_grouped, format_value};
use crate::state::{AppState, MetricCard};

// ---------------------------------------------------------------------------
// Metric cards
// ---------------------------------------------------------------------------

/// Lay the selected countries' cards out in `metric_columns` columns.
pub fn metric_grid(ui: &mut Ui, state: &AppState) {
    let display = &state.config.display;
    let n_cols = display.metric_columns.max(1);

    for row in state.metrics.chunks(n_cols) {
        ui.columns(n_cols, |cols| {
            for (col, card) in cols.iter_mut().zip(row) {
                match card {
                    MetricCard::Ready(metric) => {
                        ready_card(col, metric, &display.indicator_label, &display.unit_suffix)
                    }
                    MetricCard::Unavailable { country, reason } => {
                        col.label(format!("{country} {}", display.indicator_label));
                        col.label(RichText::new("no data").heading().color(Color32::GRAY))
                            .on_hover_text(reason.as_str());
                    }
                }
            }
        });
        ui.add_space(8.0);
    }
}

fn ready_card(ui: &mut Ui, metric: &GrowthMetric, indicator: &str, suffix: &str) {
    ui.label(format!("{} {indicator}", metric.country_code));
    ui.label(RichText::new(format_value(metric.last_value, suffix)).heading());
    ui.label(RichText::new(delta_text(metric.growth)).color(delta_color(metric.growth)));
}

fn delta_text(growth: Growth) -> String {
    match growth {
        Growth::Multiple(r) if r >= 1.0 => format!("↑ {growth}"),
        Growth::Multiple(_) => format!("↓ {growth}"),
        Growth::NotAvailable => growth.to_string(),
    }
}

fn delta_color(growth: Growth) -> Color32 {
    match growth {
        Growth::Multiple(r) if r >= 1.0 => Color32::from_rgb(0x2e, 0xa0, 0x43),
        Growth::Multiple(_) => Color32::from_rgb(0xd0, 0x3a, 0x3a),
        Growth::NotAvailable => Color32::GRAY,
    }
}

// ---------------------------------------------------------------------------
// Long-format data table
// ---------------------------------------------------------------------------

/// The filtered rows as a Country / Year / Value table.
pub fn data_table(ui: &mut Ui, state: &AppState) {
    let display = &state.config.display;
    let rows = &state.visible;

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .max_scroll_height(240.0)
        .column(Column::auto().at_least(80.0))
        .column(Column::auto().at_least(60.0))
        .column(Column::remainder())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("Country Code");
            });
            header.col(|ui| {
                ui.strong("Year");
            });
            header.col(|ui| {
                ui.strong(format!("{} ({})", display.indicator_label, display.unit_suffix));
            });
        })
        .body(|body| {
            body.rows(18.0, rows.len(), |mut row| {
                let o = &rows[row.index()];
                row.col(|ui| {
                    ui.label(o.country_code.as_str());
                });
                row.col(|ui| {
                    ui.label(o.year.to_string());
                });
                row.col(|ui| {
                    let text = if o.has_value() {
                        format_grouped(o.value / display.unit_divisor, 2)
                    } else {
                        "n/a".to_string()
                    };
                    ui.label(text);
                });
            });
        });
}
