use eframe::egui::{self, Ui};

use crate::config::DashboardConfig;
use crate::state::AppState;
use crate::ui::{metrics, panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct InvestDashApp {
    pub state: AppState,
}

impl InvestDashApp {
    /// Build the app and load the configured data file.
    pub fn new(config: DashboardConfig) -> Self {
        let path = config.data.path.clone();
        let mut state = AppState::new(config);
        state.load(&path);
        Self { state }
    }
}

impl eframe::App for InvestDashApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: chart, metrics, table ----
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| dashboard(ui, &self.state));
        });
    }
}

fn dashboard(ui: &mut Ui, state: &AppState) {
    let display = &state.config.display;
    ui.heading(display.title.as_str());

    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("Open a file to view investment data  (File → Open…)");
        });
        return;
    }

    ui.add_space(8.0);
    ui.heading(format!("{} over time", display.indicator_label));
    ui.separator();
    plot::time_series_plot(ui, state, 320.0);

    ui.add_space(16.0);
    ui.heading(format!("{} in {}", display.indicator_label, state.to_year));
    ui.separator();
    if state.selected.is_empty() {
        ui.label("Select at least one country");
    } else {
        metrics::metric_grid(ui, state);
    }

    ui.add_space(16.0);
    egui::CollapsingHeader::new(format!("Data ({} rows)", state.visible.len()))
        .id_salt("data_table")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            metrics::data_table(ui, state);
        });
}
