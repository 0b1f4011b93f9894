use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – year range and country multiselect
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    // ---- Year range ----
    ui.strong("Which years are you interested in?");
    let (lo, hi) = state.year_bounds;
    let mut from = state.from_year;
    let mut to = state.to_year;
    let from_changed = ui
        .add(egui::Slider::new(&mut from, lo..=hi).text("from"))
        .changed();
    let to_changed = ui
        .add(egui::Slider::new(&mut to, lo..=hi).text("to"))
        .changed();
    if from_changed || to_changed {
        // Dragging one handle past the other pushes the other along.
        if from_changed && from > to {
            to = from;
        } else if to_changed && to < from {
            from = to;
        }
        state.set_year_range(from, to);
    }
    ui.separator();

    // ---- Countries ----
    ui.strong("Which countries would you like to view?");
    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("All").clicked() {
            state.select_all();
        }
        if ui.small_button("None").clicked() {
            state.select_none();
        }
    });
    if state.selected.is_empty() {
        ui.colored_label(Color32::YELLOW, "Select at least one country");
    }

    let countries: Vec<(String, String)> = match &state.dataset {
        Some(ds) => state
            .countries
            .iter()
            .map(|c| (c.clone(), ds.name_of(c).to_string()))
            .collect(),
        None => Vec::new(),
    };
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (country, name) in &countries {
                let mut checked = state.is_selected(country);
                let text = RichText::new(country).color(state.color_map.color_for(country));
                if ui
                    .checkbox(&mut checked, text)
                    .on_hover_text(name.as_str())
                    .changed()
                {
                    state.toggle_country(country);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{}: {} observations, {} visible",
                state.data_path.display(),
                ds.len(),
                state.visible.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open investment data")
        .add_filter("Supported files", &["csv", "txt", "parquet", "pq"])
        .add_filter("CSV", &["csv", "txt"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.load(&path);
    }
}
