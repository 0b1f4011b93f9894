use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{FromColor, Hsl, Srgb};

// ---------------------------------------------------------------------------
// Country → Color32
// ---------------------------------------------------------------------------

/// Stable colour per country code, assigned over every country in the
/// dataset so a line keeps its colour when the selection changes.
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
}

impl ColorMap {
    /// One hue per country, spread evenly around the wheel in file order.
    pub fn new(countries: &[String]) -> Self {
        let count = countries.len();
        let mapping = countries
            .iter()
            .enumerate()
            .map(|(slot, code)| (code.clone(), Self::slot_color(slot, count)))
            .collect();
        ColorMap { mapping }
    }

    pub fn color_for(&self, country: &str) -> Color32 {
        self.mapping.get(country).copied().unwrap_or(Color32::GRAY)
    }

    fn slot_color(slot: usize, count: usize) -> Color32 {
        let hue = 360.0 * slot as f32 / count.max(1) as f32;
        let rgb: Srgb<u8> = Srgb::from_color(Hsl::new(hue, 0.75, 0.55)).into_format();
        Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
    }
}
