use std::path::PathBuf;

use eframe::egui;
use invest_dash::app::InvestDashApp;
use invest_dash::config::DashboardConfig;

fn main() -> eframe::Result {
    env_logger::init();

    // Optional first argument: path to a JSON config file.
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = match DashboardConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {e:#}");
            std::process::exit(2);
        }
    };
    let title = config.display.title.clone();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(|_cc| Ok(Box::new(InvestDashApp::new(config)))),
    )
}
