use eframe::egui;

use tubefetch::app::TubeFetchApp;
use tubefetch::config::{Settings, APP_NAME};

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::default();
    log::info!("default download folder: {}", settings.default_root.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([780.0, 720.0])
            .with_min_inner_size([760.0, 420.0])
            .with_title(APP_NAME),
        ..Default::default()
    };

    let app = TubeFetchApp::new(settings);

    eframe::run_native(
        APP_NAME,
        options,
        Box::new(|cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::light());
            Box::new(app)
        }),
    )
}
