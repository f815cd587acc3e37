// src/main.rs
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
mod gui;
use biosignal_cine::config::{default_config_path, load_config};
use eframe::egui;
// 入口函数
fn main() -> eframe::Result<()> {
    env_logger::init();
    let config = load_config(&default_config_path());
    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1280.0, 860.0])
        .with_min_inner_size([960.0, 640.0])
        .with_title("Biosignal Cine");
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "biosignal-cine",
        options,
        Box::new(move |cc| Box::new(gui::CineApp::new(cc, config))),
    )
}
