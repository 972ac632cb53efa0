// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Segmark - segmentation dataset annotator
//!
//! A desktop tool for building segmentation datasets: point-prompted
//! mask prediction with manual brush, rectangle-erase and lasso editing,
//! plus per-item text and translation.

mod app;
mod config;
mod io;
mod models;
mod segment;
mod session;
mod tools;
mod translate;
mod ui;
mod util;

use anyhow::Result;
use app::SegmarkApp;
use config::Config;

fn main() -> Result<()> {
    env_logger::init();

    let config = Config::load()?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([900.0, 600.0])
            .with_title("Segmark - Segmentation Annotator"),
        ..Default::default()
    };

    eframe::run_native(
        "Segmark",
        options,
        Box::new(|_cc| Ok(Box::new(SegmarkApp::new(config)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
