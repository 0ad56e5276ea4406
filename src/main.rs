mod api;
mod app;
mod application;
mod domain;
mod ui;
mod utils;

use std::error::Error;

use iced::window;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::{FetchClient, FetchConfig};
use crate::application::Downloader;
use crate::domain::Catalog;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,simple_catalog_downloader=info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let catalog = Catalog::builtin();
    let downloader = Downloader::new(FetchClient::new(FetchConfig::default())?);
    info!(entries = catalog.entries().len(), "catalog loaded");

    iced::application(
        move || app::DownloadApp::new(catalog, downloader.clone()),
        app::update,
        app::view,
    )
    .title("Simple Catalog Downloader")
    .subscription(app::subscription)
    .window(window::Settings {
        // Closing waits for an active fetch to remove its partial file
        exit_on_close_request: false,
        ..Default::default()
    })
    .run()?;

    Ok(())
}
