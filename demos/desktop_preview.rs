//! # Desktop AR Preview
//!
//! Runs the placement flow against a simulated room (floor, table, wall).
//!
//! ## Controls
//!
//! - Enter / button: start the AR session, Escape: end it (or quit)
//! - W/A/S/D, arrow keys, Q/E: move and turn the simulated device
//! - Right mouse drag: look around
//! - Left click: place the model on the reticle
//! - T: simulate lost tracking (platform-initiated end)
//!
//! ## Usage
//!
//! Run with: `cargo run --example desktop_preview -- [MODEL] [CONFIG]`
//!
//! `MODEL` is a path or http(s) URL to a .glb, .gltf or .obj file. Without
//! one, the configured model is used if it exists, otherwise a placeholder box.
//! `CONFIG` defaults to `demos/arplace.toml`.

use std::path::PathBuf;

use anyhow::Context;
use arplace::{assets::AssetSource, ArConfig, PreviewApp};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let model = args.next();
    let config_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("demos/arplace.toml"));

    let mut config = ArConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    match model {
        Some(url) => config.model.url = url,
        None => {
            if let AssetSource::File(path) = AssetSource::parse(&config.model.url) {
                if !path.exists() {
                    log::info!("{} not found, placing a placeholder box", path.display());
                    config.model.url.clear();
                }
            }
        }
    }

    let app = PreviewApp::new(config).context("creating event loop")?;
    app.run().context("running preview")?;
    Ok(())
}
