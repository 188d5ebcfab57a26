//! Tray icon, embedded at build time.

use anyhow::{Context, Result};

const ICON_PNG: &[u8] = include_bytes!("../assets/icons/ollama-icon.png");

/// Decoded icon as straight RGBA8 rows.
#[derive(Debug, Clone)]
pub struct RgbaIcon {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

pub fn load() -> Result<RgbaIcon> {
    let image = image::load_from_memory_with_format(ICON_PNG, image::ImageFormat::Png)
        .context("Failed to decode embedded tray icon")?
        .into_rgba8();
    let (width, height) = image.dimensions();
    Ok(RgbaIcon {
        rgba: image.into_raw(),
        width,
        height,
    })
}
