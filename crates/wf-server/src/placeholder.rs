//! Placeholder cover served when a show or movie has no cover blob.

use std::io::Cursor;
use std::sync::OnceLock;

use bytes::Bytes;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use wf_core::{Error, Result};

pub const WIDTH: u32 = 300;
pub const HEIGHT: u32 = 450;
const FILL: Rgb<u8> = Rgb([32, 32, 36]);

static PLACEHOLDER: OnceLock<Bytes> = OnceLock::new();

/// The encoded placeholder JPEG, rendered on first use.
pub fn cover() -> Result<Bytes> {
    if let Some(bytes) = PLACEHOLDER.get() {
        return Ok(bytes.clone());
    }
    let rendered = render()?;
    Ok(PLACEHOLDER.get_or_init(|| rendered).clone())
}

fn render() -> Result<Bytes> {
    let img = RgbImage::from_pixel(WIDTH, HEIGHT, FILL);
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Jpeg)
        .map_err(|e| Error::Internal(format!("Failed to encode placeholder cover: {e}")))?;
    tracing::debug!(bytes = buf.get_ref().len(), "Rendered placeholder cover");
    Ok(Bytes::from(buf.into_inner()))
}
