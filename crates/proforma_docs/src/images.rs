//! Image fetching and rasterization for the signature and photo columns.
//!
//! Any failure along the way (no URL, network error, non-2xx status,
//! undecodable bytes) yields `None`, which every exporter renders as an empty
//! cell. Nothing here retries.

use std::io::Cursor;

use anyhow::{Context, Result};
use async_trait::async_trait;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tracing::debug;

use crate::schema::ImageKind;

// ---------------------------------------------------------------------------
// Fetching
// ---------------------------------------------------------------------------

/// Fallible image retrieval: bytes on success, `None` on any failure.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Option<Vec<u8>>;
}

/// Fetches images over HTTP(S).
pub struct HttpImageSource {
    client: reqwest::Client,
}

impl HttpImageSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpImageSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, url: &str) -> Option<Vec<u8>> {
        if url::Url::parse(url).is_err() {
            debug!(%url, "skipping image with unparseable URL");
            return None;
        }
        let resp = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                debug!(%url, error = %e, "image request failed");
                return None;
            }
        };
        if !resp.status().is_success() {
            debug!(%url, status = %resp.status(), "image request returned failure status");
            return None;
        }
        match resp.bytes().await {
            Ok(bytes) => Some(bytes.to_vec()),
            Err(e) => {
                debug!(%url, error = %e, "failed to read image body");
                None
            }
        }
    }
}

/// Source that never returns an image. Useful for text-only exports.
pub struct NoImages;

#[async_trait]
impl ImageSource for NoImages {
    async fn fetch(&self, _url: &str) -> Option<Vec<u8>> {
        None
    }
}

// ---------------------------------------------------------------------------
// Rasterization
// ---------------------------------------------------------------------------

/// A decoded image scaled to fit its column's box, flattened onto white.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub kind: ImageKind,
    pub pixels: RgbImage,
}

impl PreparedImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// PNG encoding for formats that embed image files.
    pub fn png(&self) -> Result<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(self.pixels.clone())
            .write_to(&mut buf, ImageFormat::Png)
            .context("Failed to encode PNG")?;
        Ok(buf.into_inner())
    }
}

/// Decode `bytes` and scale them into `kind`'s box, keeping the aspect ratio.
pub fn rasterize(bytes: &[u8], kind: ImageKind) -> Result<PreparedImage> {
    let img = image::load_from_memory(bytes).context("Failed to decode image")?;
    let (w, h) = kind.box_px();
    let resized = img.resize(w, h, FilterType::Triangle);
    Ok(PreparedImage {
        kind,
        pixels: flatten_on_white(&resized),
    })
}

/// Composite any alpha channel onto a white background. Transparent signature
/// scans would otherwise come out black.
fn flatten_on_white(img: &DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, px) in rgba.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha)) / 255) as u8;
        out.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    out
}

/// Fetch and rasterize one image cell. `None` when the URL is absent or any
/// step fails.
pub async fn load_image(
    source: &dyn ImageSource,
    url: Option<&str>,
    kind: ImageKind,
) -> Option<PreparedImage> {
    let url = url?;
    let bytes = source.fetch(url).await?;
    match rasterize(&bytes, kind) {
        Ok(img) => Some(img),
        Err(e) => {
            debug!(%url, error = %format!("{e:#}"), "dropping undecodable image");
            None
        }
    }
}
