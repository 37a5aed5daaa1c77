//! Thumbnail generation.
//!
//! Each previewable file is turned into a [`RenderableImage`] on its own:
//! raster images are decoded and downscaled, SVGs are passed through, and
//! videos contribute their first frame. A failure only affects the file it
//! happened on.

use std::io::Cursor;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::{DynamicImage, GenericImageView, ImageFormat, RgbaImage};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use tokio::sync::Semaphore;

use crate::config::ThumbnailConfig;
use crate::error::{CoreError, CoreResult};
use crate::fs::classify::{extension, PreviewClass};
use crate::fs::handle::FileHandle;
use crate::fs::video::{FfmpegFrameExtractor, FrameExtractor};

/// An encoded still image ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderableImage {
    mime: &'static str,
    width: u32,
    height: u32,
    bytes: Vec<u8>,
}

impl RenderableImage {
    pub fn mime(&self) -> &str {
        self.mime
    }

    /// Pixel width. `0` for vector images.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Pixel height. `0` for vector images.
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// `data:` URI embedding the encoded image.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, BASE64.encode(&self.bytes))
    }
}

impl Serialize for RenderableImage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("RenderableImage", 4)?;
        state.serialize_field("mime", self.mime)?;
        state.serialize_field("width", &self.width)?;
        state.serialize_field("height", &self.height)?;
        state.serialize_field("data_uri", &self.to_data_uri())?;
        state.end()
    }
}

/// Produces thumbnails for previewable files.
pub struct ThumbnailPipeline {
    max_dimension: u32,
    extractor: Arc<dyn FrameExtractor>,
    limiter: Option<Semaphore>,
}

impl ThumbnailPipeline {
    pub fn new(config: &ThumbnailConfig) -> Self {
        Self {
            max_dimension: config.max_dimension.max(1),
            extractor: Arc::new(FfmpegFrameExtractor::new(config.ffmpeg_path.clone())),
            limiter: (config.max_concurrent > 0).then(|| Semaphore::new(config.max_concurrent)),
        }
    }

    /// Replaces the video frame extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn FrameExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Generates the preview for one file.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Decode`] if the bytes are not a valid image/video, no
    ///   decoder is available, or `class` is a static icon.
    /// - Any error from reading `source`.
    pub async fn produce(
        &self,
        source: &dyn FileHandle,
        class: PreviewClass,
    ) -> CoreResult<RenderableImage> {
        let is_video = match class {
            PreviewClass::StaticIcon(_) => {
                return Err(CoreError::Decode(format!(
                    "{}: static icons have no thumbnail",
                    source.name()
                )));
            }
            PreviewClass::ImageThumbnail => false,
            PreviewClass::VideoThumbnail => true,
        };

        let _permit = match &self.limiter {
            Some(limiter) => Some(limiter.acquire().await.map_err(|_| CoreError::Cancelled)?),
            None => None,
        };

        let name = source.name().to_string();
        let bytes = source.read_bytes().await?;
        let max = self.max_dimension;

        if is_video {
            let frame = self.extractor.first_frame(&name, bytes).await?;
            run_blocking(move || draw_frame(&name, &frame, max)).await
        } else if extension(&name) == ".svg" {
            svg_passthrough(&name, bytes)
        } else {
            run_blocking(move || decode_raster(&name, &bytes, max)).await
        }
    }
}

async fn run_blocking<F>(job: F) -> CoreResult<RenderableImage>
where
    F: FnOnce() -> CoreResult<RenderableImage> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| CoreError::Decode(format!("decoder task failed: {e}")))?
}

fn decode_raster(name: &str, bytes: &[u8], max: u32) -> CoreResult<RenderableImage> {
    let img = image::load_from_memory(bytes).map_err(|e| CoreError::Decode(format!("{name}: {e}")))?;
    let (width, height) = img.dimensions();
    let (w, h) = fit_within(width, height, max);
    let rgba = img.to_rgba8();
    let scaled = if (w, h) == (width, height) {
        rgba
    } else {
        image::imageops::thumbnail(&rgba, w, h)
    };
    encode_png(name, scaled)
}

/// Draws a decoded video frame onto a fresh raster and encodes it.
fn draw_frame(name: &str, frame: &[u8], max: u32) -> CoreResult<RenderableImage> {
    let frame =
        image::load_from_memory(frame).map_err(|e| CoreError::Decode(format!("{name}: {e}")))?;
    let (width, height) = frame.dimensions();
    let (w, h) = fit_within(width, height, max);
    let scaled = image::imageops::thumbnail(&frame.to_rgba8(), w, h);

    let mut canvas = RgbaImage::new(w, h);
    image::imageops::overlay(&mut canvas, &scaled, 0, 0);
    encode_png(name, canvas)
}

fn svg_passthrough(name: &str, bytes: Vec<u8>) -> CoreResult<RenderableImage> {
    let text = std::str::from_utf8(&bytes)
        .map_err(|_| CoreError::Decode(format!("{name}: SVG is not valid UTF-8")))?;
    if !text.to_ascii_lowercase().contains("<svg") {
        return Err(CoreError::Decode(format!("{name}: no <svg> element")));
    }
    Ok(RenderableImage {
        mime: "image/svg+xml",
        width: 0,
        height: 0,
        bytes,
    })
}

fn encode_png(name: &str, img: RgbaImage) -> CoreResult<RenderableImage> {
    let (width, height) = img.dimensions();
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| CoreError::Decode(format!("{name}: {e}")))?;
    Ok(RenderableImage {
        mime: "image/png",
        width,
        height,
        bytes,
    })
}

/// Scales `(width, height)` down so the longer edge is at most `max`,
/// keeping the aspect ratio. Smaller images are left alone.
fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width.max(1), height.max(1));
    }
    let longest = u64::from(width.max(height));
    let scale = |edge: u32| ((u64::from(edge) * u64::from(max)) / longest).max(1) as u32;
    (scale(width), scale(height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::classify::IconId;
    use crate::fs::memory::MemoryFile;
    use async_trait::async_trait;
    use image::Rgba;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 10, 10, 255]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn pipeline() -> ThumbnailPipeline {
        ThumbnailPipeline::new(&ThumbnailConfig::default())
    }

    struct StillFrame;

    #[async_trait]
    impl FrameExtractor for StillFrame {
        async fn first_frame(&self, _name: &str, _media: Vec<u8>) -> CoreResult<Vec<u8>> {
            Ok(png_bytes(640, 360))
        }
    }

    #[test]
    fn fit_within_scales_longest_edge() {
        assert_eq!(fit_within(600, 300, 256), (256, 128));
        assert_eq!(fit_within(300, 600, 256), (128, 256));
        assert_eq!(fit_within(100, 50, 256), (100, 50));
        assert_eq!(fit_within(10_000, 1, 256), (256, 1));
    }

    #[tokio::test]
    async fn large_image_is_downscaled_png() {
        let file = MemoryFile::new("big.png", png_bytes(600, 300));
        let image = pipeline()
            .produce(&file, PreviewClass::ImageThumbnail)
            .await
            .unwrap();
        assert_eq!(image.mime(), "image/png");
        assert_eq!((image.width(), image.height()), (256, 128));
        let decoded = image::load_from_memory(image.bytes()).unwrap();
        assert_eq!(decoded.dimensions(), (256, 128));
    }

    #[tokio::test]
    async fn small_image_keeps_size() {
        let file = MemoryFile::new("icon.jpg", png_bytes(32, 16));
        let image = pipeline()
            .produce(&file, PreviewClass::ImageThumbnail)
            .await
            .unwrap();
        assert_eq!((image.width(), image.height()), (32, 16));
    }

    #[tokio::test]
    async fn corrupt_image_is_decode_failure() {
        let file = MemoryFile::new("broken.png", b"definitely not a png".to_vec());
        let err = pipeline()
            .produce(&file, PreviewClass::ImageThumbnail)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Decode(ref msg) if msg.starts_with("broken.png")));
    }

    #[tokio::test]
    async fn svg_is_passed_through() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"/>"#;
        let file = MemoryFile::new("logo.SVG", svg);
        let image = pipeline()
            .produce(&file, PreviewClass::ImageThumbnail)
            .await
            .unwrap();
        assert_eq!(image.mime(), "image/svg+xml");
        assert_eq!(image.bytes(), svg.as_bytes());
        assert!(image.to_data_uri().starts_with("data:image/svg+xml;base64,"));
    }

    #[tokio::test]
    async fn svg_without_markup_is_decode_failure() {
        let file = MemoryFile::new("fake.svg", "hello");
        let err = pipeline()
            .produce(&file, PreviewClass::ImageThumbnail)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Decode(_)));
    }

    #[tokio::test]
    async fn video_uses_first_frame() {
        let file = MemoryFile::new("clip.mp4", vec![0u8; 64]);
        let image = pipeline()
            .with_extractor(Arc::new(StillFrame))
            .produce(&file, PreviewClass::VideoThumbnail)
            .await
            .unwrap();
        assert_eq!(image.mime(), "image/png");
        assert_eq!((image.width(), image.height()), (256, 144));
    }

    #[tokio::test]
    async fn static_icon_is_rejected() {
        let file = MemoryFile::new("paper.pdf", vec![1]);
        let err = pipeline()
            .produce(&file, PreviewClass::StaticIcon(IconId::Pdf))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Decode(_)));
    }

    #[tokio::test]
    async fn read_failure_propagates() {
        let file = MemoryFile::new("a.png", png_bytes(4, 4)).failing_read();
        let err = pipeline()
            .produce(&file, PreviewClass::ImageThumbnail)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Io { .. }));
    }

    #[tokio::test]
    async fn unbounded_pipeline_works() {
        let config = ThumbnailConfig {
            max_concurrent: 0,
            ..ThumbnailConfig::default()
        };
        let file = MemoryFile::new("a.gif", png_bytes(8, 8));
        let image = ThumbnailPipeline::new(&config)
            .produce(&file, PreviewClass::ImageThumbnail)
            .await
            .unwrap();
        assert_eq!(image.width(), 8);
    }

    #[test]
    fn serializes_data_uri() {
        let image = encode_png("x", RgbaImage::new(2, 2)).unwrap();
        let json = serde_json::to_value(&image).unwrap();
        assert_eq!(json["mime"], "image/png");
        assert_eq!(json["width"], 2);
        assert!(json["data_uri"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,"));
    }
}
