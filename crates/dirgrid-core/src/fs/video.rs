//! First-frame extraction for video thumbnails.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;

use crate::error::{CoreError, CoreResult};
use crate::fs::classify::extension;

/// Off-screen video decoder.
///
/// Implementations load the media, wait until a frame is available and
/// return that frame as encoded still-image bytes (any format the `image`
/// crate can decode). They must release every temporary resource before
/// returning.
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    async fn first_frame(&self, name: &str, media: Vec<u8>) -> CoreResult<Vec<u8>>;
}

/// Extracts frames by running an external `ffmpeg`.
#[derive(Debug, Clone)]
pub struct FfmpegFrameExtractor {
    program: PathBuf,
}

impl FfmpegFrameExtractor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for FfmpegFrameExtractor {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl FrameExtractor for FfmpegFrameExtractor {
    async fn first_frame(&self, name: &str, media: Vec<u8>) -> CoreResult<Vec<u8>> {
        // The decoder needs a seekable file; keep the container's extension
        // so format probing works.
        let temp = tempfile::Builder::new()
            .prefix("dirgrid-")
            .suffix(&extension(name))
            .tempfile()
            .map_err(|e| CoreError::io(name, e))?;
        tokio::fs::write(temp.path(), &media)
            .await
            .map_err(|e| CoreError::io(name, e))?;

        let output = tokio::process::Command::new(&self.program)
            .args(["-hide_banner", "-loglevel", "error", "-i"])
            .arg(temp.path())
            .args(["-frames:v", "1", "-f", "image2pipe", "-vcodec", "png", "pipe:1"])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CoreError::Decode(format!(
                        "video decoder unavailable: {}",
                        self.program.display()
                    ))
                } else {
                    CoreError::io(name, e)
                }
            })?;
        drop(temp);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CoreError::Decode(format!("{name}: {}", stderr.trim())));
        }
        if output.stdout.is_empty() {
            return Err(CoreError::Decode(format!("{name}: no frame available")));
        }
        Ok(output.stdout)
    }
}
