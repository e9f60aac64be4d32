//! Still-frame capture.
//!
//! The orchestrator only ever asks for "the most recent frame"; how frames
//! are produced is up to the [`CaptureProvider`].  The desktop adapter,
//! [`SnapshotCapture`], reads a file that an external camera streamer keeps
//! overwriting.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;

use crate::config::CameraConfig;
use crate::locale::Locale;

/// One encoded still image, ready to embed in an analysis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    pub mime_type: String,
    /// Standard-alphabet, padded base64 of the image bytes.
    pub base64: String,
}

impl EncodedFrame {
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            base64: STANDARD.encode(bytes),
        }
    }
}

/// Camera initialisation failures, reported once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// The camera exists but has not produced a frame yet.
    #[error("camera not ready")]
    NotReady,
    #[error("camera unavailable: {0}")]
    Unavailable(String),
}

impl CaptureError {
    pub fn user_message(&self, locale: &Locale) -> &'static str {
        match self {
            CaptureError::NotReady => locale.errors.camera_not_ready,
            CaptureError::Unavailable(_) => locale.errors.camera_unavailable,
        }
    }
}

#[async_trait]
pub trait CaptureProvider: Send + Sync {
    /// The most recent live frame, or `None` when the stream is not ready or
    /// the capture failed.
    async fn capture_frame(&self) -> Option<EncodedFrame>;
}

// ---------------------------------------------------------------------------
// SnapshotCapture
// ---------------------------------------------------------------------------

pub struct SnapshotCapture {
    path: PathBuf,
    max_age: Option<Duration>,
}

impl SnapshotCapture {
    /// Validate the configuration.  The snapshot file itself may not exist
    /// yet; its directory must.
    pub fn open(config: &CameraConfig) -> Result<Self, CaptureError> {
        let path = config
            .snapshot_path
            .clone()
            .ok_or_else(|| CaptureError::Unavailable("no snapshot path configured".into()))?;

        let dir_ok = path
            .parent()
            .map(|p| p.as_os_str().is_empty() || p.is_dir())
            .unwrap_or(false);
        if !dir_ok {
            return Err(CaptureError::Unavailable(format!(
                "snapshot directory missing for {}",
                path.display()
            )));
        }

        let max_age = (config.max_frame_age_ms > 0)
            .then(|| Duration::from_millis(config.max_frame_age_ms));

        log::info!("camera: reading frames from {}", path.display());
        Ok(Self { path, max_age })
    }

    fn is_stale(&self, modified: SystemTime) -> bool {
        match self.max_age {
            Some(max) => modified.elapsed().map(|age| age > max).unwrap_or(false),
            None => false,
        }
    }
}

#[async_trait]
impl CaptureProvider for SnapshotCapture {
    async fn capture_frame(&self) -> Option<EncodedFrame> {
        let meta = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta,
            Err(e) => {
                log::warn!("camera: no frame at {}: {e}", self.path.display());
                return None;
            }
        };
        if let Ok(modified) = meta.modified() {
            if self.is_stale(modified) {
                log::warn!("camera: latest frame is stale");
                return None;
            }
        }

        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("camera: read failed: {e}");
                return None;
            }
        };

        let Some(mime) = sniff_mime(&bytes) else {
            log::warn!("camera: frame is neither JPEG nor PNG ({} bytes)", bytes.len());
            return None;
        };

        log::debug!("camera: captured {} bytes ({mime})", bytes.len());
        Some(EncodedFrame::from_bytes(&bytes, mime))
    }
}

pub(crate) fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    const PNG: &[u8] = &[0x89, b'P', b'N', b'G'];
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(PNG) {
        Some("image/png")
    } else {
        None
    }
}

/// Bound when no camera could be opened; every capture fails.
pub struct UnavailableCapture;

#[async_trait]
impl CaptureProvider for UnavailableCapture {
    async fn capture_frame(&self) -> Option<EncodedFrame> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale;
    use tempfile::tempdir;

    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

    fn config(path: PathBuf, max_frame_age_ms: u64) -> CameraConfig {
        CameraConfig {
            snapshot_path: Some(path),
            max_frame_age_ms,
        }
    }

    #[test]
    fn open_without_path_is_unavailable() {
        let err = SnapshotCapture::open(&CameraConfig::default()).err().unwrap();
        assert!(matches!(err, CaptureError::Unavailable(_)));
        assert_eq!(
            err.user_message(locale::default_locale()),
            locale::default_locale().errors.camera_unavailable
        );
    }

    #[test]
    fn open_with_missing_directory_is_unavailable() {
        let cfg = config(PathBuf::from("/definitely/not/here/frame.jpg"), 0);
        assert!(matches!(
            SnapshotCapture::open(&cfg),
            Err(CaptureError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn reads_and_encodes_latest_jpeg() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frame.jpg");
        std::fs::write(&path, JPEG).unwrap();

        let cam = SnapshotCapture::open(&config(path, 0)).unwrap();
        let frame = cam.capture_frame().await.unwrap();
        assert_eq!(frame.mime_type, "image/jpeg");
        assert_eq!(frame.base64, STANDARD.encode(JPEG));
    }

    #[tokio::test]
    async fn missing_frame_file_yields_none() {
        let dir = tempdir().unwrap();
        let cam = SnapshotCapture::open(&config(dir.path().join("frame.jpg"), 0)).unwrap();
        assert!(cam.capture_frame().await.is_none());
    }

    #[tokio::test]
    async fn stale_frame_yields_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frame.jpg");
        std::fs::write(&path, JPEG).unwrap();
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(60))
            .unwrap();

        let cam = SnapshotCapture::open(&config(path, 2_000)).unwrap();
        assert!(cam.capture_frame().await.is_none());
    }

    #[tokio::test]
    async fn unknown_format_yields_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frame.jpg");
        std::fs::write(&path, b"hello").unwrap();
        let cam = SnapshotCapture::open(&config(path, 0)).unwrap();
        assert!(cam.capture_frame().await.is_none());
    }

    #[test]
    fn sniffs_png() {
        assert_eq!(sniff_mime(&[0x89, b'P', b'N', b'G', 0x0D]), Some("image/png"));
    }

    #[tokio::test]
    async fn unavailable_never_captures() {
        assert!(UnavailableCapture.capture_frame().await.is_none());
    }
}
