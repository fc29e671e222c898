use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::permissions::{PermissionKind, PermissionStatus};
use crate::{MAX_IMAGE_BYTES, MAX_UPLOAD_DIMENSION};

pub const DEFAULT_PICKER_QUALITY: u8 = 100;

/// Permission prompts, the native camera/library pickers and the
/// settings redirect, all performed by the shell.
pub struct Camera<Ev> {
    context: CapabilityContext<CameraOperation, Ev>,
}

impl<Ev> Clone for Camera<Ev> {
    fn clone(&self) -> Self {
        Self {
            context: self.context.clone(),
        }
    }
}

impl<Ev> Capability<Ev> for Camera<Ev> {
    type Operation = CameraOperation;
    type MappedSelf<MappedEv> = Camera<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Camera::new(self.context.map_event(f))
    }
}

impl<Ev> Camera<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<CameraOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn check_permission<F>(&self, kind: PermissionKind, make_event: F)
    where
        F: FnOnce(CameraResult) -> Ev + Send + Sync + 'static,
    {
        self.request(CameraOperation::CheckPermission { kind }, make_event);
    }

    /// Shows the OS dialog if the user has not decided yet.
    pub fn request_permission<F>(&self, kind: PermissionKind, make_event: F)
    where
        F: FnOnce(CameraResult) -> Ev + Send + Sync + 'static,
    {
        self.request(CameraOperation::RequestPermission { kind }, make_event);
    }

    /// Suspends until the user picks or shoots an image, or cancels.
    pub fn acquire<F>(&self, source: ImageSource, config: AcquireConfig, make_event: F)
    where
        F: FnOnce(CameraResult) -> Ev + Send + Sync + 'static,
    {
        let config = config.validated();
        self.request(CameraOperation::Acquire { source, config }, make_event);
    }

    pub fn open_settings(&self) {
        self.context.spawn({
            let context = self.context.clone();
            async move {
                context.notify_shell(CameraOperation::OpenSettings).await;
            }
        });
    }

    fn request<F>(&self, operation: CameraOperation, make_event: F)
    where
        F: FnOnce(CameraResult) -> Ev + Send + Sync + 'static,
    {
        self.context.spawn({
            let context = self.context.clone();
            async move {
                let result = context.request_from_shell(operation).await;
                context.update_app(make_event(result));
            }
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum CameraOperation {
    CheckPermission { kind: PermissionKind },
    RequestPermission { kind: PermissionKind },
    Acquire { source: ImageSource, config: AcquireConfig },
    OpenSettings,
}

impl Operation for CameraOperation {
    type Output = CameraResult;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    Camera,
    Library,
}

impl ImageSource {
    #[must_use]
    pub const fn permission_kind(self) -> PermissionKind {
        match self {
            Self::Camera => PermissionKind::Camera,
            Self::Library => PermissionKind::MediaLibrary,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Camera => "camera",
            Self::Library => "library",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageFormat {
    #[default]
    Jpeg,
    Png,
    Heic,
    WebP,
}

impl ImageFormat {
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Heic => "image/heic",
            Self::WebP => "image/webp",
        }
    }

    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        if &data[4..8] == b"ftyp" && matches!(&data[8..12], b"heic" | b"heix" | b"mif1") {
            return Some(Self::Heic);
        }

        None
    }
}

/// Options handed to the native picker. Quality is a percentage; 100 is
/// the picker's "1.0". `max_edge` lets the shell shrink large photos before
/// they cross the bridge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AcquireConfig {
    pub quality: u8,
    pub max_edge: u32,
    pub images_only: bool,
}

impl Default for AcquireConfig {
    fn default() -> Self {
        Self {
            quality: DEFAULT_PICKER_QUALITY,
            max_edge: MAX_UPLOAD_DIMENSION,
            images_only: true,
        }
    }
}

impl AcquireConfig {
    #[must_use]
    pub fn validated(mut self) -> Self {
        self.quality = self.quality.clamp(1, 100);
        self.max_edge = self.max_edge.clamp(1, MAX_UPLOAD_DIMENSION);
        self.images_only = true;
        self
    }
}

/// An image handed back by the picker. Deserializing runs the same checks as
/// [`CapturedImage::new`], so a shell cannot smuggle in empty or mislabelled
/// bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RawCapturedImage")]
pub struct CapturedImage {
    #[serde(with = "serde_bytes")]
    data: Vec<u8>,
    format: ImageFormat,
    width: u32,
    height: u32,
}

#[derive(Deserialize)]
struct RawCapturedImage {
    #[serde(with = "serde_bytes")]
    data: Vec<u8>,
    format: ImageFormat,
    width: u32,
    height: u32,
}

impl TryFrom<RawCapturedImage> for CapturedImage {
    type Error = CameraError;

    fn try_from(raw: RawCapturedImage) -> Result<Self, Self::Error> {
        Self::new(raw.data, raw.format, raw.width, raw.height)
    }
}

impl CapturedImage {
    pub fn new(
        data: Vec<u8>,
        format: ImageFormat,
        width: u32,
        height: u32,
    ) -> Result<Self, CameraError> {
        if data.is_empty() {
            return Err(CameraError::InvalidImage {
                reason: "image data is empty".to_string(),
            });
        }

        if data.len() > MAX_IMAGE_BYTES {
            return Err(CameraError::ImageTooLarge {
                size: data.len(),
                max: MAX_IMAGE_BYTES,
            });
        }

        if let Some(detected) = ImageFormat::from_magic_bytes(&data) {
            if detected != format {
                return Err(CameraError::InvalidImage {
                    reason: format!(
                        "format mismatch: declared {format:?} but detected {detected:?}"
                    ),
                });
            }
        }

        Ok(Self {
            data,
            format,
            width,
            height,
        })
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub const fn format(&self) -> ImageFormat {
        self.format
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum CameraOutput {
    Permission(PermissionStatus),
    Image(CapturedImage),
    Cancelled,
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum CameraError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("camera unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("capture failed: {reason}")]
    CaptureFailed { reason: String },

    #[error("another picker is already open")]
    Busy,

    #[error("invalid image: {reason}")]
    InvalidImage { reason: String },

    #[error("image too large: {size} bytes exceeds maximum of {max} bytes")]
    ImageTooLarge { size: usize, max: usize },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl CameraError {
    #[must_use]
    pub const fn is_permission_error(&self) -> bool {
        matches!(self, Self::PermissionDenied)
    }
}

pub type CameraResult = Result<CameraOutput, CameraError>;
