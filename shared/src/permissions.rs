//! OS permission bookkeeping for the Ingredients screen.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionKind {
    Camera,
    MediaLibrary,
}

impl PermissionKind {
    pub const ALL: [Self; 2] = [Self::MediaLibrary, Self::Camera];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Camera => "camera",
            Self::MediaLibrary => "media_library",
        }
    }

    /// What the user is asked to give access to, phrased for the denial modal.
    #[must_use]
    pub const fn subject(self) -> &'static str {
        match self {
            Self::Camera => "la cámara",
            Self::MediaLibrary => "tus imágenes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    #[default]
    #[serde(alias = "undetermined")]
    Unknown,
    Granted,
    Denied,
}

impl PermissionStatus {
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }

    #[must_use]
    pub const fn is_denied(self) -> bool {
        matches!(self, Self::Denied)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PermissionState {
    pub status: PermissionStatus,
}

impl PermissionState {
    #[must_use]
    pub const fn granted(self) -> bool {
        self.status.is_granted()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PermissionSet {
    media_library: PermissionState,
    camera: PermissionState,
}

impl PermissionSet {
    #[must_use]
    pub const fn get(&self, kind: PermissionKind) -> PermissionState {
        match kind {
            PermissionKind::Camera => self.camera,
            PermissionKind::MediaLibrary => self.media_library,
        }
    }

    #[must_use]
    pub const fn is_granted(&self, kind: PermissionKind) -> bool {
        self.get(kind).granted()
    }

    pub fn record(&mut self, kind: PermissionKind, status: PermissionStatus) -> PermissionState {
        let slot = match kind {
            PermissionKind::Camera => &mut self.camera,
            PermissionKind::MediaLibrary => &mut self.media_library,
        };
        slot.status = status;
        *slot
    }
}
