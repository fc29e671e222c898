//! Ingredients screen: permission gate, image acquisition, upload and the
//! result modal, modelled as a single state machine.
//!
//! Every transition is a plain method on [`IngredientsScreen`] returning the
//! [`Command`] the app should execute next, so the sequencing can be tested
//! without a shell.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::capabilities::{CameraError, CameraOutput, CameraResult, CapturedImage, ImageSource};
use crate::error::AppError;
use crate::model::MountId;
use crate::permissions::{PermissionKind, PermissionSet, PermissionStatus};

pub const PERMISSION_DENIED_TITLE: &str = "Permiso denegado";
pub const EMPTY_RESULT_TITLE: &str = "Sin ingredientes";
pub const EMPTY_RESULT_BODY: &str = "No se han detectado ingredientes en la imagen";
pub const ERROR_TITLE: &str = "Error";
pub const UPLOAD_FAILED_BODY: &str = "Ocurrió un error al subir la imagen.";
pub const ACQUISITION_FAILED_BODY: &str = "No se ha podido obtener la imagen";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanPhase {
    #[default]
    Idle,
    PermissionPending(PermissionKind),
    PermissionDenied(PermissionKind),
    Acquiring(ImageSource),
    Uploading,
    ResultReady,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskColor {
    Green,
    LightGreen,
    Yellow,
    Orange,
    Red,
}

impl RiskColor {
    /// Each band includes its upper boundary: 20 is green, 20.5 is lightgreen.
    #[must_use]
    pub fn from_risk(risk: f64) -> Self {
        if risk <= 20.0 {
            Self::Green
        } else if risk <= 40.0 {
            Self::LightGreen
        } else if risk <= 60.0 {
            Self::Yellow
        } else if risk <= 80.0 {
            Self::Orange
        } else {
            Self::Red
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::LightGreen => "lightgreen",
            Self::Yellow => "yellow",
            Self::Orange => "orange",
            Self::Red => "red",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub normalized_risk: f64,
    pub risky_ingredients: Vec<String>,
    pub classification_label: String,
    pub classification_message: String,
}

impl ClassificationResult {
    #[must_use]
    pub fn risk_color(&self) -> RiskColor {
        RiskColor::from_risk(self.normalized_risk)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Success(ClassificationResult),
    Empty,
    Failure(AppError),
}

/// What the confirm button of the current modal does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmAction {
    Dismiss,
    OpenSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Modal {
    pub title: String,
    pub body: String,
    pub result: Option<ClassificationResult>,
    pub confirm: ConfirmAction,
    pub show_cancel: bool,
}

impl Modal {
    fn permission_denied(kind: PermissionKind) -> Self {
        Self {
            title: PERMISSION_DENIED_TITLE.to_string(),
            body: format!("Es necesario el acceso a {} para continuar.", kind.subject()),
            result: None,
            confirm: ConfirmAction::OpenSettings,
            show_cancel: true,
        }
    }

    fn error(body: &str) -> Self {
        Self {
            title: ERROR_TITLE.to_string(),
            body: body.to_string(),
            result: None,
            confirm: ConfirmAction::Dismiss,
            show_cancel: false,
        }
    }

    fn from_outcome(outcome: UploadOutcome) -> Self {
        match outcome {
            UploadOutcome::Success(result) => Self {
                title: format!("Alimento de {}", result.classification_label),
                body: String::new(),
                result: Some(result),
                confirm: ConfirmAction::Dismiss,
                show_cancel: false,
            },
            UploadOutcome::Empty => Self {
                title: EMPTY_RESULT_TITLE.to_string(),
                body: EMPTY_RESULT_BODY.to_string(),
                result: None,
                confirm: ConfirmAction::Dismiss,
                show_cancel: false,
            },
            UploadOutcome::Failure(_) => Self::error(UPLOAD_FAILED_BODY),
        }
    }
}

/// Side-effects requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CheckPermission(PermissionKind),
    RequestPermission(PermissionKind),
    Acquire(ImageSource),
    Upload(CapturedImage),
    OpenSettings,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct IngredientsScreen {
    /// Which mount of the screen this is. Capability replies carry it so a
    /// reply to an earlier visit is never applied to this one.
    pub mount_id: MountId,
    pub phase: ScanPhase,
    pub permissions: PermissionSet,
    pub deferred: Option<ImageSource>,
    pub modal: Option<Modal>,
}

impl IngredientsScreen {
    #[must_use]
    pub fn new(mount_id: MountId) -> Self {
        Self {
            mount_id,
            ..Self::default()
        }
    }

    /// Silent status queries, run on mount and whenever the app returns to
    /// the foreground.
    #[must_use]
    pub fn permission_checks() -> Vec<Command> {
        PermissionKind::ALL
            .into_iter()
            .map(Command::CheckPermission)
            .collect()
    }

    #[must_use]
    pub fn loading(&self) -> bool {
        self.phase == ScanPhase::Uploading
    }

    #[must_use]
    pub fn can_trigger(&self) -> bool {
        self.phase == ScanPhase::Idle
    }

    /// "Subir imagen" / "Tomar imagen".
    pub fn trigger(&mut self, source: ImageSource) -> Option<Command> {
        if !self.can_trigger() {
            debug!(source = source.name(), phase = ?self.phase, "trigger ignored");
            return None;
        }

        let kind = source.permission_kind();
        if self.permissions.is_granted(kind) {
            self.phase = ScanPhase::Acquiring(source);
            Some(Command::Acquire(source))
        } else {
            self.deferred = Some(source);
            self.phase = ScanPhase::PermissionPending(kind);
            Some(Command::RequestPermission(kind))
        }
    }

    /// Result of a silent status query. Never changes the phase.
    pub fn permission_checked(&mut self, kind: PermissionKind, result: CameraResult) {
        match result {
            Ok(CameraOutput::Permission(status)) => {
                self.permissions.record(kind, status);
            }
            Ok(other) => warn!(kind = kind.name(), ?other, "unexpected permission check output"),
            Err(e) => warn!(kind = kind.name(), error = %e, "permission check failed"),
        }
    }

    /// Result of an explicit request (the OS dialog).
    pub fn permission_resolved(
        &mut self,
        kind: PermissionKind,
        result: CameraResult,
    ) -> Option<Command> {
        if self.phase != ScanPhase::PermissionPending(kind) {
            warn!(kind = kind.name(), phase = ?self.phase, "late permission response ignored");
            return None;
        }

        let status = match result {
            Ok(CameraOutput::Permission(status)) => status,
            Err(CameraError::PermissionDenied) => PermissionStatus::Denied,
            Ok(other) => {
                warn!(kind = kind.name(), ?other, "unexpected permission request output");
                PermissionStatus::Unknown
            }
            Err(e) => {
                warn!(kind = kind.name(), error = %e, "permission request failed");
                PermissionStatus::Unknown
            }
        };
        self.permissions.record(kind, status);
        let deferred = self.deferred.take();

        match status {
            PermissionStatus::Granted => match deferred {
                Some(source) if source.permission_kind() == kind => {
                    self.phase = ScanPhase::Acquiring(source);
                    Some(Command::Acquire(source))
                }
                _ => {
                    self.phase = ScanPhase::Idle;
                    None
                }
            },
            PermissionStatus::Denied => {
                self.deny(kind);
                None
            }
            PermissionStatus::Unknown => {
                self.phase = ScanPhase::Idle;
                None
            }
        }
    }

    pub fn image_acquired(&mut self, source: ImageSource, result: CameraResult) -> Option<Command> {
        if self.phase != ScanPhase::Acquiring(source) {
            warn!(source = source.name(), phase = ?self.phase, "late picker response ignored");
            return None;
        }

        match result {
            Ok(CameraOutput::Cancelled) => {
                debug!(source = source.name(), "picker cancelled");
                self.phase = ScanPhase::Idle;
                None
            }
            Ok(CameraOutput::Image(image)) => {
                debug!(
                    source = source.name(),
                    mime = image.format().mime_type(),
                    bytes = image.data().len(),
                    "image acquired"
                );
                self.phase = ScanPhase::Uploading;
                Some(Command::Upload(image))
            }
            Err(e) if e.is_permission_error() => {
                let kind = source.permission_kind();
                self.permissions.record(kind, PermissionStatus::Denied);
                self.deny(kind);
                None
            }
            Ok(CameraOutput::Permission(_)) => {
                warn!(source = source.name(), "picker answered with a permission status");
                self.show(Modal::error(ACQUISITION_FAILED_BODY));
                None
            }
            Err(e) => {
                warn!(source = source.name(), error = %e, "image acquisition failed");
                self.show(Modal::error(ACQUISITION_FAILED_BODY));
                None
            }
        }
    }

    /// Returns `false` when no upload was in flight.
    pub fn upload_finished(&mut self, outcome: UploadOutcome) -> bool {
        if !self.loading() {
            warn!(phase = ?self.phase, "late upload response ignored");
            return false;
        }
        if let UploadOutcome::Failure(e) = &outcome {
            warn!(error = %e, "upload failed");
        }
        self.show(Modal::from_outcome(outcome));
        true
    }

    /// The modal's confirm button.
    pub fn confirm(&mut self) -> Option<Command> {
        let modal = self.modal.take()?;
        self.phase = ScanPhase::Idle;
        match modal.confirm {
            ConfirmAction::Dismiss => None,
            ConfirmAction::OpenSettings => Some(Command::OpenSettings),
        }
    }

    /// The modal's cancel button, or the platform back gesture on the modal.
    pub fn cancel(&mut self) {
        if self.modal.as_ref().is_some_and(|m| m.show_cancel) {
            self.modal = None;
            self.phase = ScanPhase::Idle;
        }
    }

    fn deny(&mut self, kind: PermissionKind) {
        self.deferred = None;
        self.phase = ScanPhase::PermissionDenied(kind);
        self.modal = Some(Modal::permission_denied(kind));
    }

    fn show(&mut self, modal: Modal) {
        self.phase = ScanPhase::ResultReady;
        self.modal = Some(modal);
    }
}
