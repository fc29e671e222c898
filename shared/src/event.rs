use crux_http::Response;
use crux_kv::error::KeyValueError;
use serde::{Deserialize, Serialize};

use crate::api::CompareResponse;
use crate::capabilities::{CameraResult, ImageSource};
use crate::model::MountId;
use crate::navigation::Screen;
use crate::permissions::PermissionKind;
use crate::products::{ProductField, UnitType};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum Event {
    // lifecycle
    AppStarted,
    AppForegrounded,
    Configure {
        api_base_url: String,
    },

    // navigation
    Navigate(Screen),
    NavigateBack,

    // ingredients
    UploadPressed,
    CameraPressed,
    ModalConfirmed,
    ModalCancelled,

    // products
    AddProductRow,
    RemoveProductRow,
    ProductFieldChanged {
        index: usize,
        field: ProductField,
        value: String,
    },
    UnitSelected {
        unit: UnitType,
    },
    CompareRequested,
    DismissAlert,

    // capability responses, never sent by the shell
    // `mount` is the screen mount that issued the request.
    #[serde(skip)]
    PermissionChecked {
        mount: MountId,
        kind: PermissionKind,
        result: Box<CameraResult>,
    },
    #[serde(skip)]
    PermissionResolved {
        mount: MountId,
        kind: PermissionKind,
        result: Box<CameraResult>,
    },
    #[serde(skip)]
    ImageAcquired {
        mount: MountId,
        source: ImageSource,
        result: Box<CameraResult>,
    },
    #[serde(skip)]
    UploadResponse {
        mount: MountId,
        result: Box<crux_http::Result<Response<Vec<u8>>>>,
    },
    #[serde(skip)]
    CompareResponse {
        mount: MountId,
        result: Box<crux_http::Result<Response<CompareResponse>>>,
    },
    #[serde(skip)]
    DraftLoaded(Result<Option<Vec<u8>>, KeyValueError>),
    #[serde(skip)]
    DraftSaved(Result<Option<Vec<u8>>, KeyValueError>),
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AppStarted => "app_started",
            Self::AppForegrounded => "app_foregrounded",
            Self::Configure { .. } => "configure",
            Self::Navigate(_) => "navigate",
            Self::NavigateBack => "navigate_back",
            Self::UploadPressed => "upload_pressed",
            Self::CameraPressed => "camera_pressed",
            Self::ModalConfirmed => "modal_confirmed",
            Self::ModalCancelled => "modal_cancelled",
            Self::AddProductRow => "add_product_row",
            Self::RemoveProductRow => "remove_product_row",
            Self::ProductFieldChanged { .. } => "product_field_changed",
            Self::UnitSelected { .. } => "unit_selected",
            Self::CompareRequested => "compare_requested",
            Self::DismissAlert => "dismiss_alert",
            Self::PermissionChecked { .. } => "permission_checked",
            Self::PermissionResolved { .. } => "permission_resolved",
            Self::ImageAcquired { .. } => "image_acquired",
            Self::UploadResponse { .. } => "upload_response",
            Self::CompareResponse { .. } => "compare_response",
            Self::DraftLoaded(_) => "draft_loaded",
            Self::DraftSaved(_) => "draft_saved",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::Navigate(_)
                | Self::NavigateBack
                | Self::UploadPressed
                | Self::CameraPressed
                | Self::ModalConfirmed
                | Self::ModalCancelled
                | Self::AddProductRow
                | Self::RemoveProductRow
                | Self::ProductFieldChanged { .. }
                | Self::UnitSelected { .. }
                | Self::CompareRequested
                | Self::DismissAlert
        )
    }
}
