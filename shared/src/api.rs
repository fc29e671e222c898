//! Wire types for the classification and comparison backend, plus the
//! request builders that hand them to the `Http` capability.

use crux_http::{Http, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ApiConfig;
use crate::error::{AppError, AppResult, ErrorKind};
use crate::event::Event;
use crate::image_processing::PreparedImage;
use crate::ingredients::{ClassificationResult, UploadOutcome};
use crate::model::MountId;
use crate::multipart::MultipartForm;
use crate::products::UnitType;
use crate::{
    COMPARE_PATH, MAX_RISK, MIN_RISK, UPLOAD_FIELD_NAME, UPLOAD_FILE_NAME, UPLOAD_PATH,
};

const ACCEPT_JSON: &str = "application/json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub normalized_risk: f64,
    #[serde(default)]
    pub risky_ingredients: Vec<String>,
    #[serde(default)]
    pub classification: String,
    #[serde(default)]
    pub classification_message: String,
}

impl From<UploadResponse> for ClassificationResult {
    fn from(response: UploadResponse) -> Self {
        Self {
            normalized_risk: response.normalized_risk.clamp(MIN_RISK, MAX_RISK),
            risky_ingredients: response.risky_ingredients,
            classification_label: response.classification,
            classification_message: response.classification_message,
        }
    }
}

/// Interprets a 2xx body from `POST /upload`. "Nothing detected" arrives as
/// an empty body, `null` or `{}`.
pub fn classify_upload_body(body: &[u8]) -> AppResult<UploadOutcome> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(UploadOutcome::Empty);
    }

    let value: serde_json::Value = serde_json::from_slice(body).map_err(|e| {
        AppError::new(ErrorKind::Deserialization, "Upload response is not JSON")
            .with_internal(e.to_string())
    })?;

    match value {
        serde_json::Value::Null => Ok(UploadOutcome::Empty),
        serde_json::Value::Object(ref map) if map.is_empty() => Ok(UploadOutcome::Empty),
        serde_json::Value::Object(_) => {
            let response: UploadResponse = serde_json::from_value(value).map_err(|e| {
                AppError::new(ErrorKind::Deserialization, "Unexpected upload response shape")
                    .with_internal(e.to_string())
            })?;
            if !response.normalized_risk.is_finite() {
                return Err(AppError::new(
                    ErrorKind::Deserialization,
                    "normalized_risk is not a finite number",
                ));
            }
            Ok(UploadOutcome::Success(response.into()))
        }
        other => Err(AppError::new(
            ErrorKind::Deserialization,
            "Unexpected upload response shape",
        )
        .with_internal(format!("got {other}"))),
    }
}

/// Folds a finished upload exchange into the outcome shown to the user.
#[must_use]
pub fn upload_outcome(result: crux_http::Result<Response<Vec<u8>>>) -> UploadOutcome {
    match result {
        Ok(mut response) => {
            let body = response.take_body().unwrap_or_default();
            classify_upload_body(&body).unwrap_or_else(UploadOutcome::Failure)
        }
        Err(e) => UploadOutcome::Failure(AppError::from_http_error(&e)),
    }
}

pub fn send_upload(
    http: &Http<Event>,
    config: &ApiConfig,
    mount: MountId,
    image: &PreparedImage,
) -> AppResult<()> {
    let mut form = MultipartForm::new();
    form.add_file(UPLOAD_FIELD_NAME, UPLOAD_FILE_NAME, image.mime_type, &image.data)?;
    let content_type = form.content_type();
    let body = form.finish();
    let url = config.endpoint(UPLOAD_PATH);

    info!(url = %url, bytes = body.len(), "uploading image");
    http.post(url)
        .body_bytes(body)
        .header("Content-Type", content_type.as_str())
        .header("Accept", ACCEPT_JSON)
        .send(move |result| Event::UploadResponse {
            mount,
            result: Box::new(result),
        });
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPayload {
    pub name: String,
    pub package_price: f64,
    pub units_per_package: u32,
    pub quantity_per_unit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareRequest {
    pub products: Vec<ProductPayload>,
    pub unit_type: UnitType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOption {
    pub cost_per_unit: f64,
    #[serde(default)]
    pub products: Vec<String>,
    pub total_cost: f64,
    pub total_units: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompareResponse {
    #[serde(default)]
    pub cheapest_option: Option<PurchaseOption>,
    #[serde(default)]
    pub convenient_option: Option<PurchaseOption>,
    #[serde(default)]
    pub plot1: Option<String>,
    #[serde(default)]
    pub plot2: Option<String>,
    #[serde(default)]
    pub plot3: Option<String>,
}

pub fn send_compare(
    http: &Http<Event>,
    config: &ApiConfig,
    mount: MountId,
    request: &CompareRequest,
) -> AppResult<()> {
    let url = config.endpoint(COMPARE_PATH);
    debug!(url = %url, products = request.products.len(), "comparing products");

    http.post(url)
        .header("Accept", ACCEPT_JSON)
        .body_json(request)
        .map_err(|e| AppError::from_http_error(&e).with_context("stage", "encode"))?
        .expect_json::<CompareResponse>()
        .send(move |result| Event::CompareResponse {
            mount,
            result: Box::new(result),
        });
    Ok(())
}
