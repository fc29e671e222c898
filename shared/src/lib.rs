#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod api;
pub mod app;
pub mod capabilities;
pub mod config;
pub mod error;
pub mod event;
pub mod image_processing;
pub mod ingredients;
pub mod model;
pub mod multipart;
pub mod navigation;
pub mod permissions;
pub mod persistence;
pub mod products;
pub mod view;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use config::ApiConfig;
pub use error::{AppError, AppResult, ErrorKind};
pub use event::Event;
pub use model::Model;
pub use navigation::Screen;
pub use view::ViewModel;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const UPLOAD_PATH: &str = "upload";
pub const COMPARE_PATH: &str = "compare_products";
pub const UPLOAD_FIELD_NAME: &str = "file";
pub const UPLOAD_FILE_NAME: &str = "photo.webp";

pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;
pub const MAX_IMAGE_DIMENSION: u32 = 8192;
pub const MAX_IMAGE_ALLOC: u64 = 256 * 1024 * 1024;
pub const MAX_UPLOAD_DIMENSION: u32 = 1280;
pub const UPLOAD_WEBP_QUALITY: u8 = 85;

pub const MIN_RISK: f64 = 0.0;
pub const MAX_RISK: f64 = 100.0;

pub const DRAFT_STORAGE_KEY: &str = "products_draft_v1";
