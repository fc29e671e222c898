//! Render, Http and KeyValue are the stock Crux capabilities; only the
//! camera/permission surface is specific to this app.

mod camera;

pub use self::camera::{
    AcquireConfig, Camera, CameraError, CameraOperation, CameraOutput, CameraResult,
    CapturedImage, ImageFormat, ImageSource,
};

pub use crux_core::render::Render;
pub use crux_http::Http;
pub use crux_kv::KeyValue;

use crate::app::App;
use crate::event::Event;

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub render: Render<Event>,
    pub http: Http<Event>,
    pub kv: KeyValue<Event>,
    pub camera: Camera<Event>,
}
