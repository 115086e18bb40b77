// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 云台错误类型 (Turret errors)

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TurretError {
    #[error("invalid axis range: min {min} > max {max}")]
    InvalidAxisRange { min: i32, max: i32 },

    #[error("degenerate input range: {min} == {max}")]
    DegenerateRange { min: f64, max: f64 },

    #[error("malformed detection: {0}")]
    MalformedDetection(String),

    #[error("actuator channel {channel}: {reason}")]
    Actuator { channel: u8, reason: String },

    #[error("failed to decode frame result: {0}")]
    Decode(String),

    #[error("pipeline: {0}")]
    Pipeline(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, TurretError>;
