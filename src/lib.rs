// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

pub mod actuator; // 舵机执行器
pub mod config; // 云台配置参数
pub mod display; // 调试显示
pub mod error;
pub mod mapping; // 坐标 → 角度映射
pub mod pipeline; // 推理流水线边界
pub mod tracking; // 追踪回调与云台状态

pub use crate::config::TurretConfig;
pub use crate::error::{Result, TurretError};
pub use crate::mapping::{map_value, AxisMapping, AxisRange};
pub use crate::pipeline::{FrameSink, InferencePipeline, PipelineConfig, PredictionSource, WorkflowResult};
pub use crate::tracking::{ActuatorState, BBox, FrameSize, TrackingSink, Turret};
