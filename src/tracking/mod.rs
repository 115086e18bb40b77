// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 追踪系统 (Tracking System)
///
/// 由流水线分发线程逐帧驱动
/// - Turret:       画面坐标 → 舵机角度, 持有云台状态
/// - TrackingSink: 每帧回调, 取第一个检测框并转动云台
pub mod sink;
pub mod turret;
pub mod types;

pub use sink::{SinkStats, TrackingSink};
pub use turret::Turret;
pub use types::{ActuatorState, BBox, FrameSize};
