// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 执行器系统 (Actuator System)
///
/// 两个独立舵机通道组成云台:
/// - PwmServo:    基于 embedded-hal PWM 通道的舵机 (硬件限位)
/// - DryRunServo: 仅打印日志的空跑舵机 (无硬件调试)
/// - PanTilt:     水平 + 俯仰两轴组合
pub mod dry_run;
pub mod pwm;

pub use dry_run::DryRunServo;
pub use pwm::{PulseConfig, PwmServo};

use crate::error::Result;
use crate::tracking::types::ActuatorState;

/// 舵机通道统一接口
pub trait ServoChannel {
    /// 通道编号
    fn channel(&self) -> u8;

    /// 写入角度 (度)。超出物理范围时由实现自行限位
    fn set_angle(&mut self, angle: i32) -> Result<()>;
}

impl<S: ServoChannel + ?Sized> ServoChannel for Box<S> {
    fn channel(&self) -> u8 {
        (**self).channel()
    }

    fn set_angle(&mut self, angle: i32) -> Result<()> {
        (**self).set_angle(angle)
    }
}

/// 云台 (水平轴 + 俯仰轴)
pub struct PanTilt<P: ServoChannel, T: ServoChannel> {
    pan: P,
    tilt: T,
}

impl<P: ServoChannel, T: ServoChannel> PanTilt<P, T> {
    pub fn new(pan: P, tilt: T) -> Self {
        Self { pan, tilt }
    }

    /// 依次下发水平、俯仰角度
    pub fn command(&mut self, state: ActuatorState) -> Result<()> {
        self.pan.set_angle(state.pan)?;
        self.tilt.set_angle(state.tilt)?;
        Ok(())
    }

    pub fn pan(&self) -> &P {
        &self.pan
    }

    pub fn tilt(&self) -> &T {
        &self.tilt
    }
}
