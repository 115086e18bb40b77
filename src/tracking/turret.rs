// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 云台控制 (Turret control)
//! 画面坐标 → 舵机角度 → 下发

use log::info;

use super::types::{ActuatorState, FrameSize};
use crate::actuator::{PanTilt, ServoChannel};
use crate::error::Result;
use crate::mapping::{AxisMapping, AxisRange};

pub struct Turret<P: ServoChannel, T: ServoChannel> {
    axes: PanTilt<P, T>,
    pan: AxisMapping,
    tilt: AxisMapping,
    state: ActuatorState,
}

impl<P: ServoChannel, T: ServoChannel> Turret<P, T> {
    /// 校验画面尺寸与角度范围; 状态初始化为中位 (尚未下发)
    pub fn new(axes: PanTilt<P, T>, frame: FrameSize, pan: AxisRange, tilt: AxisRange) -> Result<Self> {
        let pan = AxisMapping::for_dimension(frame.width, pan)?;
        let tilt = AxisMapping::for_dimension(frame.height, tilt)?;
        Ok(Self {
            axes,
            state: ActuatorState::centered(pan.output(), tilt.output()),
            pan,
            tilt,
        })
    }

    /// 两轴归中并下发
    pub fn center(&mut self) -> Result<()> {
        let centered = ActuatorState::centered(self.pan.output(), self.tilt.output());
        self.axes.command(centered)?;
        self.state = centered;
        info!("🎯 云台归中: 水平 {}° / 俯仰 {}°", centered.pan, centered.tilt);
        Ok(())
    }

    /// 目标在画面中的坐标 → 角度
    pub fn target(&self, x: i32, y: i32) -> ActuatorState {
        ActuatorState {
            pan: self.pan.map(x),
            tilt: self.tilt.map(y),
        }
    }

    /// 转向目标。只有两轴都写入成功才更新状态
    pub fn adjust(&mut self, x: i32, y: i32) -> Result<ActuatorState> {
        let target = self.target(x, y);
        self.axes.command(target)?;
        self.state = target;
        Ok(target)
    }

    pub fn state(&self) -> ActuatorState {
        self.state
    }

    pub fn axes(&self) -> &PanTilt<P, T> {
        &self.axes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::DryRunServo;

    fn turret() -> Turret<DryRunServo, DryRunServo> {
        Turret::new(
            PanTilt::new(DryRunServo::new(0, "pan"), DryRunServo::new(1, "tilt")),
            FrameSize {
                width: 640,
                height: 480,
            },
            AxisRange { min: 0, max: 180 },
            AxisRange { min: 0, max: 90 },
        )
        .unwrap()
    }

    #[test]
    fn test_center_commands_both_axes() {
        let mut t = turret();
        t.center().unwrap();
        assert_eq!(t.state(), ActuatorState { pan: 90, tilt: 45 });
        assert_eq!(t.axes().pan().last_angle(), Some(90));
        assert_eq!(t.axes().tilt().last_angle(), Some(45));
    }

    #[test]
    fn test_adjust_maps_center_point() {
        let mut t = turret();
        let state = t.adjust(150, 100).unwrap();
        assert_eq!(state, ActuatorState { pan: 42, tilt: 18 });
        assert_eq!(t.state(), state);
        assert_eq!(t.axes().pan().writes(), 1);
    }

    #[test]
    fn test_zero_sized_frame_is_rejected() {
        let result = Turret::new(
            PanTilt::new(DryRunServo::new(0, "pan"), DryRunServo::new(1, "tilt")),
            FrameSize { width: 0, height: 480 },
            AxisRange { min: 0, max: 180 },
            AxisRange { min: 0, max: 90 },
        );
        assert!(result.is_err());
    }
}
