// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 云台追踪数据结构定义
/// Data structures for pan-tilt tracking
use crate::mapping::AxisRange;

// ========== 数据结构 ==========

/// 检测框 (Detection bounding box)
#[derive(Clone, Debug, PartialEq)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub confidence: Option<f32>,
    pub class_name: Option<String>,
}

impl BBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            confidence: None,
            class_name: None,
        }
    }

    /// 像素坐标 (向零截断)
    pub fn corners(&self) -> (i32, i32, i32, i32) {
        (
            self.x1 as i32,
            self.y1 as i32,
            self.x2 as i32,
            self.y2 as i32,
        )
    }

    /// 获取中心点 (整数坐标, 向下取整)
    pub fn center(&self) -> (i32, i32) {
        let (x1, y1, x2, y2) = self.corners();
        (midpoint(x1, x2), midpoint(y1, y2))
    }
}

/// 两个i32的中点, i64中求和避免溢出; 结果总在两端之间
fn midpoint(a: i32, b: i32) -> i32 {
    (a as i64 + b as i64).div_euclid(2) as i32
}

/// 画面尺寸 (摄像头分辨率)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

/// 云台状态: 最近一次下发的角度
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ActuatorState {
    pub pan: i32,
    pub tilt: i32,
}

impl ActuatorState {
    /// 归中 (启动状态)
    pub fn centered(pan: AxisRange, tilt: AxisRange) -> Self {
        Self {
            pan: pan.center(),
            tilt: tilt.center(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_of_box() {
        let bbox = BBox::new(100.0, 50.0, 200.0, 150.0);
        assert_eq!(bbox.center(), (150, 100));
    }

    #[test]
    fn test_center_truncates_then_floors() {
        // 101.9 → 101, 202.7 → 202, (101 + 202) / 2 = 151
        let bbox = BBox::new(101.9, 10.2, 202.7, 21.0);
        assert_eq!(bbox.corners(), (101, 10, 202, 21));
        assert_eq!(bbox.center(), (151, 15));
    }

    #[test]
    fn test_center_of_huge_box_does_not_overflow() {
        // 3e9 超出 i32, 截断为 i32::MAX
        let bbox = BBox::new(3e9, 0.0, 3e9, 10.0);
        assert_eq!(bbox.center(), (i32::MAX, 5));
        let bbox = BBox::new(-3e9, -3e9, -3e9, 0.0);
        assert_eq!(bbox.center(), (i32::MIN, i32::MIN.div_euclid(2)));
    }

    #[test]
    fn test_centered_state() {
        let state = ActuatorState::centered(
            AxisRange { min: 0, max: 180 },
            AxisRange { min: 0, max: 90 },
        );
        assert_eq!(state, ActuatorState { pan: 90, tilt: 45 });
    }
}
