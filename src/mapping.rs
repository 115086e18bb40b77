// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 坐标映射 (Coordinate mapping)
//!
//! 将画面像素坐标线性映射为舵机角度

use serde::{Deserialize, Serialize};

use crate::error::{Result, TurretError};

/// 线性插值: 把 `value` 从 `[in_min, in_max]` 映射到 `[out_min, out_max]`, 向零截断
///
/// 超出输入区间的值按同一直线外推。调用者需保证 `in_min != in_max`,
/// 需要校验时使用 [`AxisMapping`]。
pub fn map_value(value: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> i32 {
    // 先乘后除, 端点处结果精确
    let scaled = (value - in_min) * (out_max - out_min) / (in_max - in_min) + out_min;
    scaled.trunc() as i32
}

/// 单轴角度范围 (度)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: i32,
    pub max: i32,
}

impl AxisRange {
    pub fn new(min: i32, max: i32) -> Result<Self> {
        let range = Self { min, max };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min > self.max {
            return Err(TurretError::InvalidAxisRange {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// 中位角度 (启动时的归中位置)
    pub fn center(&self) -> i32 {
        self.min + (self.max - self.min) / 2
    }
}

/// 已校验的单轴映射: 画面坐标区间 → 角度范围
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisMapping {
    in_min: f64,
    in_max: f64,
    output: AxisRange,
}

impl AxisMapping {
    pub fn new(in_min: f64, in_max: f64, output: AxisRange) -> Result<Self> {
        output.validate()?;
        if in_min == in_max || !in_min.is_finite() || !in_max.is_finite() {
            return Err(TurretError::DegenerateRange {
                min: in_min,
                max: in_max,
            });
        }
        Ok(Self {
            in_min,
            in_max,
            output,
        })
    }

    /// 画面维度 `[0, dimension]` → 角度范围
    pub fn for_dimension(dimension: u32, output: AxisRange) -> Result<Self> {
        Self::new(0.0, dimension as f64, output)
    }

    pub fn output(&self) -> AxisRange {
        self.output
    }

    pub fn map(&self, value: i32) -> i32 {
        map_value(
            value as f64,
            self.in_min,
            self.in_max,
            self.output.min as f64,
            self.output.max as f64,
        )
    }
}
