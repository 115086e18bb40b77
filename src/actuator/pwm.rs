// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! PWM 舵机 (PWM hobby servo)
//!
//! 50Hz 周期, 脉宽在 `min_pulse_us..=max_pulse_us` 之间线性对应 `0..=actuation_range` 度

use embedded_hal::pwm::SetDutyCycle;
use serde::{Deserialize, Serialize};

use super::ServoChannel;
use crate::error::{Result, TurretError};

/// 50Hz = 20ms
const PERIOD_US: u32 = 20_000;

/// 舵机脉宽参数
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseConfig {
    pub actuation_range: u16, // 可动角度 (度)
    pub min_pulse_us: u32,    // 0° 脉宽
    pub max_pulse_us: u32,    // 满量程脉宽
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            actuation_range: 180,
            min_pulse_us: 750,
            max_pulse_us: 2250,
        }
    }
}

pub struct PwmServo<C> {
    channel: u8,
    pwm: C,
    pulse: PulseConfig,
}

impl<C: SetDutyCycle> PwmServo<C> {
    pub fn new(channel: u8, pwm: C, pulse: PulseConfig) -> Self {
        Self {
            channel,
            pwm,
            pulse,
        }
    }

    /// 角度 → 占空比 (超出可动范围的角度先限位)
    pub fn angle_to_duty(&self, angle: i32) -> u16 {
        let range = self.pulse.actuation_range as i32;
        let angle = angle.clamp(0, range) as u32;
        let span = self.pulse.max_pulse_us.saturating_sub(self.pulse.min_pulse_us);
        let pulse_us = if range == 0 {
            self.pulse.min_pulse_us
        } else {
            self.pulse.min_pulse_us + angle * span / range as u32
        };
        let duty = pulse_us as u64 * self.pwm.max_duty_cycle() as u64 / PERIOD_US as u64;
        duty.min(u16::MAX as u64) as u16
    }
}

impl<C: SetDutyCycle> ServoChannel for PwmServo<C> {
    fn channel(&self) -> u8 {
        self.channel
    }

    fn set_angle(&mut self, angle: i32) -> Result<()> {
        let duty = self.angle_to_duty(angle);
        self.pwm
            .set_duty_cycle(duty)
            .map_err(|e| TurretError::Actuator {
                channel: self.channel,
                reason: format!("{:?}", e),
            })
    }
}
