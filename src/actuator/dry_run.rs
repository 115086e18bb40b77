// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 空跑舵机 - 不接硬件, 只记录并打印角度

use log::info;

use super::ServoChannel;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct DryRunServo {
    channel: u8,
    name: String,
    last_angle: Option<i32>,
    writes: u64,
}

impl DryRunServo {
    pub fn new(channel: u8, name: impl Into<String>) -> Self {
        Self {
            channel,
            name: name.into(),
            last_angle: None,
            writes: 0,
        }
    }

    pub fn last_angle(&self) -> Option<i32> {
        self.last_angle
    }

    pub fn writes(&self) -> u64 {
        self.writes
    }
}

impl ServoChannel for DryRunServo {
    fn channel(&self) -> u8 {
        self.channel
    }

    fn set_angle(&mut self, angle: i32) -> Result<()> {
        info!("🎯 [{}] 通道{} → {}°", self.name, self.channel, angle);
        self.last_angle = Some(angle);
        self.writes += 1;
        Ok(())
    }
}
