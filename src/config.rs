// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 云台配置 - 通过JSON文件调整参数

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::actuator::PulseConfig;
use crate::error::{Result, TurretError};
use crate::mapping::AxisRange;
use crate::pipeline::PipelineConfig;
use crate::tracking::FrameSize;

/// 摄像头分辨率 (坐标映射的输入区间)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub width: u32,
    pub height: u32,
}

impl From<CameraConfig> for FrameSize {
    fn from(c: CameraConfig) -> Self {
        FrameSize {
            width: c.width,
            height: c.height,
        }
    }
}

/// 单轴: 角度范围 + 舵机通道
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub min: i32,
    pub max: i32,
    pub channel: u8,
}

impl AxisConfig {
    pub fn range(&self) -> AxisRange {
        AxisRange {
            min: self.min,
            max: self.max,
        }
    }
}

/// 调试显示
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub enabled: bool,
    pub window_title: String,
    pub snapshot_path: PathBuf,
    pub font_path: Option<PathBuf>, // 无字体时只画框不写字
    pub keep_history: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            window_title: "Workflow Output".to_string(),
            snapshot_path: PathBuf::from("workflow_output.png"),
            font_path: None,
            keep_history: false,
        }
    }
}

/// 云台参数配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurretConfig {
    pub camera: CameraConfig,
    pub pan: AxisConfig,  // 水平轴
    pub tilt: AxisConfig, // 俯仰轴
    pub servo: PulseConfig,
    pub pipeline: PipelineConfig,
    pub display: DisplayConfig,
}

impl Default for TurretConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                width: 640,
                height: 480,
            },
            pan: AxisConfig {
                min: 0,
                max: 180,
                channel: 0,
            },
            // 俯仰限制在0-90度保持稳定
            tilt: AxisConfig {
                min: 0,
                max: 90,
                channel: 1,
            },
            servo: PulseConfig::default(),
            pipeline: PipelineConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl TurretConfig {
    /// 从JSON文件加载配置; 文件不存在时写出默认配置
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("📝 配置文件不存在,创建默认配置...");
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        let json = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        info!("✅ 配置已从 {} 加载", path.display());
        Ok(config)
    }

    /// 保存配置到JSON文件
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!("💾 配置已保存到 {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(TurretError::DegenerateRange {
                min: 0.0,
                max: self.camera.width.min(self.camera.height) as f64,
            });
        }
        self.pan.range().validate()?;
        self.tilt.range().validate()?;
        if self.pan.channel == self.tilt.channel {
            return Err(TurretError::Actuator {
                channel: self.pan.channel,
                reason: "pan and tilt share a channel".to_string(),
            });
        }
        self.pipeline.validate()
    }

    /// 打印当前配置
    pub fn print_summary(&self) {
        info!("🎛️  当前云台配置:");
        info!("  画面: {}x{}", self.camera.width, self.camera.height);
        info!(
            "  水平轴: 通道{} {}°..{}°",
            self.pan.channel, self.pan.min, self.pan.max
        );
        info!(
            "  俯仰轴: 通道{} {}°..{}°",
            self.tilt.channel, self.tilt.min, self.tilt.max
        );
        info!(
            "  工作流: {}/{} 视频源 {}",
            self.pipeline.workspace_name, self.pipeline.workflow_id, self.pipeline.video_reference
        );
        info!("  调试显示: {}", if self.display.enabled { "开" } else { "关" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TurretConfig::default();
        config.validate().unwrap();
        assert_eq!(config.pan.range().center(), 90);
        assert_eq!(config.tilt.range().center(), 45);
        assert!(config.pipeline.cpu_only);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: TurretConfig =
            serde_json::from_str(r#"{"camera": {"width": 1280, "height": 720}}"#).unwrap();
        assert_eq!(config.camera.width, 1280);
        assert_eq!(config.pan, TurretConfig::default().pan);
        assert_eq!(config.pipeline.max_fps, Some(30.0));
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = TurretConfig::default();
        config.tilt.max = 120;
        config.display.enabled = true;
        let json = serde_json::to_string(&config).unwrap();
        let back: TurretConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let mut config = TurretConfig::default();
        config.pan.min = 200;
        assert!(matches!(config.validate(), Err(TurretError::InvalidAxisRange { .. })));

        let mut config = TurretConfig::default();
        config.camera.height = 0;
        assert!(config.validate().is_err());

        let mut config = TurretConfig::default();
        config.tilt.channel = config.pan.channel;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_creates_missing_file() {
        let path = std::env::temp_dir().join(format!("turret_config_{}.json", std::process::id()));
        let _ = fs::remove_file(&path);
        let config = TurretConfig::load(&path).unwrap();
        assert_eq!(config, TurretConfig::default());
        assert!(path.exists());
        let again = TurretConfig::load(&path).unwrap();
        assert_eq!(again, config);
        let _ = fs::remove_file(&path);
    }
}
