// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 推理结果边界类型 (Workflow result at the pipeline boundary)
//!
//! 外部推理流水线每帧输出一行 JSON, 在此一次性解析为带类型的结果,
//! 回调中不再做字段探测。
//!
//! ```json
//! {"frame_id": 7,
//!  "output": {"type": "base64", "value": "<png/jpeg>"},
//!  "Model Predictions": {"xyxy": [[100, 50, 200, 150]], "class_name": ["drone"], "confidence": [0.91]}}
//! ```

use std::path::PathBuf;

use base64::Engine;
use chrono::{DateTime, Local};
use image::RgbImage;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, TurretError};
use crate::tracking::types::BBox;

/// 单帧推理结果
#[derive(Clone, Debug, Default, Deserialize)]
pub struct WorkflowResult {
    /// 可视化图像 (键 "output")
    #[serde(default, rename = "output")]
    pub visualization: Option<Visualization>,

    /// 模型检测结果
    #[serde(default, rename = "Model Predictions", alias = "predictions")]
    pub predictions: Option<Predictions>,

    /// 部分工作流额外输出的原始字段, 仅用于调试打印
    #[serde(default, rename = "Bounding Box")]
    pub bounding_box: Option<Value>,

    #[serde(default, rename = "Label")]
    pub label: Option<Value>,
}

/// 可视化图像来源
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Visualization {
    Base64(String),
    File(PathBuf),
}

impl Visualization {
    /// 解码为RGB图像 (返回新副本, 可直接绘制)
    pub fn load(&self) -> Result<RgbImage> {
        let image = match self {
            Visualization::Base64(data) => {
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(data.trim())
                    .map_err(|e| TurretError::Decode(format!("base64: {}", e)))?;
                image::load_from_memory(&bytes)?
            }
            Visualization::File(path) => image::open(path)?,
        };
        Ok(image.to_rgb8())
    }
}

/// 检测结果列 (每个检测一行)
///
/// 各列保持原始JSON, 取用时校验: 辅助列 (类别/置信度) 类型不符只丢弃该值,
/// 不影响检测框本身。
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Predictions {
    /// 每行应为 [x1, y1, x2, y2]
    #[serde(default)]
    pub xyxy: Value,

    #[serde(default)]
    pub class_name: Value,

    #[serde(default)]
    pub confidence: Value,
}

fn rows(column: &Value) -> &[Value] {
    column.as_array().map(Vec::as_slice).unwrap_or(&[])
}

impl Predictions {
    pub fn len(&self) -> usize {
        rows(&self.xyxy).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 取第一个检测框; 没有检测时返回 `Ok(None)`
    pub fn first_bbox(&self) -> Result<Option<BBox>> {
        if !(self.xyxy.is_null() || self.xyxy.is_array()) {
            return Err(TurretError::MalformedDetection(format!("xyxy is not a list: {}", self.xyxy)));
        }
        let Some(row) = rows(&self.xyxy).first() else {
            return Ok(None);
        };

        let coords = row
            .as_array()
            .ok_or_else(|| TurretError::MalformedDetection(format!("xyxy row is not an array: {}", row)))?;
        if coords.len() != 4 {
            return Err(TurretError::MalformedDetection(format!(
                "expected 4 coordinates, got {}",
                coords.len()
            )));
        }

        let mut xyxy = [0f32; 4];
        for (slot, value) in xyxy.iter_mut().zip(coords) {
            let v = value
                .as_f64()
                .filter(|v| v.is_finite())
                .ok_or_else(|| TurretError::MalformedDetection(format!("bad coordinate: {}", value)))?;
            *slot = v as f32;
        }

        let [x1, y1, x2, y2] = xyxy;
        Ok(Some(BBox {
            x1,
            y1,
            x2,
            y2,
            confidence: rows(&self.confidence).first().and_then(Value::as_f64).map(|c| c as f32),
            class_name: rows(&self.class_name).first().and_then(Value::as_str).map(str::to_string),
        }))
    }
}

impl WorkflowResult {
    /// 逐字段解析: 类型不符的字段记录后丢弃, 其余字段保留
    fn salvage(value: &Value, frame_id: u64) -> Self {
        fn field<T: serde::de::DeserializeOwned>(value: &Value, keys: &[&str], frame_id: u64) -> Option<T> {
            let (key, raw) = keys.iter().find_map(|k| value.get(*k).map(|v| (*k, v)))?;
            match T::deserialize(raw) {
                Ok(v) => Some(v),
                Err(e) => {
                    log::warn!("⚠️ 帧#{} 字段 \"{}\" 格式不符, 已忽略: {}", frame_id, key, e);
                    None
                }
            }
        }

        Self {
            visualization: field(value, &["output"], frame_id),
            predictions: field(value, &["Model Predictions", "predictions"], frame_id),
            bounding_box: value.get("Bounding Box").cloned(),
            label: value.get("Label").cloned(),
        }
    }
}

/// 原始帧元数据
#[derive(Clone, Debug)]
pub struct VideoFrame {
    pub frame_id: u64,
    pub timestamp: DateTime<Local>,
}

impl VideoFrame {
    pub fn new(frame_id: u64) -> Self {
        Self {
            frame_id,
            timestamp: Local::now(),
        }
    }
}

/// 帧消息 (读取线程 → 分发线程)
#[derive(Clone, Debug)]
pub struct FrameMessage {
    pub frame: VideoFrame,
    pub result: Option<WorkflowResult>,
}

/// 解析一行 JSON。`null` 或无法解析的行得到空结果
pub fn parse_line(line: &str, fallback_id: u64) -> FrameMessage {
    let value: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("⚠️ 帧#{} 结果解析失败: {}", fallback_id, e);
            return FrameMessage {
                frame: VideoFrame::new(fallback_id),
                result: None,
            };
        }
    };

    let frame_id = value
        .get("frame_id")
        .and_then(Value::as_u64)
        .unwrap_or(fallback_id);
    let frame = VideoFrame::new(frame_id);

    if !value.is_object() {
        return FrameMessage { frame, result: None };
    }

    let result = match WorkflowResult::deserialize(&value) {
        Ok(result) => result,
        Err(_) => WorkflowResult::salvage(&value, frame_id),
    };
    FrameMessage {
        frame,
        result: Some(result),
    }
}
