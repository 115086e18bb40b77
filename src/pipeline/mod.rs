// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 推理流水线边界 (Inference Pipeline Boundary)
///
/// 双线程架构, 通过 crossbeam 通道通信:
/// - Reader:     读取外部推理结果 (JSON行) → 解析为 FrameMessage (独立线程)
/// - Dispatcher: 按 max_fps 节拍逐帧调用回调 (独立线程, 回调唯一写者)
pub mod result;
pub mod source;

pub use result::{parse_line, FrameMessage, Predictions, VideoFrame, Visualization, WorkflowResult};
pub use source::PredictionSource;

use std::fmt;
use std::io::BufRead;
use std::process::Child;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TurretError};

/// 通道容量 (帧)
const CHANNEL_CAPACITY: usize = 60;

/// 每帧回调接口
pub trait FrameSink: Send {
    /// 处理一帧。`result` 为 `None` 表示本帧没有可用结果
    fn on_prediction(&mut self, result: Option<&WorkflowResult>, frame: &VideoFrame);

    /// 输入结束后调用一次
    fn finish(&mut self) {}
}

impl<F> FrameSink for F
where
    F: FnMut(Option<&WorkflowResult>, &VideoFrame) + Send,
{
    fn on_prediction(&mut self, result: Option<&WorkflowResult>, frame: &VideoFrame) {
        self(result, frame)
    }
}

/// 视频源: 摄像头编号或流地址
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VideoReference {
    Device(u32),
    Url(String),
}

impl fmt::Display for VideoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoReference::Device(index) => write!(f, "{}", index),
            VideoReference::Url(url) => write!(f, "{}", url),
        }
    }
}

/// 工作流参数
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub api_key: String,
    pub workspace_name: String,
    pub workflow_id: String,
    pub video_reference: VideoReference,
    pub max_fps: Option<f64>, // None: 不限速
    pub cpu_only: bool,       // 强制CPU推理
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            workspace_name: "drone-tracking-weehf".to_string(),
            workflow_id: "custom-workflow".to_string(),
            video_reference: VideoReference::Device(0),
            max_fps: Some(30.0),
            cpu_only: true,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(fps) = self.max_fps {
            if !(fps.is_finite() && fps > 0.0) {
                return Err(TurretError::Pipeline(format!("max_fps must be > 0, got {}", fps)));
            }
        }
        Ok(())
    }

    /// 帧间隔
    pub fn frame_interval(&self) -> Option<Duration> {
        self.max_fps.map(|fps| Duration::from_secs_f64(1.0 / fps))
    }

    /// 打印用: 只保留 api_key 前4位
    pub fn redacted_api_key(&self) -> String {
        if self.api_key.is_empty() {
            return "<none>".to_string();
        }
        let prefix: String = self.api_key.chars().take(4).collect();
        format!("{}****", prefix)
    }
}

enum State<S> {
    Idle {
        source: PredictionSource,
        sink: S,
    },
    Running {
        reader: JoinHandle<u64>,
        dispatcher: JoinHandle<S>,
        child: Option<Child>,
    },
    Done,
}

/// 推理流水线: init → start → join
pub struct InferencePipeline<S: FrameSink + 'static> {
    config: PipelineConfig,
    state: State<S>,
}

impl<S: FrameSink + 'static> InferencePipeline<S> {
    pub fn init_with_workflow(config: PipelineConfig, source: PredictionSource, mut on_prediction: S) -> Result<Self> {
        if let Err(e) = config.validate() {
            on_prediction.finish();
            return Err(e);
        }
        Ok(Self {
            config,
            state: State::Idle {
                source,
                sink: on_prediction,
            },
        })
    }

    /// 启动读取线程与分发线程
    pub fn start(&mut self) -> Result<()> {
        let (source, sink) = match std::mem::replace(&mut self.state, State::Done) {
            State::Idle { source, sink } => (source, sink),
            other => {
                self.state = other;
                return Err(TurretError::Pipeline("pipeline already started".to_string()));
            }
        };

        info!(
            "🚀 工作流 {}/{} | key {} | 视频源 {} | max_fps {:?}",
            self.config.workspace_name,
            self.config.workflow_id,
            self.config.redacted_api_key(),
            self.config.video_reference,
            self.config.max_fps
        );

        // 分发线程先启动: 之后任何失败都经由它调用 finish
        let (tx, rx) = bounded::<FrameMessage>(CHANNEL_CAPACITY);
        let interval = self.config.frame_interval();
        let dispatcher = std::thread::Builder::new()
            .name("prediction-dispatcher".to_string())
            .spawn(move || dispatch_loop(rx, sink, interval))?;

        let reader = source.open(&self.config).and_then(|(lines, child)| {
            let handle = std::thread::Builder::new()
                .name("prediction-reader".to_string())
                .spawn(move || read_loop(lines, tx))?;
            Ok((handle, child))
        });
        let (reader, child) = match reader {
            Ok(started) => started,
            Err(e) => {
                // tx 已释放, 分发线程收尾退出
                if dispatcher.join().is_err() {
                    warn!("⚠️ 分发线程异常退出");
                }
                return Err(e);
            }
        };

        self.state = State::Running {
            reader,
            dispatcher,
            child,
        };
        Ok(())
    }

    /// 等待输入结束, 返回回调对象
    pub fn join(mut self) -> Result<S> {
        let (reader, dispatcher, child) = match std::mem::replace(&mut self.state, State::Done) {
            State::Running {
                reader,
                dispatcher,
                child,
            } => (reader, dispatcher, child),
            _ => return Err(TurretError::Pipeline("pipeline not started".to_string())),
        };

        let frames = reader
            .join()
            .map_err(|_| TurretError::Pipeline("reader thread panicked".to_string()))?;
        let sink = dispatcher
            .join()
            .map_err(|_| TurretError::Pipeline("dispatcher thread panicked".to_string()))?;

        if let Some(mut child) = child {
            let status = child.wait()?;
            if !status.success() {
                warn!("⚠️ 外部推理进程退出: {}", status);
            }
        }

        info!("✅ 流水线结束, 共读取 {} 帧", frames);
        Ok(sink)
    }
}

/// 读取线程: JSON行 → FrameMessage。返回读取的帧数
///
/// 非UTF-8的行作为空结果送达; 只有I/O错误或输入结束才停止
fn read_loop(mut lines: Box<dyn BufRead + Send>, tx: Sender<FrameMessage>) -> u64 {
    let mut frames = 0u64;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match lines.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("⚠️ 读取结果失败: {}", e);
                break;
            }
        }
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }

        let msg = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => parse_line(line, frames),
            Err(e) => {
                warn!("⚠️ 帧#{} 结果不是UTF-8: {}", frames, e);
                FrameMessage {
                    frame: VideoFrame::new(frames),
                    result: None,
                }
            }
        };
        frames += 1;
        if tx.send(msg).is_err() {
            // 分发线程已退出
            break;
        }
    }
    frames
}

/// 分发线程: 逐帧同步调用回调, 按帧间隔限速 (不丢帧)
fn dispatch_loop<S: FrameSink>(rx: Receiver<FrameMessage>, mut sink: S, interval: Option<Duration>) -> S {
    let mut next_due = Instant::now();
    for msg in rx.iter() {
        if let Some(interval) = interval {
            let now = Instant::now();
            if next_due > now {
                std::thread::sleep(next_due - now);
            }
            next_due = next_due.max(now) + interval;
        }
        sink.on_prediction(msg.result.as_ref(), &msg.frame);
    }
    sink.finish();
    sink
}
