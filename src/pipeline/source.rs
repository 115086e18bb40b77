// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 推理结果来源 (Prediction sources)
//!
//! 外部推理流水线按行输出 JSON; 来源可以是文件、标准输入、内存读取器,
//! 或由本程序启动的外部推理进程的标准输出。

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use log::info;

use super::PipelineConfig;
use crate::error::{Result, TurretError};

/// 选择CPU推理后端的环境变量
pub const ORT_PROVIDERS_ENV: &str = "ORT_API_PROVIDERS";
pub const CPU_EXECUTION_PROVIDER: &str = "CPUExecutionProvider";

pub enum PredictionSource {
    Stdin,
    File(PathBuf),
    Command { program: String, args: Vec<String> },
    Reader(Box<dyn BufRead + Send>),
}

impl std::fmt::Debug for PredictionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PredictionSource::Stdin => write!(f, "Stdin"),
            PredictionSource::File(path) => write!(f, "File({})", path.display()),
            PredictionSource::Command { program, args } => write!(f, "Command({} {})", program, args.join(" ")),
            PredictionSource::Reader(_) => write!(f, "Reader"),
        }
    }
}

impl PredictionSource {
    /// `-` 表示标准输入, 其他视为文件路径
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            PredictionSource::Stdin
        } else {
            PredictionSource::File(PathBuf::from(arg))
        }
    }

    /// 打开来源; 外部进程来源同时返回子进程句柄
    pub(crate) fn open(self, config: &PipelineConfig) -> Result<(Box<dyn BufRead + Send>, Option<Child>)> {
        match self {
            PredictionSource::Stdin => {
                info!("📥 结果来源: 标准输入");
                Ok((Box::new(BufReader::new(std::io::stdin())), None))
            }
            PredictionSource::File(path) => {
                info!("📥 结果来源: {}", path.display());
                let file = File::open(&path)?;
                Ok((Box::new(BufReader::new(file)), None))
            }
            PredictionSource::Command { program, args } => {
                info!("📥 结果来源: 外部进程 {} {}", program, args.join(" "));
                let mut command = Command::new(&program);
                command.args(&args).stdout(Stdio::piped()).stdin(Stdio::null());
                apply_workflow_env(&mut command, config);

                let mut child = command
                    .spawn()
                    .map_err(|e| TurretError::Pipeline(format!("spawn {}: {}", program, e)))?;
                let stdout = child
                    .stdout
                    .take()
                    .ok_or_else(|| TurretError::Pipeline("child stdout not captured".to_string()))?;
                Ok((Box::new(BufReader::new(stdout)), Some(child)))
            }
            PredictionSource::Reader(reader) => Ok((reader, None)),
        }
    }
}

/// 把工作流参数导出给外部推理进程
pub fn apply_workflow_env(command: &mut Command, config: &PipelineConfig) {
    command
        .env("ROBOFLOW_API_KEY", &config.api_key)
        .env("WORKSPACE_NAME", &config.workspace_name)
        .env("WORKFLOW_ID", &config.workflow_id)
        .env("VIDEO_REFERENCE", config.video_reference.to_string());
    if let Some(fps) = config.max_fps {
        command.env("MAX_FPS", fps.to_string());
    }
    if config.cpu_only {
        command.env(ORT_PROVIDERS_ENV, CPU_EXECUTION_PROVIDER);
    }
}
