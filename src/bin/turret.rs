// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 云台无人机追踪 (Pan-Tilt Drone Turret)
///
/// 系统架构:
/// 1. 读取线程: 外部推理流水线的逐帧结果 (JSON行)
/// 2. 分发线程: 逐帧回调 → 第一个检测框中心 → 舵机角度
/// 3. 主线程:   配置加载、云台归中、等待结束后清理
///
/// 本程序下发的舵机角度以日志形式输出 (空跑);
/// 接硬件时用 `PwmServo` 包装板级 PWM 通道。
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use drone_turret::actuator::{DryRunServo, PanTilt};
use drone_turret::display::{Display, Overlay, SnapshotDisplay};
use drone_turret::pipeline::VideoReference;
use drone_turret::tracking::SinkStats;
use drone_turret::{InferencePipeline, PredictionSource, TrackingSink, Turret, TurretConfig};
use log::{error, info};

type Sink = TrackingSink<DryRunServo, DryRunServo, Box<dyn Display + Send>>;

/// 云台追踪参数
#[derive(Parser, Debug)]
#[command(author, version, about = "云台无人机追踪 - Pan-tilt drone turret", long_about = None)]
struct Args {
    /// 配置文件 (不存在时创建默认配置)
    #[arg(short, long, default_value = "turret.json")]
    config: PathBuf,

    /// 推理结果文件 (JSON行), "-" 表示标准输入
    #[arg(short, long, default_value = "-")]
    source: String,

    /// 启动外部推理进程, 读取其标准输出 (优先于 --source)
    #[arg(long, num_args = 1.., allow_hyphen_values = true)]
    command: Option<Vec<String>>,

    /// 视频源: 摄像头编号或流地址
    #[arg(short, long)]
    video: Option<String>,

    /// 最大帧率
    #[arg(long)]
    max_fps: Option<f64>,

    /// API key
    #[arg(long)]
    api_key: Option<String>,

    /// 启用调试显示 (标注帧写入快照文件)
    #[arg(short, long)]
    display: bool,

    /// 快照文件路径
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

impl Args {
    fn apply(&self, config: &mut TurretConfig) {
        if let Some(video) = &self.video {
            config.pipeline.video_reference = match video.parse::<u32>() {
                Ok(index) => VideoReference::Device(index),
                Err(_) => VideoReference::Url(video.clone()),
            };
        }
        if let Some(fps) = self.max_fps {
            config.pipeline.max_fps = Some(fps);
        }
        if let Some(key) = &self.api_key {
            config.pipeline.api_key = key.clone();
        }
        if self.display {
            config.display.enabled = true;
        }
        if let Some(path) = &self.snapshot {
            config.display.snapshot_path = path.clone();
        }
    }

    fn prediction_source(&self) -> Result<PredictionSource> {
        match &self.command {
            Some(command) => {
                let (program, args) = command.split_first().context("--command needs a program")?;
                Ok(PredictionSource::Command {
                    program: program.clone(),
                    args: args.to_vec(),
                })
            }
            None => Ok(PredictionSource::from_arg(&self.source)),
        }
    }
}

fn build_sink(config: &TurretConfig) -> Result<Sink> {
    let axes = PanTilt::new(
        DryRunServo::new(config.pan.channel, "pan"),
        DryRunServo::new(config.tilt.channel, "tilt"),
    );
    let mut turret = Turret::new(axes, config.camera.into(), config.pan.range(), config.tilt.range())
        .context("invalid turret geometry")?;
    turret.center().context("failed to center servos")?;

    let sink = TrackingSink::new(turret);
    if !config.display.enabled {
        return Ok(sink);
    }

    let overlay = match &config.display.font_path {
        Some(path) => Overlay::with_font_file(path).with_context(|| format!("failed to load font {}", path.display()))?,
        None => Overlay::new(None),
    };
    let display: Box<dyn Display + Send> = Box::new(SnapshotDisplay::new(
        config.display.snapshot_path.clone(),
        config.display.keep_history,
    ));
    info!("🖼️ 调试显示: {}", config.display.snapshot_path.display());
    Ok(sink.with_display(display, overlay, config.display.window_title.clone()))
}

/// 初始化或启动失败时, 流水线负责对回调调用 finish (关闭显示)
fn run_pipeline(config: &TurretConfig, source: PredictionSource, sink: Sink) -> Result<SinkStats> {
    let mut pipeline = InferencePipeline::init_with_workflow(config.pipeline.clone(), source, sink)?;
    pipeline.start().context("failed to start pipeline")?;
    let sink = pipeline.join()?;
    Ok(sink.stats())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    info!("🚀 云台追踪系统启动");

    let mut config = TurretConfig::load(&args.config)
        .with_context(|| format!("failed to load config {}", args.config.display()))?;
    args.apply(&mut config);
    config.validate().context("invalid configuration")?;
    config.print_summary();

    let source = args.prediction_source()?;
    let sink = build_sink(&config)?;

    match run_pipeline(&config, source, sink) {
        Ok(stats) => info!("✅ 共处理 {} 帧, 下发 {} 次", stats.frames, stats.commands),
        Err(e) => error!("❌ Error: {:#}", e),
    }

    info!("👋 退出, 舵机保持最后角度");
    Ok(())
}
