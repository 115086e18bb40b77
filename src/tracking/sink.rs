// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 追踪回调 (Tracking sink)
//! 职责: 每帧接收推理结果 → 取第一个检测框 → 计算中心 → 转动云台 → (可选) 标注显示

use std::time::Instant;

use log::{debug, error, info, warn};

use super::turret::Turret;
use super::types::BBox;
use crate::actuator::ServoChannel;
use crate::display::{Display, Overlay, SnapshotDisplay};
use crate::pipeline::{FrameSink, VideoFrame, WorkflowResult};

/// 每隔多少帧打印一次统计
const STATS_INTERVAL: u64 = 300;

/// 回调统计
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SinkStats {
    pub frames: u64,
    pub detections: u64,
    pub commands: u64,
    pub malformed: u64,
    pub actuator_errors: u64,
    pub displayed: u64,
}

/// 调试显示组件
struct View<D> {
    display: D,
    overlay: Overlay,
    title: String,
}

pub struct TrackingSink<P: ServoChannel, T: ServoChannel, D: Display = SnapshotDisplay> {
    turret: Turret<P, T>,
    view: Option<View<D>>,
    stats: SinkStats,

    // FPS统计
    count: u64,
    last: Instant,
    current_fps: f64,
}

impl<P: ServoChannel, T: ServoChannel, D: Display> TrackingSink<P, T, D> {
    pub fn new(turret: Turret<P, T>) -> Self {
        Self {
            turret,
            view: None,
            stats: SinkStats::default(),
            count: 0,
            last: Instant::now(),
            current_fps: 0.0,
        }
    }

    pub fn with_display(mut self, display: D, overlay: Overlay, title: impl Into<String>) -> Self {
        self.view = Some(View {
            display,
            overlay,
            title: title.into(),
        });
        self
    }

    pub fn turret(&self) -> &Turret<P, T> {
        &self.turret
    }

    pub fn stats(&self) -> SinkStats {
        self.stats
    }

    pub fn display(&self) -> Option<&D> {
        self.view.as_ref().map(|v| &v.display)
    }

    /// 处理一帧
    pub fn handle(&mut self, result: Option<&WorkflowResult>, frame: &VideoFrame) {
        self.stats.frames += 1;
        self.tick();

        let Some(result) = result else {
            return;
        };

        if let Some(bbox) = &result.bounding_box {
            debug!("帧#{} Bounding Box: {}", frame.frame_id, bbox);
        }
        if let Some(label) = &result.label {
            debug!("帧#{} Label: {}", frame.frame_id, label);
        }

        let detection = self.extract(result, frame);
        if let Some(bbox) = &detection {
            self.track(bbox, frame);
        }

        self.present(result, detection.as_ref(), frame);
    }

    /// 取第一个检测框; 格式错误时记录并跳过本帧
    fn extract(&mut self, result: &WorkflowResult, frame: &VideoFrame) -> Option<BBox> {
        let predictions = result.predictions.as_ref()?;
        match predictions.first_bbox() {
            Ok(Some(bbox)) => {
                self.stats.detections += 1;
                Some(bbox)
            }
            Ok(None) => None,
            Err(e) => {
                self.stats.malformed += 1;
                warn!("⚠️ 帧#{} 检测框处理错误: {}", frame.frame_id, e);
                None
            }
        }
    }

    fn track(&mut self, bbox: &BBox, frame: &VideoFrame) {
        let (cx, cy) = bbox.center();
        match self.turret.adjust(cx, cy) {
            Ok(state) => {
                self.stats.commands += 1;
                debug!(
                    "帧#{} [{}] 目标中心 ({}, {}) → 水平 {}° / 俯仰 {}°",
                    frame.frame_id,
                    frame.timestamp.format("%H:%M:%S%.3f"),
                    cx,
                    cy,
                    state.pan,
                    state.tilt
                );
            }
            Err(e) => {
                self.stats.actuator_errors += 1;
                error!("❌ 帧#{} 舵机写入失败: {}", frame.frame_id, e);
            }
        }
    }

    fn present(&mut self, result: &WorkflowResult, bbox: Option<&BBox>, frame: &VideoFrame) {
        let Some(view) = self.view.as_mut() else {
            return;
        };
        let Some(visualization) = &result.visualization else {
            return;
        };

        let mut image = match visualization.load() {
            Ok(image) => image,
            Err(e) => {
                warn!("⚠️ 帧#{} 可视化图像解码失败: {}", frame.frame_id, e);
                return;
            }
        };

        if let Some(bbox) = bbox {
            view.overlay.annotate(&mut image, bbox);
        }

        if let Err(e) = view.display.show(&view.title, &image) {
            warn!("⚠️ 帧#{} 显示失败: {}", frame.frame_id, e);
            return;
        }
        self.stats.displayed += 1;

        if let Some(key) = view.display.poll_key() {
            debug!("按键: {}", key);
        }
    }

    fn tick(&mut self) {
        self.count += 1;
        let elapsed = self.last.elapsed().as_secs_f64();
        if elapsed >= 1.0 {
            self.current_fps = self.count as f64 / elapsed;
            self.count = 0;
            self.last = Instant::now();
        }

        if self.stats.frames % STATS_INTERVAL == 0 {
            let s = self.stats;
            info!(
                "📊 帧 {} | 检测 {} | 下发 {} | 格式错误 {} | 舵机错误 {} | {:.1} FPS",
                s.frames, s.detections, s.commands, s.malformed, s.actuator_errors, self.current_fps
            );
        }
    }
}

impl<P, T, D> FrameSink for TrackingSink<P, T, D>
where
    P: ServoChannel + Send,
    T: ServoChannel + Send,
    D: Display + Send,
{
    fn on_prediction(&mut self, result: Option<&WorkflowResult>, frame: &VideoFrame) {
        self.handle(result, frame);
    }

    fn finish(&mut self) {
        let s = self.stats;
        info!(
            "🏁 追踪结束: 帧 {} | 检测 {} | 下发 {} | 格式错误 {} | 舵机错误 {}",
            s.frames, s.detections, s.commands, s.malformed, s.actuator_errors
        );
        if let Some(view) = self.view.as_mut() {
            view.display.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::{DryRunServo, PanTilt};
    use crate::error::{Result, TurretError};
    use crate::mapping::AxisRange;
    use crate::pipeline::{parse_line, Visualization};
    use crate::tracking::types::{ActuatorState, FrameSize};
    use base64::Engine;
    use image::{Rgb, RgbImage};

    /// 记录调用次数的显示后端
    #[derive(Default)]
    struct RecordingDisplay {
        shown: Vec<RgbImage>,
        polls: u32,
    }

    impl Display for RecordingDisplay {
        fn show(&mut self, _title: &str, image: &RgbImage) -> Result<()> {
            self.shown.push(image.clone());
            Ok(())
        }

        fn poll_key(&mut self) -> Option<char> {
            self.polls += 1;
            None
        }
    }

    /// 总是写入失败的舵机
    struct BrokenServo;

    impl ServoChannel for BrokenServo {
        fn channel(&self) -> u8 {
            1
        }

        fn set_angle(&mut self, _angle: i32) -> Result<()> {
            Err(TurretError::Actuator {
                channel: 1,
                reason: "i2c nack".to_string(),
            })
        }
    }

    fn frame_size() -> FrameSize {
        FrameSize {
            width: 640,
            height: 480,
        }
    }

    fn sink() -> TrackingSink<DryRunServo, DryRunServo, RecordingDisplay> {
        let turret = Turret::new(
            PanTilt::new(DryRunServo::new(0, "pan"), DryRunServo::new(1, "tilt")),
            frame_size(),
            AxisRange { min: 0, max: 180 },
            AxisRange { min: 0, max: 90 },
        )
        .unwrap();
        TrackingSink::new(turret).with_display(RecordingDisplay::default(), Overlay::new(None), "Workflow Output")
    }

    fn writes(sink: &TrackingSink<DryRunServo, DryRunServo, RecordingDisplay>) -> u64 {
        let axes = sink.turret().axes();
        axes.pan().writes() + axes.tilt().writes()
    }

    fn png_base64(width: u32, height: u32) -> String {
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(RgbImage::new(width, height))
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    #[test]
    fn test_detection_moves_turret() {
        let mut sink = sink();
        let msg = parse_line(r#"{"Model Predictions": {"xyxy": [[100, 50, 200, 150], [0, 0, 10, 10]]}}"#, 0);
        sink.handle(msg.result.as_ref(), &msg.frame);

        assert_eq!(sink.turret().state(), ActuatorState { pan: 42, tilt: 18 });
        assert_eq!(sink.turret().axes().pan().last_angle(), Some(42));
        assert_eq!(sink.turret().axes().tilt().last_angle(), Some(18));
        assert_eq!(sink.stats().commands, 1);
    }

    #[test]
    fn test_absent_result_does_nothing() {
        let mut sink = sink();
        sink.handle(None, &VideoFrame::new(0));
        let empty = parse_line("{}", 1);
        sink.handle(empty.result.as_ref(), &empty.frame);

        assert_eq!(writes(&sink), 0);
        let display = sink.display().unwrap();
        assert!(display.shown.is_empty());
        assert_eq!(display.polls, 0);
        assert_eq!(sink.stats().frames, 2);
    }

    #[test]
    fn test_empty_predictions_do_not_move() {
        let mut sink = sink();
        let msg = parse_line(r#"{"Model Predictions": {"xyxy": []}}"#, 0);
        sink.handle(msg.result.as_ref(), &msg.frame);
        assert_eq!(writes(&sink), 0);
        assert_eq!(sink.stats().detections, 0);
    }

    #[test]
    fn test_malformed_detection_is_skipped_and_next_frame_tracks() {
        let mut sink = sink();
        let bad = parse_line(r#"{"Model Predictions": {"xyxy": [[100, 50]]}}"#, 0);
        sink.handle(bad.result.as_ref(), &bad.frame);
        assert_eq!(writes(&sink), 0);
        assert_eq!(sink.stats().malformed, 1);
        assert_eq!(sink.turret().state(), ActuatorState { pan: 90, tilt: 45 });

        let good = parse_line(r#"{"Model Predictions": {"xyxy": [[320, 240, 320, 240]]}}"#, 1);
        sink.handle(good.result.as_ref(), &good.frame);
        assert_eq!(writes(&sink), 2);
        assert_eq!(sink.turret().state(), ActuatorState { pan: 90, tilt: 45 });
        assert_eq!(sink.stats().commands, 1);
    }

    #[test]
    fn test_out_of_range_coordinates_do_not_stop_tracking() {
        let mut sink = sink();
        let far = parse_line(r#"{"Model Predictions": {"xyxy": [[3e9, 0, 3e9, 10]]}}"#, 0);
        let mut far_result = far.result.unwrap();
        far_result.visualization = Some(Visualization::Base64(png_base64(16, 16)));
        sink.handle(Some(&far_result), &far.frame);
        assert_eq!(sink.stats().commands, 1);
        assert_eq!(sink.display().unwrap().shown.len(), 1);

        let good = parse_line(r#"{"Model Predictions": {"xyxy": [[100, 50, 200, 150]]}}"#, 1);
        sink.handle(good.result.as_ref(), &good.frame);
        assert_eq!(sink.turret().state(), ActuatorState { pan: 42, tilt: 18 });
        assert_eq!(sink.stats().commands, 2);
    }

    #[test]
    fn test_actuator_failure_keeps_last_state() {
        let turret = Turret::new(
            PanTilt::new(DryRunServo::new(0, "pan"), BrokenServo),
            frame_size(),
            AxisRange { min: 0, max: 180 },
            AxisRange { min: 0, max: 90 },
        )
        .unwrap();
        let mut sink: TrackingSink<_, _> = TrackingSink::new(turret);

        let msg = parse_line(r#"{"Model Predictions": {"xyxy": [[100, 50, 200, 150]]}}"#, 0);
        sink.handle(msg.result.as_ref(), &msg.frame);

        assert_eq!(sink.stats().actuator_errors, 1);
        assert_eq!(sink.stats().commands, 0);
        assert_eq!(sink.turret().state(), ActuatorState { pan: 90, tilt: 45 });
    }

    #[test]
    fn test_visualization_is_annotated_and_shown() {
        let mut sink = sink();
        let mut msg = parse_line(r#"{"Model Predictions": {"xyxy": [[10, 10, 30, 20]]}}"#, 0);
        msg.result.as_mut().unwrap().visualization = Some(Visualization::Base64(png_base64(64, 48)));
        sink.handle(msg.result.as_ref(), &msg.frame);

        let display = sink.display().unwrap();
        assert_eq!(display.shown.len(), 1);
        assert_eq!(display.polls, 1);
        assert_eq!(*display.shown[0].get_pixel(10, 10), Rgb([0, 255, 0]));
        assert_eq!(sink.stats().displayed, 1);
    }

    #[test]
    fn test_visualization_without_predictions_is_shown_unannotated() {
        let mut sink = sink();
        let mut msg = parse_line("{}", 0);
        msg.result.as_mut().unwrap().visualization = Some(Visualization::Base64(png_base64(16, 16)));
        sink.handle(msg.result.as_ref(), &msg.frame);

        assert_eq!(writes(&sink), 0);
        let display = sink.display().unwrap();
        assert_eq!(display.shown.len(), 1);
        assert!(display.shown[0].pixels().all(|p| *p == Rgb([0, 0, 0])));
    }
}
