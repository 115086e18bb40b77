// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 快照显示 - 将每一帧写到磁盘

use std::path::{Path, PathBuf};

use image::RgbImage;
use log::{debug, info};

use super::Display;
use crate::error::Result;

pub struct SnapshotDisplay {
    path: PathBuf,
    keep_history: bool, // true: 每帧单独一个带时间戳的文件
    shown: u64,
}

impl SnapshotDisplay {
    pub fn new(path: impl Into<PathBuf>, keep_history: bool) -> Self {
        Self {
            path: path.into(),
            keep_history,
            shown: 0,
        }
    }

    pub fn shown(&self) -> u64 {
        self.shown
    }

    /// 本帧写入路径
    fn target_path(&self) -> PathBuf {
        if !self.keep_history {
            return self.path.clone();
        }
        history_path(&self.path, &gen_time_string("-"))
    }
}

/// `frame.png` → `frame_<stamp>.png`
fn history_path(path: &Path, stamp: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string());
    let name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, stamp, ext.to_string_lossy()),
        None => format!("{}_{}", stem, stamp),
    };
    path.with_file_name(name)
}

pub fn gen_time_string(delimiter: &str) -> String {
    let fmt = format!(
        "%Y{}%m{}%d{}%H{}%M{}%S{}%f",
        delimiter, delimiter, delimiter, delimiter, delimiter, delimiter
    );
    chrono::Local::now().format(&fmt).to_string()
}

impl Display for SnapshotDisplay {
    fn show(&mut self, title: &str, image: &RgbImage) -> Result<()> {
        let target = self.target_path();
        image.save(&target)?;
        self.shown += 1;
        debug!("🖼️ [{}] 已写入 {}", title, target.display());
        Ok(())
    }

    fn close(&mut self) {
        info!("🖼️ 快照显示关闭, 共写入 {} 帧", self.shown);
    }
}
