// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 调试显示 (Debug display)
///
/// - Overlay:         在可视化帧上绘制检测框与中心坐标
/// - SnapshotDisplay: 把标注后的帧写入图像文件 (无窗口环境)
pub mod overlay;
pub mod snapshot;

pub use overlay::Overlay;
pub use snapshot::SnapshotDisplay;

use image::RgbImage;

use crate::error::Result;

/// 显示后端接口
pub trait Display {
    /// 显示一帧
    fn show(&mut self, title: &str, image: &RgbImage) -> Result<()>;

    /// 每帧轮询按键, 把控制权交还显示系统
    fn poll_key(&mut self) -> Option<char> {
        None
    }

    /// 关闭所有窗口
    fn close(&mut self) {}
}

impl<D: Display + ?Sized> Display for Box<D> {
    fn show(&mut self, title: &str, image: &RgbImage) -> Result<()> {
        (**self).show(title, image)
    }

    fn poll_key(&mut self) -> Option<char> {
        (**self).poll_key()
    }

    fn close(&mut self) {
        (**self).close()
    }
}
