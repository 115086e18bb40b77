// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 检测框叠加绘制 (Detection overlay)

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::error::{Result, TurretError};
use crate::tracking::types::BBox;

const GREEN: Rgb<u8> = Rgb([0, 255, 0]);

pub struct Overlay {
    font: Option<FontVec>, // 无字体时只画框
    scale: PxScale,
    thickness: u32,
}

impl Overlay {
    pub fn new(font: Option<FontVec>) -> Self {
        Self {
            font,
            scale: PxScale::from(16.0),
            thickness: 2,
        }
    }

    /// 从字体文件加载 (ttf/otf)
    pub fn with_font_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let font = FontVec::try_from_vec(data)
            .map_err(|e| TurretError::Decode(format!("font {}: {}", path.display(), e)))?;
        Ok(Self::new(Some(font)))
    }

    /// 标签文本: 中心坐标 + 类别名
    pub fn label(bbox: &BBox) -> String {
        let (cx, cy) = bbox.center();
        match &bbox.class_name {
            Some(name) => format!("({}, {}) {}", cx, cy, name),
            None => format!("({}, {})", cx, cy),
        }
    }

    /// 在图像上绘制检测框与标签
    pub fn annotate(&self, image: &mut RgbImage, bbox: &BBox) {
        // 先把角点收进画面附近, 后续运算不会溢出
        let margin = self.thickness as i32;
        let (w, h) = image.dimensions();
        let clip_x = |v: i32| v.clamp(-margin, (w as i32).saturating_add(margin));
        let clip_y = |v: i32| v.clamp(-margin, (h as i32).saturating_add(margin));
        let (x1, y1, x2, y2) = bbox.corners();
        let (x1, y1, x2, y2) = (clip_x(x1), clip_y(y1), clip_x(x2), clip_y(y2));
        let width = x2.saturating_sub(x1).max(1) as u32;
        let height = y2.saturating_sub(y1).max(1) as u32;

        for i in 0..self.thickness {
            let grow = i as i32;
            let rect = Rect::at(x1.saturating_sub(grow), y1.saturating_sub(grow))
                .of_size(width + 2 * i, height + 2 * i);
            draw_hollow_rect_mut(image, rect, GREEN);
        }

        if let Some(font) = &self.font {
            // 标签画在框的上方
            let text_y = y1.saturating_sub(10 + self.scale.y as i32).max(0);
            draw_text_mut(image, GREEN, x1.max(0), text_y, self.scale, font, &Self::label(bbox));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_text() {
        let mut bbox = BBox::new(100.0, 50.0, 200.0, 150.0);
        assert_eq!(Overlay::label(&bbox), "(150, 100)");
        bbox.class_name = Some("drone".to_string());
        assert_eq!(Overlay::label(&bbox), "(150, 100) drone");
    }

    #[test]
    fn test_annotate_draws_box_edges() {
        let mut image = RgbImage::new(64, 48);
        let overlay = Overlay::new(None);
        overlay.annotate(&mut image, &BBox::new(10.0, 10.0, 30.0, 20.0));

        assert_eq!(*image.get_pixel(10, 10), GREEN);
        assert_eq!(*image.get_pixel(29, 15), GREEN);
        // 粗细2: 外扩一圈
        assert_eq!(*image.get_pixel(9, 9), GREEN);
        // 框内不填充
        assert_eq!(*image.get_pixel(20, 15), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_annotate_clips_out_of_frame_box() {
        let mut image = RgbImage::new(32, 32);
        Overlay::new(None).annotate(&mut image, &BBox::new(-20.0, -20.0, 100.0, 100.0));
    }

    #[test]
    fn test_annotate_extreme_coordinates() {
        let mut image = RgbImage::new(32, 32);
        let overlay = Overlay::new(None);
        overlay.annotate(&mut image, &BBox::new(3e9, 0.0, 3e9, 10.0));
        overlay.annotate(&mut image, &BBox::new(-3e9, -3e9, 3e9, 3e9));
        // 只有第一个框 (画面外右侧) 不可见
        assert_eq!(*image.get_pixel(16, 16), Rgb([0, 0, 0]));
    }
}
