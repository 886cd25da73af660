//! 页图变换
//!
//! - 标准化导出：等比缩放到固定宽度，右下角叠加水印，JPEG 编码
//! - 四宫格切图（旧模式）：固定画布尺寸切成四张固定尺寸的图

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageFormat, RgbaImage};
use std::io::Cursor;
use thiserror::Error;

/// 导出宽度
pub const EXPORT_WIDTH: u32 = 1080;
/// 导出 JPEG 质量
pub const EXPORT_JPEG_QUALITY: u8 = 80;

/// 旧模式拼版画布尺寸 (宽, 高)
pub const SPLIT_CANVAS: (u32, u32) = (1664, 2432);
/// 旧模式单格尺寸 (宽, 高)
pub const SPLIT_TILE: (u32, u32) = (832, 1216);

/// 页图处理错误
#[derive(Debug, Error)]
pub enum PageError {
    #[error("Image decode failed: {0}")]
    Decode(String),

    #[error("Image encode failed: {0}")]
    Encode(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for PageError {
    fn from(err: std::io::Error) -> Self {
        PageError::Io(err.to_string())
    }
}

/// 等比缩放后的高度（四舍五入，至少 1 像素）
pub fn scaled_height(width: u32, height: u32, target_width: u32) -> u32 {
    if width == 0 {
        return 1;
    }
    let scaled = (height as u64 * target_width as u64 + width as u64 / 2) / width as u64;
    scaled.max(1) as u32
}

/// 水印锚点：右下角对齐，坐标不小于 0
pub fn watermark_anchor(canvas: (u32, u32), logo: (u32, u32)) -> (u32, u32) {
    (canvas.0.saturating_sub(logo.0), canvas.1.saturating_sub(logo.1))
}

/// 四宫格切片区域，按 左上、右上、左下、右下 顺序
pub fn quadrant_regions() -> [(u32, u32, u32, u32); 4] {
    let (w, h) = SPLIT_TILE;
    [(0, 0, w, h), (w, 0, w, h), (0, h, w, h), (w, h, w, h)]
}

pub fn decode(bytes: &[u8]) -> Result<DynamicImage, PageError> {
    image::load_from_memory(bytes).map_err(|e| PageError::Decode(e.to_string()))
}

/// 缩放到导出宽度并叠加水印
pub fn render_export(source: &DynamicImage, logo: Option<&RgbaImage>) -> RgbaImage {
    let (width, height) = source.dimensions();
    let target_height = scaled_height(width, height, EXPORT_WIDTH);

    let mut canvas = source
        .resize_exact(EXPORT_WIDTH, target_height, FilterType::Lanczos3)
        .to_rgba8();

    if let Some(logo) = logo {
        let (x, y) = watermark_anchor(canvas.dimensions(), logo.dimensions());
        imageops::overlay(&mut canvas, logo, x as i64, y as i64);
    }

    canvas
}

/// JPEG 编码（JPEG 不支持透明通道，先转 RGB）
pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>, PageError> {
    let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode_image(&rgb)
        .map_err(|e| PageError::Encode(e.to_string()))?;
    Ok(buf)
}

pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, PageError> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| PageError::Encode(e.to_string()))?;
    Ok(buf)
}

/// 按固定几何切出四格
///
/// 尺寸不符的输入同样按固定区域裁剪，超出部分被图像边界截断。
pub fn split_quadrants(source: &DynamicImage) -> Vec<DynamicImage> {
    quadrant_regions()
        .iter()
        .map(|&(x, y, w, h)| source.crop_imm(x, y, w, h))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_scaled_height_preserves_aspect() {
        assert_eq!(scaled_height(2160, 3840, 1080), 1920);
        assert_eq!(scaled_height(540, 960, 1080), 1920);
        assert_eq!(scaled_height(3, 1, 1080), 360);
        assert_eq!(scaled_height(10_000, 1, 1080), 1);
    }

    #[test]
    fn test_watermark_anchor_clamped() {
        assert_eq!(watermark_anchor((1080, 1920), (200, 100)), (880, 1820));
        assert_eq!(watermark_anchor((1080, 50), (200, 100)), (880, 0));
        assert_eq!(watermark_anchor((100, 100), (200, 300)), (0, 0));
    }

    #[test]
    fn test_render_export_resizes_and_watermarks() {
        let source = DynamicImage::ImageRgba8(RgbaImage::from_pixel(540, 960, Rgba([0, 0, 0, 255])));
        let logo = RgbaImage::from_pixel(40, 20, Rgba([255, 0, 0, 255]));

        let out = render_export(&source, Some(&logo));
        assert_eq!(out.dimensions(), (1080, 1920));
        assert_eq!(out.get_pixel(1079, 1919), &Rgba([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(1040, 1900), &Rgba([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(1039, 1919)[0], 0);
    }

    #[test]
    fn test_oversized_logo_anchored_at_origin() {
        let source = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1080, 10, Rgba([0, 0, 0, 255])));
        let logo = RgbaImage::from_pixel(2000, 40, Rgba([0, 255, 0, 255]));

        let out = render_export(&source, Some(&logo));
        assert_eq!(out.dimensions(), (1080, 10));
        assert_eq!(out.get_pixel(0, 0), &Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn test_jpeg_roundtrip_dimensions() {
        let img = RgbaImage::from_pixel(64, 32, Rgba([10, 20, 30, 255]));
        let bytes = encode_jpeg(&img, EXPORT_JPEG_QUALITY).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (64, 32));
    }

    #[test]
    fn test_quadrants_in_raster_order() {
        let (cw, ch) = SPLIT_CANVAS;
        let mut canvas = RgbaImage::new(cw, ch);
        let colors = [
            Rgba([255, 0, 0, 255]),
            Rgba([0, 255, 0, 255]),
            Rgba([0, 0, 255, 255]),
            Rgba([255, 255, 0, 255]),
        ];
        for (region, color) in quadrant_regions().iter().zip(colors.iter()) {
            let (x0, y0, w, h) = *region;
            for y in y0..y0 + h {
                for x in x0..x0 + w {
                    canvas.put_pixel(x, y, *color);
                }
            }
        }

        let tiles = split_quadrants(&DynamicImage::ImageRgba8(canvas));
        assert_eq!(tiles.len(), 4);
        for (tile, color) in tiles.iter().zip(colors.iter()) {
            assert_eq!(tile.dimensions(), SPLIT_TILE);
            assert_eq!(tile.to_rgba8().get_pixel(10, 10), color);
        }
    }
}
