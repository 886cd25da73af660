//! Page Context - 页图处理
//!
//! 纯计算部分：命名规则、缩放/水印、四宫格切图。
//! 文件读写由应用层负责。

mod naming;
mod transform;

pub use naming::{
    collect_pages, is_reserved_name, PageFile, PageRole, BACK_COVER_INDEX, COVER_INDEX,
    IMAGE_EXTENSIONS, LOGO_FILE, STYLE_FILE,
};
pub use transform::{
    decode, encode_jpeg, encode_png, quadrant_regions, render_export, scaled_height,
    split_quadrants, watermark_anchor, PageError, EXPORT_JPEG_QUALITY, EXPORT_WIDTH,
    SPLIT_CANVAS, SPLIT_TILE,
};
