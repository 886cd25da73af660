//! 页图命名规则
//!
//! 页图以数字命名：`0` 为封面，`99` 为封底，其余为正文页。
//! `style.png`、`logo.png` 为保留文件，不参与任何批处理。

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// 视觉设定图
pub const STYLE_FILE: &str = "style.png";
/// 水印图
pub const LOGO_FILE: &str = "logo.png";

pub const COVER_INDEX: u32 = 0;
pub const BACK_COVER_INDEX: u32 = 99;

/// 可识别的图片扩展名
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// 页图角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRole {
    Cover,
    BackCover,
    Ordinary(u32),
}

impl PageRole {
    pub fn from_index(index: u32) -> Self {
        match index {
            COVER_INDEX => PageRole::Cover,
            BACK_COVER_INDEX => PageRole::BackCover,
            n => PageRole::Ordinary(n),
        }
    }
}

/// 保留文件名判断（不区分大小写）
pub fn is_reserved_name(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    lower == STYLE_FILE || lower == LOGO_FILE
}

/// 章节目录中的一张页图
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFile {
    pub path: PathBuf,
    pub stem: String,
    /// 小写扩展名
    pub extension: String,
    /// 数字文件名对应的序号
    pub index: Option<u32>,
}

impl PageFile {
    /// 识别页图，非图片或保留文件返回 None
    pub fn from_path(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?;
        if is_reserved_name(file_name) {
            return None;
        }

        let extension = path.extension()?.to_str()?.to_lowercase();
        if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            return None;
        }

        let stem = path.file_stem()?.to_str()?.to_string();
        let index = stem.parse::<u32>().ok();

        Some(Self {
            path: path.to_path_buf(),
            stem,
            extension,
            index,
        })
    }

    pub fn role(&self) -> Option<PageRole> {
        self.index.map(PageRole::from_index)
    }

    pub fn is_back_cover(&self) -> bool {
        self.index == Some(BACK_COVER_INDEX)
    }
}

/// 扩展名优先级（同号页图只保留优先级最高的一张）
fn extension_rank(extension: &str) -> usize {
    IMAGE_EXTENSIONS
        .iter()
        .position(|e| *e == extension)
        .unwrap_or(IMAGE_EXTENSIONS.len())
}

/// 同一页的判定：数字名按序号，非数字名按文件名主干
fn same_page(a: &PageFile, b: &PageFile) -> bool {
    match (a.index, b.index) {
        (Some(x), Some(y)) => x == y,
        (None, None) => a.stem == b.stem,
        _ => false,
    }
}

/// 页图排序：数字名按数值升序，非数字名排在其后按字典序
fn compare_pages(a: &PageFile, b: &PageFile) -> Ordering {
    match (a.index, b.index) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.stem.cmp(&b.stem),
    }
    .then_with(|| extension_rank(&a.extension).cmp(&extension_rank(&b.extension)))
    .then_with(|| a.stem.cmp(&b.stem))
}

/// 从路径集合中筛选页图并排序，每页只保留一个文件
///
/// `1.png` 与 `1.jpg`（或 `01.png`）同时存在时按 png > jpg > jpeg > webp 取其一，
/// 其余记录日志后跳过。
pub fn collect_pages<I>(paths: I) -> Vec<PageFile>
where
    I: IntoIterator<Item = PathBuf>,
{
    let mut candidates: Vec<PageFile> = paths
        .into_iter()
        .filter_map(|p| PageFile::from_path(&p))
        .collect();
    candidates.sort_by(compare_pages);

    let mut pages: Vec<PageFile> = Vec::with_capacity(candidates.len());
    for page in candidates {
        if let Some(kept) = pages.last().filter(|kept| same_page(kept, &page)) {
            tracing::warn!(
                file = %page.path.display(),
                kept = %kept.path.display(),
                "Duplicate page number, file skipped"
            );
            continue;
        }
        pages.push(page);
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|n| PathBuf::from("/ep1").join(n)).collect()
    }

    #[test]
    fn test_numeric_order_not_lexical() {
        let pages = collect_pages(paths(&["2.png", "10.png", "1.png"]));
        let stems: Vec<&str> = pages.iter().map(|p| p.stem.as_str()).collect();
        assert_eq!(stems, vec!["1", "2", "10"]);
    }

    #[test]
    fn test_reserved_and_foreign_files_skipped() {
        let pages = collect_pages(paths(&[
            "style.png",
            "LOGO.PNG",
            "notes.txt",
            "3.JPG",
            "cover-draft.webp",
        ]));
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].stem, "3");
        assert_eq!(pages[0].extension, "jpg");
        assert_eq!(pages[1].stem, "cover-draft");
        assert_eq!(pages[1].index, None);
    }

    #[test]
    fn test_duplicate_page_numbers_keep_one_file() {
        let pages = collect_pages(paths(&[
            "1.webp", "1.jpg", "2.jpeg", "01.png", "1.png", "a.jpg", "a.png",
        ]));
        let names: Vec<String> = pages
            .iter()
            .map(|p| format!("{}.{}", p.stem, p.extension))
            .collect();
        assert_eq!(names, vec!["01.png", "2.jpeg", "a.png"]);
    }

    #[test]
    fn test_roles() {
        assert_eq!(PageRole::from_index(0), PageRole::Cover);
        assert_eq!(PageRole::from_index(99), PageRole::BackCover);
        assert_eq!(PageRole::from_index(7), PageRole::Ordinary(7));

        let page = PageFile::from_path(Path::new("/ep1/99.png")).unwrap();
        assert!(page.is_back_cover());
        assert_eq!(page.role(), Some(PageRole::BackCover));
    }
}
