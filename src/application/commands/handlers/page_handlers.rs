//! Page Command Handlers
//!
//! 导出与切图都是"扫描章节目录 → 并行处理每张页图 → 暂存目录换入"。
//! 图像计算放在阻塞线程池，单张失败只记录日志。

use futures_util::future::join_all;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::chapter_handlers::find_chapter;
use crate::application::commands::{ExportPages, SplitPages};
use crate::application::error::ApplicationError;
use crate::application::ports::ChapterRepositoryPort;
use crate::application::staging::StagedDir;
use crate::domain::chapter::ChapterMediaFolder;
use crate::domain::page::{
    collect_pages, decode, encode_jpeg, encode_png, render_export, split_quadrants, PageError,
    PageFile, PageRole, BACK_COVER_INDEX, EXPORT_JPEG_QUALITY, IMAGE_EXTENSIONS,
};

/// 页图批处理响应
#[derive(Debug, Clone)]
pub struct PageBatchResponse {
    /// 参与处理的页图数
    pub requested: usize,
    /// 成功处理的页图数
    pub processed: usize,
    /// 输出文件名（按页序）
    pub files: Vec<String>,
    pub output_dir: PathBuf,
}

// ============================================================================
// ExportPages
// ============================================================================

/// ExportPages Handler - 缩放到统一宽度、叠加水印、输出 JPEG
pub struct ExportPagesHandler {
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
    images_dir: PathBuf,
}

impl ExportPagesHandler {
    pub fn new(chapter_repo: Arc<dyn ChapterRepositoryPort>, images_dir: impl AsRef<Path>) -> Self {
        Self {
            chapter_repo,
            images_dir: images_dir.as_ref().to_path_buf(),
        }
    }

    pub async fn handle(&self, command: ExportPages) -> Result<PageBatchResponse, ApplicationError> {
        let chapter = find_chapter(self.chapter_repo.as_ref(), command.chapter_id).await?;
        let folder = ChapterMediaFolder::new(&self.images_dir, chapter.key());
        let chapter_dir = folder.chapter_dir();
        ensure_chapter_dir(&chapter_dir).await?;

        inherit_back_cover(&folder).await?;
        let logo = load_logo(&folder.novel_logo()).await;
        let pages = collect_pages(list_files(&chapter_dir).await?);

        let staged = StagedDir::begin(&folder.export_dir()).await?;
        let out_dir = staged.path().to_path_buf();

        let tasks = pages.iter().cloned().map(|page| {
            let logo = logo.clone();
            let out_dir = out_dir.clone();
            tokio::task::spawn_blocking(move || export_page(&page, logo.as_deref(), &out_dir))
        });
        let results = join_all(tasks).await;

        let files = collect_outputs(&pages, results);
        let output_dir = staged.commit().await?;

        tracing::info!(
            chapter = %folder.key(),
            requested = pages.len(),
            processed = files.len(),
            watermark = logo.is_some(),
            "Pages exported"
        );

        Ok(PageBatchResponse {
            requested: pages.len(),
            processed: files.len(),
            files: files.into_iter().flatten().collect(),
            output_dir,
        })
    }
}

fn export_page(
    page: &PageFile,
    logo: Option<&RgbaImage>,
    out_dir: &Path,
) -> Result<Vec<String>, PageError> {
    let source = decode(&std::fs::read(&page.path)?)?;
    let rendered = render_export(&source, logo);
    let bytes = encode_jpeg(&rendered, EXPORT_JPEG_QUALITY)?;

    let file_name = format!("{}.jpg", page.stem);
    std::fs::write(out_dir.join(&file_name), bytes)?;
    Ok(vec![file_name])
}

/// 章节没有封底时沿用小说级封底
async fn inherit_back_cover(folder: &ChapterMediaFolder) -> Result<(), ApplicationError> {
    let chapter_dir = folder.chapter_dir();
    let has_back_cover = collect_pages(list_files(&chapter_dir).await?)
        .iter()
        .any(PageFile::is_back_cover);
    if has_back_cover {
        return Ok(());
    }

    for ext in IMAGE_EXTENSIONS {
        let file_name = format!("{}.{}", BACK_COVER_INDEX, ext);
        let shared = folder.novel_dir().join(&file_name);
        if tokio::fs::try_exists(&shared).await.unwrap_or(false) {
            tokio::fs::copy(&shared, chapter_dir.join(&file_name)).await?;
            tracing::debug!(chapter = %folder.key(), file = %file_name, "Inherited novel back cover");
            break;
        }
    }
    Ok(())
}

/// 加载水印；缺失或无法解码时导出不带水印
async fn load_logo(path: &Path) -> Option<Arc<RgbaImage>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::info!(path = %path.display(), error = %e, "No logo, exporting without watermark");
            return None;
        }
    };

    let decoded = tokio::task::spawn_blocking(move || decode(&bytes).map(|img| img.to_rgba8())).await;
    match decoded {
        Ok(Ok(logo)) => Some(Arc::new(logo)),
        Ok(Err(e)) => {
            tracing::warn!(path = %path.display(), error = %e, "Logo undecodable, exporting without watermark");
            None
        }
        Err(e) => {
            tracing::error!(error = %e, "Logo decode task failed");
            None
        }
    }
}

// ============================================================================
// SplitPages
// ============================================================================

/// SplitPages Handler - 旧版四宫格切图
///
/// 封面原样复制为 `0.{ext}`，封底复制为 `{最大正文页号 + 1}.{ext}`，
/// 正文页按固定几何切成四张 PNG。
pub struct SplitPagesHandler {
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
    images_dir: PathBuf,
}

impl SplitPagesHandler {
    pub fn new(chapter_repo: Arc<dyn ChapterRepositoryPort>, images_dir: impl AsRef<Path>) -> Self {
        Self {
            chapter_repo,
            images_dir: images_dir.as_ref().to_path_buf(),
        }
    }

    pub async fn handle(&self, command: SplitPages) -> Result<PageBatchResponse, ApplicationError> {
        let chapter = find_chapter(self.chapter_repo.as_ref(), command.chapter_id).await?;
        let folder = ChapterMediaFolder::new(&self.images_dir, chapter.key());
        let chapter_dir = folder.chapter_dir();
        ensure_chapter_dir(&chapter_dir).await?;

        let pages: Vec<PageFile> = collect_pages(list_files(&chapter_dir).await?)
            .into_iter()
            .filter(|p| p.index.is_some())
            .collect();
        if pages.is_empty() {
            return Err(ApplicationError::precondition(format!(
                "No numbered page images in {}",
                chapter_dir.display()
            )));
        }

        let back_cover_number = pages
            .iter()
            .filter_map(|p| match p.role() {
                Some(PageRole::Ordinary(n)) => Some(n),
                _ => None,
            })
            .max()
            .map_or(1, |n| n.saturating_add(1));

        let staged = StagedDir::begin(&folder.split_dir()).await?;
        let out_dir = staged.path().to_path_buf();

        let tasks = pages.iter().cloned().map(|page| {
            let out_dir = out_dir.clone();
            tokio::task::spawn_blocking(move || split_page(&page, back_cover_number, &out_dir))
        });
        let results = join_all(tasks).await;

        let files = collect_outputs(&pages, results);
        let output_dir = staged.commit().await?;

        tracing::info!(
            chapter = %folder.key(),
            requested = pages.len(),
            processed = files.len(),
            "Pages split"
        );

        Ok(PageBatchResponse {
            requested: pages.len(),
            processed: files.len(),
            files: files.into_iter().flatten().collect(),
            output_dir,
        })
    }
}

fn split_page(
    page: &PageFile,
    back_cover_number: u32,
    out_dir: &Path,
) -> Result<Vec<String>, PageError> {
    let copy_as = |number: u32| -> Result<Vec<String>, PageError> {
        let file_name = format!("{}.{}", number, page.extension);
        std::fs::copy(&page.path, out_dir.join(&file_name))?;
        Ok(vec![file_name])
    };

    match page.role() {
        Some(PageRole::Cover) => copy_as(0),
        Some(PageRole::BackCover) => copy_as(back_cover_number),
        Some(PageRole::Ordinary(n)) => {
            let source = decode(&std::fs::read(&page.path)?)?;
            let mut files = Vec::with_capacity(4);
            for (q, tile) in split_quadrants(&source).iter().enumerate() {
                let file_name = format!("{}-{}.png", n, q + 1);
                std::fs::write(out_dir.join(&file_name), encode_png(tile)?)?;
                files.push(file_name);
            }
            Ok(files)
        }
        None => Ok(Vec::new()),
    }
}

// ============================================================================
// Helpers
// ============================================================================

async fn ensure_chapter_dir(chapter_dir: &Path) -> Result<(), ApplicationError> {
    match tokio::fs::metadata(chapter_dir).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        _ => Err(ApplicationError::precondition(format!(
            "Chapter folder not found: {}",
            chapter_dir.display()
        ))),
    }
}

/// 目录下的普通文件（不递归）
pub(crate) async fn list_files(dir: &Path) -> Result<Vec<PathBuf>, ApplicationError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }
    Ok(files)
}

/// 汇总各页结果，失败项只记录日志
fn collect_outputs(
    pages: &[PageFile],
    results: Vec<Result<Result<Vec<String>, PageError>, tokio::task::JoinError>>,
) -> Vec<Vec<String>> {
    pages
        .iter()
        .zip(results)
        .filter_map(|(page, result)| match result {
            Ok(Ok(files)) => Some(files),
            Ok(Err(e)) => {
                tracing::warn!(file = %page.path.display(), error = %e, "Page skipped");
                None
            }
            Err(e) => {
                tracing::error!(file = %page.path.display(), error = %e, "Page worker failed");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::ChapterRecord;
    use crate::domain::page::{EXPORT_WIDTH, SPLIT_CANVAS};
    use crate::test_support::{chapter_record, write_png, InMemoryChapterRepository};
    use image::{GenericImageView, Rgba};
    use uuid::Uuid;

    struct Fixture {
        root: tempfile::TempDir,
        repo: Arc<InMemoryChapterRepository>,
        chapter: ChapterRecord,
    }

    impl Fixture {
        async fn new() -> Self {
            let root = tempfile::tempdir().unwrap();
            let repo = Arc::new(InMemoryChapterRepository::default());
            let chapter = chapter_record(Uuid::new_v4(), 1, None);
            repo.save(&chapter).await.unwrap();
            Self { root, repo, chapter }
        }

        fn folder(&self) -> ChapterMediaFolder {
            ChapterMediaFolder::new(self.root.path(), self.chapter.key())
        }

        fn chapter_dir(&self) -> PathBuf {
            let dir = self.folder().chapter_dir();
            std::fs::create_dir_all(&dir).unwrap();
            dir
        }
    }

    #[tokio::test]
    async fn test_export_without_logo() {
        let fx = Fixture::new().await;
        let dir = fx.chapter_dir();
        for name in ["0.png", "1.png", "2.png", "99.png"] {
            write_png(&dir.join(name), 540, 960, Rgba([200, 10, 10, 255]));
        }
        write_png(&dir.join("style.png"), 10, 10, Rgba([0, 0, 0, 255]));

        let handler = ExportPagesHandler::new(fx.repo.clone(), fx.root.path());
        let resp = handler
            .handle(ExportPages { chapter_id: fx.chapter.id })
            .await
            .unwrap();

        assert_eq!(resp.requested, 4);
        assert_eq!(resp.processed, 4);
        assert_eq!(resp.files, vec!["0.jpg", "1.jpg", "2.jpg", "99.jpg"]);
        for file in &resp.files {
            let img = image::open(resp.output_dir.join(file)).unwrap();
            assert_eq!(img.dimensions(), (EXPORT_WIDTH, 1920));
        }
    }

    #[tokio::test]
    async fn test_export_numeric_order_and_watermark() {
        let fx = Fixture::new().await;
        let dir = fx.chapter_dir();
        for name in ["2.png", "10.png", "1.png"] {
            write_png(&dir.join(name), 1080, 1080, Rgba([255, 255, 255, 255]));
        }
        write_png(&fx.folder().novel_logo(), 100, 50, Rgba([0, 0, 255, 255]));

        let handler = ExportPagesHandler::new(fx.repo.clone(), fx.root.path());
        let resp = handler
            .handle(ExportPages { chapter_id: fx.chapter.id })
            .await
            .unwrap();

        assert_eq!(resp.files, vec!["1.jpg", "2.jpg", "10.jpg"]);
        let img = image::open(resp.output_dir.join("1.jpg")).unwrap().to_rgb8();
        // 右下角被水印覆盖，左上角保持原色
        assert!(img.get_pixel(1075, 1075)[2] > 200);
        assert!(img.get_pixel(1075, 1075)[0] < 60);
        assert!(img.get_pixel(5, 5)[0] > 200);
    }

    #[tokio::test]
    async fn test_export_inherits_novel_back_cover() {
        let fx = Fixture::new().await;
        let dir = fx.chapter_dir();
        write_png(&dir.join("1.png"), 100, 100, Rgba([1, 2, 3, 255]));
        write_png(&fx.folder().novel_dir().join("99.png"), 100, 100, Rgba([4, 5, 6, 255]));

        let handler = ExportPagesHandler::new(fx.repo.clone(), fx.root.path());
        let resp = handler
            .handle(ExportPages { chapter_id: fx.chapter.id })
            .await
            .unwrap();

        assert!(dir.join("99.png").exists());
        assert_eq!(resp.files, vec!["1.jpg", "99.jpg"]);
    }

    #[tokio::test]
    async fn test_export_skips_corrupt_file() {
        let fx = Fixture::new().await;
        let dir = fx.chapter_dir();
        write_png(&dir.join("1.png"), 100, 100, Rgba([1, 2, 3, 255]));
        std::fs::write(dir.join("2.png"), b"not an image").unwrap();

        let handler = ExportPagesHandler::new(fx.repo.clone(), fx.root.path());
        let resp = handler
            .handle(ExportPages { chapter_id: fx.chapter.id })
            .await
            .unwrap();

        assert_eq!(resp.requested, 2);
        assert_eq!(resp.processed, 1);
        assert_eq!(resp.files, vec!["1.jpg"]);
    }

    #[tokio::test]
    async fn test_same_page_number_in_two_formats_exports_once() {
        let fx = Fixture::new().await;
        let dir = fx.chapter_dir();
        let (w, h) = SPLIT_CANVAS;
        write_png(&dir.join("1.png"), w, h, Rgba([250, 0, 0, 255]));
        image::RgbImage::from_pixel(w, h, image::Rgb([0, 0, 250]))
            .save(dir.join("1.jpg"))
            .unwrap();

        let export = ExportPagesHandler::new(fx.repo.clone(), fx.root.path())
            .handle(ExportPages { chapter_id: fx.chapter.id })
            .await
            .unwrap();

        assert_eq!(export.requested, 1);
        assert_eq!(export.processed, 1);
        assert_eq!(export.files, vec!["1.jpg"]);
        let img = image::open(export.output_dir.join("1.jpg")).unwrap().to_rgb8();
        assert!(img.get_pixel(50, 50)[0] > 200);
        assert_eq!(std::fs::read_dir(&export.output_dir).unwrap().count(), 1);

        let split = SplitPagesHandler::new(fx.repo.clone(), fx.root.path())
            .handle(SplitPages { chapter_id: fx.chapter.id })
            .await
            .unwrap();

        assert_eq!(split.requested, 1);
        assert_eq!(split.files, vec!["1-1.png", "1-2.png", "1-3.png", "1-4.png"]);
    }

    #[tokio::test]
    async fn test_export_removes_previous_run() {
        let fx = Fixture::new().await;
        let dir = fx.chapter_dir();
        write_png(&dir.join("1.png"), 100, 100, Rgba([1, 2, 3, 255]));
        let export_dir = fx.folder().export_dir();
        std::fs::create_dir_all(&export_dir).unwrap();
        std::fs::write(export_dir.join("7.jpg"), b"stale").unwrap();

        let handler = ExportPagesHandler::new(fx.repo.clone(), fx.root.path());
        handler
            .handle(ExportPages { chapter_id: fx.chapter.id })
            .await
            .unwrap();

        assert!(export_dir.join("1.jpg").exists());
        assert!(!export_dir.join("7.jpg").exists());
    }

    #[tokio::test]
    async fn test_export_missing_folder_is_precondition_failure() {
        let fx = Fixture::new().await;
        let handler = ExportPagesHandler::new(fx.repo.clone(), fx.root.path());

        let err = handler
            .handle(ExportPages { chapter_id: fx.chapter.id })
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::PreconditionFailed(_)));
    }

    #[tokio::test]
    async fn test_export_unknown_chapter() {
        let fx = Fixture::new().await;
        let handler = ExportPagesHandler::new(fx.repo.clone(), fx.root.path());

        let err = handler
            .handle(ExportPages { chapter_id: Uuid::new_v4() })
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_split_layout_and_back_cover_number() {
        let fx = Fixture::new().await;
        let dir = fx.chapter_dir();
        let (w, h) = SPLIT_CANVAS;
        write_png(&dir.join("0.png"), 50, 50, Rgba([9, 9, 9, 255]));
        write_png(&dir.join("1.png"), w, h, Rgba([10, 20, 30, 255]));
        write_png(&dir.join("2.png"), w, h, Rgba([40, 50, 60, 255]));
        write_png(&dir.join("99.png"), 50, 50, Rgba([7, 7, 7, 255]));

        let handler = SplitPagesHandler::new(fx.repo.clone(), fx.root.path());
        let resp = handler
            .handle(SplitPages { chapter_id: fx.chapter.id })
            .await
            .unwrap();

        assert_eq!(resp.processed, 4);
        assert_eq!(
            resp.files,
            vec![
                "0.png", "1-1.png", "1-2.png", "1-3.png", "1-4.png", "2-1.png", "2-2.png",
                "2-3.png", "2-4.png", "3.png"
            ]
        );
        assert_eq!(
            std::fs::read(dir.join("99.png")).unwrap(),
            std::fs::read(resp.output_dir.join("3.png")).unwrap()
        );
        let tile = image::open(resp.output_dir.join("2-4.png")).unwrap();
        assert_eq!(tile.dimensions(), (832, 1216));
    }

    #[tokio::test]
    async fn test_split_twice_is_byte_identical() {
        let fx = Fixture::new().await;
        let dir = fx.chapter_dir();
        let (w, h) = SPLIT_CANVAS;
        write_png(&dir.join("1.png"), w, h, Rgba([10, 20, 30, 255]));

        let handler = SplitPagesHandler::new(fx.repo.clone(), fx.root.path());
        let first = handler
            .handle(SplitPages { chapter_id: fx.chapter.id })
            .await
            .unwrap();
        let bytes: Vec<Vec<u8>> = first
            .files
            .iter()
            .map(|f| std::fs::read(first.output_dir.join(f)).unwrap())
            .collect();

        let second = handler
            .handle(SplitPages { chapter_id: fx.chapter.id })
            .await
            .unwrap();

        assert_eq!(first.files, second.files);
        for (file, expected) in second.files.iter().zip(bytes) {
            assert_eq!(std::fs::read(second.output_dir.join(file)).unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn test_split_back_cover_without_ordinary_pages() {
        let fx = Fixture::new().await;
        let dir = fx.chapter_dir();
        write_png(&dir.join("99.png"), 20, 20, Rgba([7, 7, 7, 255]));

        let handler = SplitPagesHandler::new(fx.repo.clone(), fx.root.path());
        let resp = handler
            .handle(SplitPages { chapter_id: fx.chapter.id })
            .await
            .unwrap();

        assert_eq!(resp.files, vec!["1.png"]);
    }

    #[tokio::test]
    async fn test_split_back_cover_after_largest_page_number() {
        let fx = Fixture::new().await;
        let dir = fx.chapter_dir();
        let (w, h) = SPLIT_CANVAS;
        write_png(&dir.join("4294967295.png"), w, h, Rgba([10, 20, 30, 255]));
        write_png(&dir.join("99.png"), 20, 20, Rgba([7, 7, 7, 255]));

        let handler = SplitPagesHandler::new(fx.repo.clone(), fx.root.path());
        let resp = handler
            .handle(SplitPages { chapter_id: fx.chapter.id })
            .await
            .unwrap();

        assert_eq!(resp.processed, 2);
        assert!(resp.files.contains(&"4294967295.png".to_string()));
        assert!(resp.files.contains(&"4294967295-4.png".to_string()));
    }

    #[tokio::test]
    async fn test_split_without_numbered_pages_fails() {
        let fx = Fixture::new().await;
        let dir = fx.chapter_dir();
        write_png(&dir.join("cover-draft.png"), 20, 20, Rgba([7, 7, 7, 255]));

        let handler = SplitPagesHandler::new(fx.repo.clone(), fx.root.path());
        let err = handler
            .handle(SplitPages { chapter_id: fx.chapter.id })
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::PreconditionFailed(_)));
        assert!(!fx.folder().split_dir().exists());
    }
}
