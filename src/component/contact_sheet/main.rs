use super::sheet::Sheet;
use super::video::Video;
use crate::config::{GeneratorSettings, OutputFormat, Sampling};
use crate::tools::{FfmpegDecoder, VideoFileInfo, collect_video_files, ensure_directory_exists};
use anyhow::{Context, Result};
use console::style;
use image::DynamicImage;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 預覽圖生成結果
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub total_videos: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// 批次預覽圖生成器
///
/// 對每部影片產生一張預覽圖，輸出為 `<檔名>_sheet.<副檔名>`。
pub struct ContactSheetGenerator {
    settings: GeneratorSettings,
    output_dir: Option<PathBuf>,
    overwrite: bool,
    shutdown_signal: Arc<AtomicBool>,
}

impl ContactSheetGenerator {
    #[must_use]
    pub const fn new(settings: GeneratorSettings, shutdown_signal: Arc<AtomicBool>) -> Self {
        Self {
            settings,
            output_dir: None,
            overwrite: false,
            shutdown_signal,
        }
    }

    /// 未指定時輸出到影片所在的資料夾
    #[must_use]
    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    #[must_use]
    pub const fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn run(&self, input: &Path) -> Result<GenerationResult> {
        println!("{}", style("=== 影片預覽圖生成 ===").cyan().bold());

        if let Some(output_dir) = &self.output_dir {
            ensure_directory_exists(output_dir)?;
        }

        let videos = collect_video_files(input, &self.settings)?;
        if videos.is_empty() {
            println!("{}", style("找不到任何影片檔案").yellow());
            return Ok(GenerationResult::default());
        }

        println!(
            "{}",
            style(format!(
                "找到 {} 個影片檔案，依檔案大小排序（由小到大）",
                videos.len()
            ))
            .green()
        );

        let result = self.process_videos(&videos);
        self.print_summary(&result);
        Ok(result)
    }

    fn process_videos(&self, videos: &[VideoFileInfo]) -> GenerationResult {
        let mut result = GenerationResult {
            total_videos: videos.len(),
            ..GenerationResult::default()
        };

        let progress_bar = ProgressBar::new(videos.len() as u64);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        for video in videos {
            if self.shutdown_signal.load(Ordering::SeqCst) {
                warn!("收到中斷訊號，停止處理");
                progress_bar.abandon_with_message("操作已中斷");
                return result;
            }

            let name = video
                .path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string();
            progress_bar.set_message(name.clone());

            let output_path =
                output_path_for(&video.path, self.output_dir.as_deref(), self.settings.format);
            if output_path.exists() && !self.overwrite {
                progress_bar.println(format!("  {} {name} 預覽圖已存在，跳過", style("⤳").dim()));
                result.skipped += 1;
                progress_bar.inc(1);
                continue;
            }

            match self.process_single_video(&video.path, &output_path) {
                Ok(()) => {
                    progress_bar.println(format!("  {} {name}", style("✓").green()));
                    result.successful += 1;
                }
                Err(e) => {
                    error!("處理影片失敗 {name}: {e:#}");
                    progress_bar.println(format!("  {} {name}: {e:#}", style("✗").red()));
                    result.failed += 1;
                }
            }
            progress_bar.inc(1);
        }

        progress_bar.finish_with_message("完成");
        result
    }

    fn process_single_video(&self, video_path: &Path, output_path: &Path) -> Result<()> {
        let decoder = FfmpegDecoder::new(&self.settings.ffmpeg);
        let mut video = Video::open(video_path, decoder)
            .with_context(|| format!("無法開啟影片: {}", video_path.display()))?;

        // 先設定終點，起點才能以新的終點為上限
        if let Some(end) = self.settings.end {
            video.set_end_time(end);
        }
        if let Some(start) = self.settings.start {
            video.set_start_time(start);
        }
        video.set_parallel(self.settings.parallel);

        let mut sheet = Sheet::with_style(video, self.settings.style.clone())?;
        let image = match self.settings.sampling() {
            Sampling::Interval(interval) => sheet.make_sheet_by_interval(interval)?,
            Sampling::Count(count) => sheet.make_sheet_by_number(count)?,
        };

        save_sheet(image, output_path, self.settings.format)?;
        info!("預覽圖已建立: {}", output_path.display());
        Ok(())
    }

    fn print_summary(&self, result: &GenerationResult) {
        println!();
        println!("{}", style("=== 預覽圖生成摘要 ===").cyan().bold());
        println!("  總計: {} 個影片", result.total_videos);
        println!("  成功: {} 個", style(result.successful).green());

        if result.skipped > 0 {
            println!("  跳過: {} 個", style(result.skipped).yellow());
        }

        if result.failed > 0 {
            println!("  失敗: {} 個", style(result.failed).red());
        }

        info!(
            "預覽圖生成完成 - 成功: {}, 跳過: {}, 失敗: {}",
            result.successful, result.skipped, result.failed
        );
    }
}

/// 預覽圖輸出路徑：`<輸出資料夾或影片資料夾>/<檔名>_sheet.<副檔名>`
#[must_use]
pub fn output_path_for(video_path: &Path, output_dir: Option<&Path>, format: OutputFormat) -> PathBuf {
    let stem = video_path
        .file_stem()
        .map_or_else(|| "video".to_string(), |s| s.to_string_lossy().to_string());
    let dir = output_dir
        .or_else(|| video_path.parent())
        .unwrap_or(Path::new("."));
    dir.join(format!("{stem}_sheet.{}", format.extension()))
}

/// 儲存預覽圖；JPEG 不支援透明度，先轉成 RGB
pub fn save_sheet(image: &DynamicImage, path: &Path, format: OutputFormat) -> Result<()> {
    let saved = match format {
        OutputFormat::Png => image.save_with_format(path, image::ImageFormat::Png),
        OutputFormat::Jpg => DynamicImage::ImageRgb8(image.to_rgb8())
            .save_with_format(path, image::ImageFormat::Jpeg),
    };
    saved.with_context(|| format!("無法儲存預覽圖: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_next_to_video() {
        let path = output_path_for(Path::new("/videos/trip.mp4"), None, OutputFormat::Png);
        assert_eq!(path, PathBuf::from("/videos/trip_sheet.png"));
    }

    #[test]
    fn test_output_path_in_output_dir() {
        let path = output_path_for(
            Path::new("/videos/trip.video.mkv"),
            Some(Path::new("/sheets")),
            OutputFormat::Jpg,
        );
        assert_eq!(path, PathBuf::from("/sheets/trip.video_sheet.jpg"));
    }

    #[test]
    fn test_save_sheet_jpg_drops_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.jpg");
        let image = DynamicImage::ImageRgba8(image::RgbaImage::new(16, 8));

        save_sheet(&image, &path, OutputFormat::Jpg).unwrap();

        let loaded = image::open(&path).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (16, 8));
    }

    #[test]
    fn test_run_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ContactSheetGenerator::new(
            GeneratorSettings::default(),
            Arc::new(AtomicBool::new(false)),
        );

        let result = generator.run(dir.path()).unwrap();
        assert_eq!(result, GenerationResult::default());
    }

    #[test]
    fn test_run_stops_on_shutdown_signal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.mp4"), b"fake").unwrap();
        let generator = ContactSheetGenerator::new(
            GeneratorSettings::default(),
            Arc::new(AtomicBool::new(true)),
        );

        let result = generator.run(dir.path()).unwrap();
        assert_eq!(result.total_videos, 1);
        assert_eq!(result.successful + result.failed + result.skipped, 0);
    }

    #[test]
    fn test_run_skips_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.mp4"), b"fake").unwrap();
        std::fs::write(dir.path().join("a_sheet.png"), b"done").unwrap();
        let generator = ContactSheetGenerator::new(
            GeneratorSettings::default(),
            Arc::new(AtomicBool::new(false)),
        );

        let result = generator.run(dir.path()).unwrap();
        assert_eq!(result.skipped, 1);
        assert_eq!(result.failed, 0);
    }
}
