use crate::config::GeneratorSettings;
use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct VideoFileInfo {
    pub path: PathBuf,
    pub size: u64,
}

/// 收集要處理的影片
///
/// 輸入為檔案時直接回傳該檔案；為資料夾時遞迴掃描符合副檔名的影片，
/// 依檔案大小由小到大排序。
pub fn collect_video_files(input: &Path, settings: &GeneratorSettings) -> Result<Vec<VideoFileInfo>> {
    if !input.exists() {
        bail!("路徑不存在: {}", input.display());
    }

    if input.is_file() {
        let size = input
            .metadata()
            .with_context(|| format!("無法讀取檔案資訊: {}", input.display()))?
            .len();
        return Ok(vec![VideoFileInfo {
            path: input.to_path_buf(),
            size,
        }]);
    }

    let mut video_files: Vec<VideoFileInfo> = WalkDir::new(input)
        .follow_links(false)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| settings.is_video_file(entry.path()))
        .filter_map(|entry| {
            let metadata = entry.metadata().ok()?;
            Some(VideoFileInfo {
                path: entry.into_path(),
                size: metadata.len(),
            })
        })
        .collect();

    video_files.sort_by_key(|file| file.size);
    Ok(video_files)
}

pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if path.exists() && !path.is_dir() {
        bail!("路徑不是資料夾: {}", path.display());
    }
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("無法建立資料夾: {}", path.display()))?;
    }
    Ok(())
}
