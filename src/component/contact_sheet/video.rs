use crate::error::SheetError;
use crate::tools::{FrameDecoder, get_time_string, parse_duration};
use anyhow::{Context, Result};
use image::{ColorType, DynamicImage, GenericImageView};
use log::{debug, warn};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// 浮點誤差容許值，避免 (end-start)/interval 剛好整除時少算一張
const SAMPLE_EPSILON: f64 = 1e-9;

/// 單次產生的取樣上限
pub const MAX_SAMPLES: usize = 100_000;

/// 已擷取的縮圖與其取樣時間點
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub timestamp: f64,
    pub image: DynamicImage,
}

/// 來源影片
///
/// 開啟時呼叫解碼器兩次：擷取時間 0 的畫面（取得解析度與色彩模式），
/// 以及探測影片長度。
pub struct Video {
    filename: PathBuf,
    filesize: f64,
    resolution: (u32, u32),
    mode: ColorType,
    duration: u64,
    start: f64,
    end: f64,
    thumbnails: Vec<Thumbnail>,
    thumbsize: (u32, u32),
    parallel: bool,
    decoder: Box<dyn FrameDecoder>,
}

impl std::fmt::Debug for Video {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Video")
            .field("filename", &self.filename)
            .field("filesize", &self.filesize)
            .field("resolution", &self.resolution)
            .field("mode", &self.mode)
            .field("duration", &self.duration)
            .field("start", &self.start)
            .field("end", &self.end)
            .field("thumbcount", &self.thumbnails.len())
            .field("thumbsize", &self.thumbsize)
            .finish_non_exhaustive()
    }
}

impl Video {
    pub fn open(path: impl AsRef<Path>, decoder: impl FrameDecoder + 'static) -> Result<Self> {
        let filename = path.as_ref().to_path_buf();
        let decoder: Box<dyn FrameDecoder> = Box::new(decoder);

        let filesize = get_file_size(&filename)?;
        let example = fetch_frame(decoder.as_ref(), &filename, 0.0).ok_or_else(|| {
            SheetError::NoInitialFrame {
                path: filename.clone(),
            }
        })?;
        let duration = probe_duration(decoder.as_ref(), &filename)?;

        let resolution = example.dimensions();
        debug!(
            "開啟影片 {}: {}x{}, {duration}s, {filesize:.2} MB",
            filename.display(),
            resolution.0,
            resolution.1
        );

        Ok(Self {
            filename,
            filesize,
            resolution,
            mode: example.color(),
            duration,
            start: 0.0,
            end: duration as f64,
            thumbnails: Vec::new(),
            thumbsize: resolution,
            parallel: false,
            decoder,
        })
    }

    #[must_use]
    pub fn filename(&self) -> &Path {
        &self.filename
    }

    /// 檔案大小（MB）
    #[must_use]
    pub const fn filesize(&self) -> f64 {
        self.filesize
    }

    #[must_use]
    pub const fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    #[must_use]
    pub const fn mode(&self) -> ColorType {
        self.mode
    }

    /// 影片長度（整數秒）
    #[must_use]
    pub const fn duration(&self) -> u64 {
        self.duration
    }

    #[must_use]
    pub const fn start(&self) -> f64 {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> f64 {
        self.end
    }

    #[must_use]
    pub fn thumbnails(&self) -> &[Thumbnail] {
        &self.thumbnails
    }

    #[must_use]
    pub const fn thumbsize(&self) -> (u32, u32) {
        self.thumbsize
    }

    #[must_use]
    pub fn thumbcount(&self) -> usize {
        self.thumbnails.len()
    }

    #[must_use]
    pub const fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// 開啟後以 rayon 平行擷取畫面，結果順序仍依時間點排列
    pub fn set_parallel(&mut self, parallel: bool) {
        self.parallel = parallel;
    }

    /// 重新探測影片長度（整數秒）
    pub fn get_video_duration(&self) -> Result<u64> {
        probe_duration(self.decoder.as_ref(), &self.filename)
    }

    /// 擷取指定秒數的畫面，無法解碼時回傳 `None`
    ///
    /// 秒數先轉成 `H:M:S`，因此小數秒會被捨去。
    #[must_use]
    pub fn get_frame_at(&self, seektime: f64) -> Option<DynamicImage> {
        fetch_frame(self.decoder.as_ref(), &self.filename, seektime)
    }

    /// 限制在 `[0, end]`
    pub fn set_start_time(&mut self, seconds: f64) {
        self.start = seconds.max(0.0).min(self.end);
    }

    /// 限制在 `[start, duration]`
    pub fn set_end_time(&mut self, seconds: f64) {
        self.end = seconds.min(self.duration as f64).max(self.start);
    }

    /// 從 start 開始每隔 `interval` 秒取樣直到 end（含）
    ///
    /// 無法解碼的時間點會被略過，因此張數可能少於取樣次數。
    pub fn make_thumbnails(&mut self, interval: f64) -> Result<&[Thumbnail]> {
        let timestamps = sample_timestamps(self.start, self.end, interval)?;
        debug!(
            "取樣 {} 個時間點: {:.2}s ~ {:.2}s, 間隔 {interval:.3}s",
            timestamps.len(),
            self.start,
            self.end
        );

        let frames: Vec<Option<DynamicImage>> = if self.parallel {
            timestamps
                .par_iter()
                .map(|&seektime| self.get_frame_at(seektime))
                .collect()
        } else {
            timestamps
                .iter()
                .map(|&seektime| self.get_frame_at(seektime))
                .collect()
        };

        let thumbnails: Vec<Thumbnail> = timestamps
            .iter()
            .zip(frames)
            .filter_map(|(&timestamp, frame)| frame.map(|image| Thumbnail { timestamp, image }))
            .collect();

        let skipped = timestamps.len() - thumbnails.len();
        if skipped > 0 {
            warn!(
                "{} 個時間點無法解碼已略過: {}",
                skipped,
                self.filename.display()
            );
        }

        self.thumbnails = thumbnails;
        Ok(&self.thumbnails)
    }

    /// 將所有縮圖等比例縮小至 `max_size` 以內（不放大）
    pub fn shrink_thumbs(&mut self, max_size: (u32, u32)) {
        if self.thumbnails.is_empty() {
            return;
        }

        let (max_width, max_height) = max_size;
        for thumb in &mut self.thumbnails {
            let (width, height) = thumb.image.dimensions();
            if width > max_width || height > max_height {
                thumb.image = thumb.image.thumbnail(max_width, max_height);
            }
        }

        self.thumbsize = self.thumbnails[0].image.dimensions();
    }
}

/// 檔案大小（MB）
pub fn get_file_size(path: &Path) -> Result<f64> {
    let metadata =
        fs::metadata(path).with_context(|| format!("無法讀取檔案資訊: {}", path.display()))?;
    Ok(metadata.len() as f64 / 1_048_576.0)
}

/// 計算取樣時間點，張數為 floor((end-start)/interval) + 1
pub fn sample_timestamps(start: f64, end: f64, interval: f64) -> Result<Vec<f64>> {
    if !(interval.is_finite() && interval > 0.0) {
        return Err(SheetError::InvalidInterval(interval).into());
    }

    let span = (end - start).max(0.0);
    let steps = (span / interval + SAMPLE_EPSILON).floor();
    if !steps.is_finite() || steps >= MAX_SAMPLES as f64 {
        return Err(SheetError::TooManySamples {
            count: steps + 1.0,
            max: MAX_SAMPLES,
        }
        .into());
    }
    let count = steps as usize + 1;

    Ok((0..count)
        .map(|i| (i as f64).mul_add(interval, start).min(end))
        .collect())
}

fn probe_duration(decoder: &dyn FrameDecoder, path: &Path) -> Result<u64> {
    let output = decoder.probe(path)?;
    parse_duration(&output).ok_or_else(|| {
        SheetError::DurationNotFound {
            path: path.to_path_buf(),
        }
        .into()
    })
}

fn fetch_frame(decoder: &dyn FrameDecoder, path: &Path, seektime: f64) -> Option<DynamicImage> {
    let timestring = get_time_string(seektime);
    let frame = decoder
        .extract_frame(path, &timestring)
        .and_then(|bytes| image::load_from_memory(&bytes).context("無法解碼畫面"));

    match frame {
        Ok(image) => Some(image),
        Err(e) => {
            debug!("時間點 {timestring} 沒有畫面: {e:#}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_timestamps_inclusive_end() {
        let timestamps = sample_timestamps(0.0, 30.0, 10.0).unwrap();
        assert_eq!(timestamps, vec![0.0, 10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_sample_timestamps_partial_step() {
        let timestamps = sample_timestamps(5.0, 30.0, 10.0).unwrap();
        assert_eq!(timestamps, vec![5.0, 15.0, 25.0]);
    }

    #[test]
    fn test_sample_timestamps_count_formula() {
        for (start, end, interval) in [(0.0_f64, 100.0_f64, 7.0_f64), (12.5, 40.0, 3.3), (0.0, 1.0, 2.0)] {
            let expected = ((end - start) / interval).floor() as usize + 1;
            assert_eq!(sample_timestamps(start, end, interval).unwrap().len(), expected);
        }
    }

    #[test]
    fn test_sample_timestamps_even_division_is_not_short() {
        // 30/7 再乘回 7 不一定剛好是 30
        for count in 2..60_usize {
            let interval = 30.0 / (count - 1) as f64;
            let timestamps = sample_timestamps(0.0, 30.0, interval).unwrap();
            assert_eq!(timestamps.len(), count, "count={count}");
            assert!((timestamps[count - 1] - 30.0).abs() < 1e-6);
            assert!(timestamps.iter().all(|t| *t <= 30.0));
        }
    }

    #[test]
    fn test_sample_timestamps_empty_window() {
        assert_eq!(sample_timestamps(10.0, 10.0, 5.0).unwrap(), vec![10.0]);
    }

    #[test]
    fn test_sample_timestamps_invalid_interval() {
        for interval in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = sample_timestamps(0.0, 10.0, interval).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<SheetError>(),
                Some(SheetError::InvalidInterval(_))
            ));
        }
    }

    #[test]
    fn test_sample_timestamps_too_many_samples() {
        for interval in [1e-300, f64::MIN_POSITIVE, 30.0 / MAX_SAMPLES as f64] {
            let err = sample_timestamps(0.0, 30.0, interval).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<SheetError>(),
                Some(SheetError::TooManySamples { max: MAX_SAMPLES, .. })
            ));
        }

        let timestamps = sample_timestamps(0.0, 30.0, 30.0 / (MAX_SAMPLES - 1) as f64).unwrap();
        assert_eq!(timestamps.len(), MAX_SAMPLES);
        assert!(timestamps.last().is_some_and(|t| (t - 30.0).abs() < 1e-6));
    }

    #[test]
    fn test_get_file_size_in_megabytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("video.mp4");
        fs::write(&path, vec![0_u8; 524_288]).unwrap();

        assert!((get_file_size(&path).unwrap() - 0.5).abs() < 1e-12);
        assert!(get_file_size(&dir.path().join("missing.mp4")).is_err());
    }
}
