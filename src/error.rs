//! 預覽圖生成的錯誤類型
//!
//! 公開函式回傳 `anyhow::Result`，需要分辨失敗原因時可用
//! `downcast_ref::<SheetError>()` 取回這裡的型別。

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetError {
    /// ffmpeg 輸出中找不到 `Duration: HH:MM:SS.ss,`
    #[error("無法從解碼器輸出解析影片長度: {path}")]
    DurationNotFound { path: PathBuf },

    /// 時間 0 的畫面無法解碼，無法得知解析度與色彩模式
    #[error("無法解碼影片第一個畫面: {path}")]
    NoInitialFrame { path: PathBuf },

    #[error("取樣間隔必須為大於 0 的有限值: {0}")]
    InvalidInterval(f64),

    #[error("取樣數量過多: {count} 個（上限 {max}）")]
    TooManySamples { count: f64, max: usize },

    #[error("縮圖數量至少需要 2 張: {0}")]
    InvalidCount(usize),

    #[error("無效的設定值 {name}: {reason}")]
    InvalidProperty { name: &'static str, reason: String },

    #[error("不支援的設定項目: {0}")]
    UnsupportedProperty(String),

    #[error("無法載入字型 {path}: {reason}")]
    FontLoad { path: PathBuf, reason: String },

    #[error("網格尺寸超出範圍: {columns} 欄 x {rows} 列，每格 {width}x{height}")]
    GridTooLarge {
        columns: u32,
        rows: u32,
        width: u32,
        height: u32,
    },

    /// 標頭寬度取自網格，必須先建立網格
    #[error("尚未建立縮圖網格")]
    GridMissing,
}
