//! 時間字串轉換
//!
//! ffmpeg 的 seek 參數、縮圖上的時間標籤與標頭的影片長度都從這裡產生。

use regex::Regex;
use std::sync::LazyLock;

static REGEX_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Duration:\s(?P<hours>\d+?):(?P<minutes>\d+?):(?P<seconds>\d+\.\d+?),")
        .expect("Invalid regex")
});

/// 秒數轉為不補零的 `H:M:S` 字串
///
/// 小數秒直接捨去，例如 `3661.9` → `1:1:1`。
#[must_use]
pub fn get_time_string(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let hours = (seconds / 3600.0).floor() as u64;
    let minutes = ((seconds % 3600.0) / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    format!("{hours}:{minutes}:{secs}")
}

/// 標頭使用的長度格式：小時寬度 4，分秒寬度 2，以空白補齊
#[must_use]
pub fn format_header_duration(duration: u64) -> String {
    let hours = duration / 3600;
    let minutes = (duration % 3600) / 60;
    let seconds = duration % 60;
    format!("{hours:4}:{minutes:2}:{seconds:2}")
}

/// 從 ffmpeg 輸出中解析 `Duration: HH:MM:SS.ss,`，回傳整數秒
#[must_use]
pub fn parse_duration(output: &str) -> Option<u64> {
    let caps = REGEX_DURATION.captures(output)?;
    let hours: f64 = caps["hours"].parse().ok()?;
    let minutes: f64 = caps["minutes"].parse().ok()?;
    let seconds: f64 = caps["seconds"].parse().ok()?;

    let total = hours.mul_add(3600.0, minutes * 60.0) + seconds;
    Some(total.trunc() as u64)
}
