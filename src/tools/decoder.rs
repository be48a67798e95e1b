use anyhow::{Context, Result, bail};
use log::debug;
use std::path::{Path, PathBuf};
use std::process::Command;

/// 影片解碼器介面
///
/// 只需要兩種呼叫：探測影片資訊的文字輸出，以及擷取指定時間點的單一畫面。
/// 兩者都是時間點的純函式，因此可以平行呼叫。
pub trait FrameDecoder: Send + Sync {
    /// 回傳解碼器的探測輸出（stdout 與 stderr 合併）
    fn probe(&self, path: &Path) -> Result<String>;

    /// 回傳 `timestamp`（`H:M:S`）處單一畫面的 PNG 編碼位元組
    fn extract_frame(&self, path: &Path, timestamp: &str) -> Result<Vec<u8>>;
}

/// 以 ffmpeg 子程序實作的解碼器
#[derive(Debug, Clone)]
pub struct FfmpegDecoder {
    binary: PathBuf,
}

impl Default for FfmpegDecoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegDecoder {
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn build_probe_command(&self, path: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["-hide_banner", "-nostdin", "-i"]).arg(path);
        cmd
    }

    fn build_extract_command(&self, path: &Path, timestamp: &str) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["-nostdin", "-ss", timestamp, "-i"])
            .arg(path)
            .args([
                "-f", "image2",
                "-frames:v", "1",
                "-c:v", "png",
                "-loglevel", "8",
                "-",
            ]);
        cmd
    }
}

impl FrameDecoder for FfmpegDecoder {
    fn probe(&self, path: &Path) -> Result<String> {
        debug!("探測影片資訊: {}", path.display());

        // 沒有指定輸出檔時 ffmpeg 一定以非零狀態結束，因此不檢查 exit status
        let output = self
            .build_probe_command(path)
            .output()
            .with_context(|| format!("無法執行 ffmpeg: {}", self.binary.display()))?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(text)
    }

    fn extract_frame(&self, path: &Path, timestamp: &str) -> Result<Vec<u8>> {
        debug!("擷取畫面 {timestamp}: {}", path.display());

        let output = self
            .build_extract_command(path, timestamp)
            .output()
            .with_context(|| format!("無法執行 ffmpeg 擷取畫面: {}", path.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("ffmpeg 擷取畫面失敗 ({timestamp}): {}", stderr.trim());
        }

        if output.stdout.is_empty() {
            bail!("ffmpeg 未輸出任何畫面 ({timestamp})");
        }

        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_of(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_extract_command_args() {
        let decoder = FfmpegDecoder::default();
        let cmd = decoder.build_extract_command(Path::new("/videos/a.mp4"), "0:1:30");

        assert_eq!(cmd.get_program(), "ffmpeg");
        assert_eq!(
            args_of(&cmd),
            vec![
                "-nostdin", "-ss", "0:1:30", "-i", "/videos/a.mp4", "-f", "image2", "-frames:v",
                "1", "-c:v", "png", "-loglevel", "8", "-",
            ]
        );
    }

    #[test]
    fn test_probe_command_args() {
        let decoder = FfmpegDecoder::new("/opt/ffmpeg/bin/ffmpeg");
        let cmd = decoder.build_probe_command(Path::new("/videos/a.mp4"));

        assert_eq!(cmd.get_program(), "/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(
            args_of(&cmd),
            vec!["-hide_banner", "-nostdin", "-i", "/videos/a.mp4"]
        );
    }

    #[test]
    fn test_missing_binary_is_error() {
        let decoder = FfmpegDecoder::new("/nonexistent/ffmpeg-binary");
        assert!(decoder.probe(Path::new("/videos/a.mp4")).is_err());
        assert!(
            decoder
                .extract_frame(Path::new("/videos/a.mp4"), "0:0:0")
                .is_err()
        );
    }
}
