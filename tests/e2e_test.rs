//! E2E 測試 - 使用真正的 ffmpeg 產生測試影片並輸出預覽圖
//!
//! 系統上沒有 ffmpeg 時跳過。

use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use image::{ColorType, GenericImageView};
use video_sheet::component::contact_sheet::{
    ContactSheetGenerator, Sheet, Video, find_system_font, output_path_for,
};
use video_sheet::config::{FontSpec, GeneratorSettings, OutputFormat};
use video_sheet::tools::{FfmpegDecoder, FrameDecoder, parse_duration};

fn ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .output()
        .is_ok_and(|output| output.status.success())
}

/// 以 lavfi testsrc 產生指定長度的測試影片
fn create_test_video(path: &Path, seconds: u32) -> bool {
    Command::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error", "-y", "-f", "lavfi", "-i"])
        .arg(format!("testsrc=duration={seconds}:size=320x240:rate=10"))
        .args(["-pix_fmt", "yuv420p"])
        .arg(path)
        .output()
        .is_ok_and(|output| output.status.success())
}

#[test]
fn test_ffmpeg_probe_and_frame() {
    if !ffmpeg_available() {
        println!("跳過測試：找不到 ffmpeg");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let video_path = dir.path().join("probe.mp4");
    assert!(create_test_video(&video_path, 6), "無法建立測試影片");

    let decoder = FfmpegDecoder::default();
    let probe = decoder.probe(&video_path).unwrap();
    assert_eq!(parse_duration(&probe), Some(6));

    let frame = decoder.extract_frame(&video_path, "0:0:2").unwrap();
    let image = image::load_from_memory(&frame).unwrap();
    assert_eq!(image.dimensions(), (320, 240));

    // 超過影片長度時沒有畫面
    assert!(decoder.extract_frame(&video_path, "0:1:0").is_err());
}

#[test]
fn test_sheet_from_real_video() {
    if !ffmpeg_available() {
        println!("跳過測試：找不到 ffmpeg");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let video_path = dir.path().join("sample.mp4");
    assert!(create_test_video(&video_path, 6), "無法建立測試影片");

    let video = Video::open(&video_path, FfmpegDecoder::default()).unwrap();
    assert_eq!(video.duration(), 6);
    assert_eq!(video.resolution(), (320, 240));
    assert_eq!(video.mode(), ColorType::Rgb8);

    let mut sheet = Sheet::new(video);
    let (width, height) = sheet.make_sheet_by_interval(2.0).unwrap().dimensions();

    // 0、2、4 秒一定有畫面，6 秒剛好在結尾可能沒有
    let count = sheet.video().thumbcount();
    assert!((3..=4).contains(&count), "thumbcount={count}");
    assert_eq!(sheet.video().thumbsize(), (220, 165));
    assert_eq!((width, height), (220 * 5, 100 + 165));
}

#[test]
fn test_generator_writes_sheet() {
    if !ffmpeg_available() {
        println!("跳過測試：找不到 ffmpeg");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let input_dir = dir.path().join("videos");
    let output_dir = dir.path().join("sheets");
    std::fs::create_dir_all(&input_dir).unwrap();

    let video_path = input_dir.join("clip.mp4");
    assert!(create_test_video(&video_path, 4), "無法建立測試影片");
    std::fs::write(input_dir.join("notes.txt"), "not a video").unwrap();

    let mut settings = GeneratorSettings::default();
    settings.count = Some(3);
    settings.parallel = true;
    settings.format = OutputFormat::Jpg;
    if let Some(font) = find_system_font() {
        settings.style.font = FontSpec::new(font, 15.0);
    }

    let generator = ContactSheetGenerator::new(settings, Arc::new(AtomicBool::new(false)))
        .with_output_dir(Some(output_dir.clone()));

    let result = generator.run(&input_dir).unwrap();
    assert_eq!(result.total_videos, 1);
    assert_eq!(result.successful, 1);
    assert_eq!(result.failed, 0);

    let sheet_path = output_path_for(&video_path, Some(&output_dir), OutputFormat::Jpg);
    assert!(sheet_path.exists());
    let sheet = image::open(&sheet_path).unwrap();
    assert_eq!(sheet.width(), 220 * 5);

    // 再跑一次應該跳過已存在的預覽圖
    let result = generator.run(&input_dir).unwrap();
    assert_eq!(result.skipped, 1);
}
