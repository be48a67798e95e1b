mod decoder;
mod time_format;
mod video_scanner;

pub use decoder::{FfmpegDecoder, FrameDecoder};
pub use time_format::{format_header_duration, get_time_string, parse_duration};
pub use video_scanner::{VideoFileInfo, collect_video_files, ensure_directory_exists};
