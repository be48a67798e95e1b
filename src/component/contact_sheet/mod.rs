//! 影片預覽圖元件
//!
//! 流程：
//! A. 開啟影片（檔案大小、第一個畫面、影片長度）
//! B. 依間隔或張數計算取樣時間點
//! C. 擷取並縮小縮圖
//! D. 排成固定欄數的網格並加上時間標籤
//! E. 加上標頭後輸出單張圖片

mod main;
mod sheet;
mod text_renderer;
mod video;

pub use main::{ContactSheetGenerator, GenerationResult, output_path_for, save_sheet};
pub use sheet::{GridCell, Sheet};
pub use text_renderer::{SheetFont, find_system_font};
pub use video::{MAX_SAMPLES, Thumbnail, Video, get_file_size, sample_timestamps};
