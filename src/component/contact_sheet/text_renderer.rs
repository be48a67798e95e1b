use crate::config::{FontSpec, Rgba};
use crate::error::SheetError;
use ab_glyph::{FontVec, PxScale};
use anyhow::Result;
use image::RgbaImage;
use imageproc::drawing::draw_text_mut;
use std::fs;
use std::path::{Path, PathBuf};

/// 未指定字型時，命令列會依序嘗試這些常見的系統字型
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// 已載入的字型
pub struct SheetFont {
    font: FontVec,
    scale: PxScale,
    path: PathBuf,
}

impl std::fmt::Debug for SheetFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetFont")
            .field("path", &self.path)
            .field("scale", &self.scale.y)
            .finish_non_exhaustive()
    }
}

impl SheetFont {
    /// 依設定載入字型，沒有指定路徑時回傳 `None`
    pub fn load(spec: &FontSpec) -> Result<Option<Self>> {
        spec.path
            .as_deref()
            .map(|path| Self::from_file(path, spec.size))
            .transpose()
    }

    pub fn from_file(path: &Path, size: f32) -> Result<Self> {
        let font_load_error = |reason: String| SheetError::FontLoad {
            path: path.to_path_buf(),
            reason,
        };

        let data = fs::read(path).map_err(|e| font_load_error(e.to_string()))?;
        let font = FontVec::try_from_vec(data).map_err(|e| font_load_error(e.to_string()))?;

        Ok(Self {
            font,
            scale: PxScale::from(size),
            path: path.to_path_buf(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 以 `(x, y)` 為左上角繪製單行文字
    pub fn draw(&self, canvas: &mut RgbaImage, colour: Rgba, position: (u32, u32), text: &str) {
        let x = i32::try_from(position.0).unwrap_or(i32::MAX);
        let y = i32::try_from(position.1).unwrap_or(i32::MAX);
        draw_text_mut(canvas, colour.to_pixel(), x, y, self.scale, &self.font, text);
    }
}

/// 找出第一個存在的系統字型
#[must_use]
pub fn find_system_font() -> Option<PathBuf> {
    SYSTEM_FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|path| path.is_file())
}
