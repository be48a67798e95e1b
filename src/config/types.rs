use crate::error::SheetError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// 預設縮圖數量（未指定間隔或數量時使用）
pub const DEFAULT_THUMBNAIL_COUNT: usize = 20;

/// 網格欄數上限
pub const MAX_GRID_COLUMN: u32 = 1_000;

/// 預設會被掃描的影片副檔名
pub const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &[
    ".mp4", ".mkv", ".avi", ".mov", ".wmv", ".flv", ".webm", ".m4v", ".mpg", ".mpeg", ".ts",
    ".m2ts", ".3gp", ".ogv", ".rmvb",
];

/// RGBA 顏色，序列化為四個元素的陣列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const TRANSPARENT_BLACK: Self = Self([0, 0, 0, 0]);
    pub const WHITE: Self = Self([255, 255, 255, 255]);

    #[must_use]
    pub const fn to_pixel(self) -> image::Rgba<u8> {
        image::Rgba(self.0)
    }
}

impl FromStr for Rgba {
    type Err = anyhow::Error;

    /// 接受 `RRGGBB` 或 `RRGGBBAA`，可帶前導 `#`
    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if !matches!(hex.len(), 6 | 8) || !hex.is_ascii() {
            anyhow::bail!("顏色格式錯誤（需要 RRGGBB 或 RRGGBBAA）: {s}");
        }

        let mut channels = [0, 0, 0, 255];
        for (i, channel) in channels.iter_mut().enumerate().take(hex.len() / 2) {
            *channel = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .with_context(|| format!("顏色格式錯誤: {s}"))?;
        }
        Ok(Self(channels))
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}{a:02x}")
    }
}

/// 字型設定：字型檔路徑與像素大小
///
/// 沒有指定路徑時不繪製任何文字。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FontSpec {
    pub path: Option<PathBuf>,
    pub size: f32,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            path: None,
            size: 15.0,
        }
    }
}

impl FontSpec {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, size: f32) -> Self {
        Self {
            path: Some(path.into()),
            size,
        }
    }
}

/// 預覽圖樣式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SheetStyle {
    pub font: FontSpec,
    #[serde(alias = "backgroundColour")]
    pub background_colour: Rgba,
    #[serde(alias = "textColour")]
    pub text_colour: Rgba,
    #[serde(alias = "headerSize")]
    pub header_size: u32,
    #[serde(alias = "gridColumn")]
    pub grid_column: u32,
    #[serde(alias = "maxThumbSize")]
    pub max_thumb_size: (u32, u32),
    pub timestamp: bool,
}

impl Default for SheetStyle {
    fn default() -> Self {
        Self {
            font: FontSpec::default(),
            background_colour: Rgba::TRANSPARENT_BLACK,
            text_colour: Rgba::WHITE,
            header_size: 100,
            grid_column: 5,
            max_thumb_size: (220, 220),
            timestamp: true,
        }
    }
}

/// 單一樣式設定項目
///
/// 僅有這七種，其他名稱在編譯期就無法表示。
#[derive(Debug, Clone, PartialEq)]
pub enum SheetProperty {
    Font(FontSpec),
    BackgroundColour(Rgba),
    TextColour(Rgba),
    HeaderSize(u32),
    GridColumn(u32),
    MaxThumbSize(u32, u32),
    Timestamp(bool),
}

impl SheetProperty {
    pub const NAMES: [&'static str; 7] = [
        "font",
        "background_colour",
        "text_colour",
        "header_size",
        "grid_column",
        "max_thumb_size",
        "timestamp",
    ];

    /// 由名稱與 JSON 值建立設定項目
    ///
    /// 名稱可用 `grid_column` 或 `gridColumn` 兩種寫法。
    /// `font` 的值為 `[路徑, 大小]`，顏色可為陣列或十六進位字串。
    pub fn from_name(name: &str, value: serde_json::Value) -> Result<Self> {
        let Some(name) = Self::canonical_name(name) else {
            return Err(SheetError::UnsupportedProperty(name.to_string()).into());
        };
        let invalid = |e: serde_json::Error| SheetError::InvalidProperty {
            name,
            reason: e.to_string(),
        };

        let property = match name {
            "font" => {
                let (path, size): (PathBuf, f32) = serde_json::from_value(value).map_err(invalid)?;
                Self::Font(FontSpec::new(path, size))
            }
            "background_colour" => Self::BackgroundColour(parse_colour_value(name, value)?),
            "text_colour" => Self::TextColour(parse_colour_value(name, value)?),
            "header_size" => Self::HeaderSize(serde_json::from_value(value).map_err(invalid)?),
            "grid_column" => Self::GridColumn(serde_json::from_value(value).map_err(invalid)?),
            "max_thumb_size" => {
                let (width, height): (u32, u32) =
                    serde_json::from_value(value).map_err(invalid)?;
                Self::MaxThumbSize(width, height)
            }
            _ => Self::Timestamp(serde_json::from_value(value).map_err(invalid)?),
        };
        Ok(property)
    }

    /// 解析 `name=value` 形式的命令列參數
    ///
    /// 顏色直接以十六進位字串解讀；其他值以 JSON 解讀，失敗時當作字串。
    pub fn parse_assignment(assignment: &str) -> Result<Self> {
        let (name, raw) = assignment
            .split_once('=')
            .with_context(|| format!("設定格式應為 name=value: {assignment}"))?;
        let (name, raw) = (name.trim(), raw.trim());

        let is_colour = matches!(
            Self::canonical_name(name),
            Some("background_colour" | "text_colour")
        );
        let value = if is_colour && !raw.starts_with('[') {
            serde_json::Value::String(raw.to_string())
        } else {
            serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
        };
        Self::from_name(name, value)
    }

    /// 對應到 [`Self::NAMES`] 中的名稱，同時接受 camelCase 寫法
    fn canonical_name(name: &str) -> Option<&'static str> {
        let canonical = match name {
            "backgroundColour" => "background_colour",
            "textColour" => "text_colour",
            "headerSize" => "header_size",
            "gridColumn" => "grid_column",
            "maxThumbSize" => "max_thumb_size",
            other => other,
        };
        Self::NAMES.iter().find(|n| **n == canonical).copied()
    }
}

fn parse_colour_value(name: &'static str, value: serde_json::Value) -> Result<Rgba> {
    match value {
        serde_json::Value::String(s) => s.parse(),
        other => serde_json::from_value(other).map_err(|e| {
            SheetError::InvalidProperty {
                name,
                reason: e.to_string(),
            }
            .into()
        }),
    }
}

impl SheetStyle {
    /// 套用單一設定項目，不合法的值會被拒絕且不改變目前樣式
    pub fn apply(&mut self, property: SheetProperty) -> Result<()> {
        match property {
            SheetProperty::Font(font) => {
                validate_font_size(font.size)?;
                self.font = font;
            }
            SheetProperty::BackgroundColour(colour) => self.background_colour = colour,
            SheetProperty::TextColour(colour) => self.text_colour = colour,
            SheetProperty::HeaderSize(size) => self.header_size = size,
            SheetProperty::GridColumn(columns) => {
                validate_grid_column(columns)?;
                self.grid_column = columns;
            }
            SheetProperty::MaxThumbSize(width, height) => {
                validate_max_thumb_size(width, height)?;
                self.max_thumb_size = (width, height);
            }
            SheetProperty::Timestamp(enabled) => self.timestamp = enabled,
        }
        Ok(())
    }

    /// 檢查由設定檔讀入的整份樣式
    pub fn validate(&self) -> Result<()> {
        validate_font_size(self.font.size)?;
        validate_grid_column(self.grid_column)?;
        validate_max_thumb_size(self.max_thumb_size.0, self.max_thumb_size.1)?;
        Ok(())
    }
}

fn validate_font_size(size: f32) -> Result<()> {
    if !(size.is_finite() && size > 0.0) {
        return Err(SheetError::InvalidProperty {
            name: "font",
            reason: format!("字型大小必須大於 0: {size}"),
        }
        .into());
    }
    Ok(())
}

fn validate_grid_column(columns: u32) -> Result<()> {
    if !(1..=MAX_GRID_COLUMN).contains(&columns) {
        return Err(SheetError::InvalidProperty {
            name: "grid_column",
            reason: format!("欄數必須介於 1 與 {MAX_GRID_COLUMN} 之間: {columns}"),
        }
        .into());
    }
    Ok(())
}

fn validate_max_thumb_size(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(SheetError::InvalidProperty {
            name: "max_thumb_size",
            reason: format!("縮圖尺寸不可為 0: {width}x{height}"),
        }
        .into());
    }
    Ok(())
}

/// 取樣方式
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sampling {
    /// 固定間隔（秒）
    Interval(f64),
    /// 固定張數，平均分布並包含起點與終點
    Count(usize),
}

/// 輸出圖片格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpg,
}

impl OutputFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpg),
            other => anyhow::bail!("不支援的輸出格式: {other}"),
        }
    }
}

/// 批次產生預覽圖的設定（對應 settings.json）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorSettings {
    pub style: SheetStyle,
    pub interval: Option<f64>,
    pub count: Option<usize>,
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub parallel: bool,
    pub format: OutputFormat,
    pub ffmpeg: PathBuf,
    pub video_extensions: Vec<String>,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            style: SheetStyle::default(),
            interval: None,
            count: None,
            start: None,
            end: None,
            parallel: false,
            format: OutputFormat::default(),
            ffmpeg: PathBuf::from("ffmpeg"),
            video_extensions: DEFAULT_VIDEO_EXTENSIONS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl GeneratorSettings {
    /// 間隔優先，其次為張數，都沒有時使用預設張數
    #[must_use]
    pub fn sampling(&self) -> Sampling {
        match (self.interval, self.count) {
            (Some(interval), _) => Sampling::Interval(interval),
            (None, Some(count)) => Sampling::Count(count),
            (None, None) => Sampling::Count(DEFAULT_THUMBNAIL_COUNT),
        }
    }

    #[must_use]
    pub fn is_video_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                let ext = format!(".{}", ext.to_lowercase());
                self.video_extensions
                    .iter()
                    .any(|known| known.to_lowercase() == ext)
            })
    }
}
