use super::text_renderer::SheetFont;
use super::video::Video;
use crate::config::{SheetProperty, SheetStyle};
use crate::error::SheetError;
use crate::tools::{format_header_duration, get_time_string};
use anyhow::Result;
use image::{ColorType, DynamicImage, RgbaImage, imageops};
use log::{debug, warn};

/// 標頭文字的左上角位置與行距
const HEADER_MARGIN: u32 = 10;
const HEADER_LINE_HEIGHT: u32 = 20;

/// 網格中的單一格
#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    pub x: u32,
    pub y: u32,
    /// 關閉時間標籤時為 `None`
    pub label: Option<String>,
}

/// 預覽圖
///
/// 每次產生都會重新取樣並取代先前的網格、標頭與結果圖。
#[derive(Debug)]
pub struct Sheet {
    video: Video,
    style: SheetStyle,
    font: Option<SheetFont>,
    interval: Option<f64>,
    grid: Option<DynamicImage>,
    header: Option<DynamicImage>,
    sheet: Option<DynamicImage>,
}

impl Sheet {
    /// 使用預設樣式（沒有字型，不繪製文字）
    #[must_use]
    pub fn new(video: Video) -> Self {
        Self {
            video,
            style: SheetStyle::default(),
            font: None,
            interval: None,
            grid: None,
            header: None,
            sheet: None,
        }
    }

    pub fn with_style(video: Video, style: SheetStyle) -> Result<Self> {
        style.validate()?;
        let font = SheetFont::load(&style.font)?;
        Ok(Self {
            style,
            font,
            ..Self::new(video)
        })
    }

    #[must_use]
    pub const fn video(&self) -> &Video {
        &self.video
    }

    pub fn video_mut(&mut self) -> &mut Video {
        &mut self.video
    }

    #[must_use]
    pub fn into_video(self) -> Video {
        self.video
    }

    #[must_use]
    pub const fn style(&self) -> &SheetStyle {
        &self.style
    }

    #[must_use]
    pub const fn font(&self) -> Option<&SheetFont> {
        self.font.as_ref()
    }

    /// 最近一次產生時使用的取樣間隔
    #[must_use]
    pub const fn interval(&self) -> Option<f64> {
        self.interval
    }

    #[must_use]
    pub const fn grid(&self) -> Option<&DynamicImage> {
        self.grid.as_ref()
    }

    #[must_use]
    pub const fn header(&self) -> Option<&DynamicImage> {
        self.header.as_ref()
    }

    #[must_use]
    pub const fn sheet(&self) -> Option<&DynamicImage> {
        self.sheet.as_ref()
    }

    pub fn set_property(&mut self, property: SheetProperty) -> Result<()> {
        if let SheetProperty::Font(spec) = &property {
            let font = SheetFont::load(spec)?;
            self.style.apply(property)?;
            self.font = font;
            return Ok(());
        }
        self.style.apply(property)
    }

    /// 以名稱設定樣式，未知名稱回傳 [`SheetError::UnsupportedProperty`]
    pub fn set_property_by_name(&mut self, name: &str, value: serde_json::Value) -> Result<()> {
        self.set_property(SheetProperty::from_name(name, value)?)
    }

    #[must_use]
    pub fn grid_rows(&self) -> u32 {
        let count = u32::try_from(self.video.thumbcount()).unwrap_or(u32::MAX);
        count.div_ceil(self.style.grid_column)
    }

    /// 依列優先順序計算每張縮圖的位置與標籤
    ///
    /// 標籤使用該格縮圖實際的取樣時間，中間有時間點解碼失敗時仍與畫面一致。
    #[must_use]
    pub fn grid_cells(&self) -> Vec<GridCell> {
        let columns = self.style.grid_column;
        let (width, height) = self.video.thumbsize();

        self.video
            .thumbnails()
            .iter()
            .zip(0_u32..)
            .map(|(thumb, index)| GridCell {
                x: (index % columns) * width,
                y: (index / columns) * height,
                label: self
                    .style
                    .timestamp
                    .then(|| get_time_string(thumb.timestamp)),
            })
            .collect()
    }

    /// 四行標頭文字：檔名、檔案大小、解析度、長度
    #[must_use]
    pub fn header_lines(&self) -> [String; 4] {
        let name = self
            .video
            .filename()
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let (width, height) = self.video.resolution();

        [
            format!("File Name: {name}"),
            format!("File Size: {:10.6} MB", self.video.filesize()),
            format!("Resolution: {width}x{height}"),
            format!(
                "Duration: {}",
                format_header_duration(self.video.duration())
            ),
        ]
    }

    /// 將縮圖貼到網格，未填滿的格子保持空白
    pub fn make_grid(&mut self) -> Result<&DynamicImage> {
        let columns = self.style.grid_column;
        let rows = self.grid_rows();
        let (width, height) = self.video.thumbsize();

        let (Some(grid_width), Some(grid_height)) =
            (width.checked_mul(columns), height.checked_mul(rows))
        else {
            return Err(SheetError::GridTooLarge {
                columns,
                rows,
                width,
                height,
            }
            .into());
        };
        let mut canvas = RgbaImage::new(grid_width, grid_height);
        let cells = self.grid_cells();

        for (cell, thumb) in cells.iter().zip(self.video.thumbnails()) {
            imageops::replace(
                &mut canvas,
                &thumb.image.to_rgba8(),
                i64::from(cell.x),
                i64::from(cell.y),
            );
        }

        if cells.iter().any(|cell| cell.label.is_some()) {
            match &self.font {
                Some(font) => {
                    for cell in &cells {
                        if let Some(label) = &cell.label {
                            font.draw(&mut canvas, self.style.text_colour, (cell.x, cell.y), label);
                        }
                    }
                }
                None => warn!("未設定字型，略過時間標籤"),
            }
        }

        debug!(
            "網格 {}x{}: {} 張縮圖, {columns} 欄 x {rows} 列",
            canvas.width(),
            canvas.height(),
            cells.len()
        );

        let grid = into_colour_mode(canvas, self.video.mode());
        Ok(&*self.grid.insert(grid))
    }

    /// 建立標頭，寬度與網格相同
    pub fn make_header(&mut self) -> Result<&DynamicImage> {
        let width = self.grid.as_ref().ok_or(SheetError::GridMissing)?.width();
        let mut canvas =
            RgbaImage::from_pixel(width, self.style.header_size, self.style.background_colour.to_pixel());

        match &self.font {
            Some(font) => {
                for (line, y) in self
                    .header_lines()
                    .iter()
                    .zip((HEADER_MARGIN..).step_by(HEADER_LINE_HEIGHT as usize))
                {
                    font.draw(&mut canvas, self.style.text_colour, (HEADER_MARGIN, y), line);
                }
            }
            None => warn!("未設定字型，略過標頭文字"),
        }

        let header = into_colour_mode(canvas, self.video.mode());
        Ok(&*self.header.insert(header))
    }

    /// 以固定間隔取樣並產生預覽圖（標頭在上，網格在下）
    pub fn make_sheet_by_interval(&mut self, interval: f64) -> Result<&DynamicImage> {
        self.interval = Some(interval);
        self.video.make_thumbnails(interval)?;
        self.video.shrink_thumbs(self.style.max_thumb_size);
        self.make_grid()?;
        self.make_header()?;

        let sheet = {
            let (Some(grid), Some(header)) = (&self.grid, &self.header) else {
                return Err(SheetError::GridMissing.into());
            };

            let mut canvas = RgbaImage::new(grid.width(), header.height() + grid.height());
            imageops::replace(&mut canvas, &header.to_rgba8(), 0, 0);
            imageops::replace(&mut canvas, &grid.to_rgba8(), 0, i64::from(header.height()));
            into_colour_mode(canvas, self.video.mode())
        };

        debug!(
            "預覽圖 {}x{}: {}",
            sheet.width(),
            sheet.height(),
            self.video.filename().display()
        );
        Ok(&*self.sheet.insert(sheet))
    }

    /// 產生 `count` 張平均分布且包含起點與終點的預覽圖
    pub fn make_sheet_by_number(&mut self, count: usize) -> Result<&DynamicImage> {
        if count < 2 {
            return Err(SheetError::InvalidCount(count).into());
        }

        let interval = (self.video.end() - self.video.start()) / (count - 1) as f64;
        self.make_sheet_by_interval(interval)
    }
}

/// 轉回影片的色彩模式；RGB 影片的透明背景會變成黑色
fn into_colour_mode(canvas: RgbaImage, mode: ColorType) -> DynamicImage {
    let image = DynamicImage::ImageRgba8(canvas);
    match mode {
        ColorType::L8 | ColorType::L16 => DynamicImage::ImageLuma8(image.to_luma8()),
        ColorType::La8 | ColorType::La16 => DynamicImage::ImageLumaA8(image.to_luma_alpha8()),
        ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => {
            DynamicImage::ImageRgb8(image.to_rgb8())
        }
        _ => image,
    }
}
