pub mod load;
pub mod types;

pub use types::{
    DEFAULT_THUMBNAIL_COUNT, DEFAULT_VIDEO_EXTENSIONS, FontSpec, GeneratorSettings,
    MAX_GRID_COLUMN, OutputFormat, Rgba, Sampling, SheetProperty, SheetStyle,
};
