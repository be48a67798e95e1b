//! 功能元件模組

pub mod contact_sheet;

pub use contact_sheet::{ContactSheetGenerator, Sheet, Video};
