pub mod component;
pub mod config;
pub mod error;
pub mod init;
pub mod signal;
pub mod tools;

pub use component::contact_sheet::{Sheet, Thumbnail, Video};
pub use error::SheetError;
