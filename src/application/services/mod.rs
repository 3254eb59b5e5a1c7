//! Application services.

pub mod gallery_service;
pub mod page_source;

pub use gallery_service::{GalleryEvent, GalleryService};
pub use page_source::SequentialPageSource;
