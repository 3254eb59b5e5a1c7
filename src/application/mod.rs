//! Application layer: services and the composition root.

pub mod gallery;
pub mod services;

pub use gallery::{Gallery, GalleryEvents};
pub use services::{GalleryEvent, GalleryService, SequentialPageSource};
