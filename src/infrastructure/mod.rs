//! Infrastructure layer with adapters for external facilities.

/// Configuration.
pub mod config;
/// Image caching and resolution.
pub mod image;
/// Reachability monitoring and HTTP fetching.
pub mod network;

pub use config::GalleryConfig;
pub use image::{
    CacheIndex, CacheStats, DiskCacheStore, ImageResolvedEvent, ImageResolver, MemoryImageCache,
};
pub use network::{ConnectivityMonitor, HttpImageFetcher, TcpProbe};
