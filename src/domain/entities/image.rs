//! Domain types for gallery images.

use bytes::Bytes;

/// Dimension assumed when rehydrating references from cached keys alone.
pub const DEFAULT_DIMENSION: u32 = 400;

/// Stable, caller-assigned identifier for a gallery image.
///
/// Used as the cache key for both the memory and disk tiers; survives across
/// application runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageKey(String);

impl ImageKey {
    /// Creates a new `ImageKey` from any string-like input.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ImageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ImageKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ImageKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A logical reference to a remote image: key plus requested dimensions.
///
/// The key is the identity; the source URL is derived from
/// `(key, width, height)` for fetching only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    key: ImageKey,
    width: u32,
    height: u32,
}

impl ImageRef {
    /// Creates a reference with explicit dimensions.
    #[must_use]
    pub fn new(key: impl Into<ImageKey>, width: u32, height: u32) -> Self {
        Self {
            key: key.into(),
            width,
            height,
        }
    }

    /// Creates a reference with the default square dimensions.
    ///
    /// Used when rehydrating from cached keys, where the original dimensions
    /// are not recorded.
    #[must_use]
    pub fn with_default_dimensions(key: impl Into<ImageKey>) -> Self {
        Self::new(key, DEFAULT_DIMENSION, DEFAULT_DIMENSION)
    }

    /// Returns the cache key.
    #[must_use]
    pub const fn key(&self) -> &ImageKey {
        &self.key
    }

    /// Returns the requested width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Returns the requested height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }
}

/// Which tier a resolved image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOrigin {
    /// Served from the in-memory LRU cache.
    Memory,
    /// Served from the disk cache.
    Disk,
    /// Downloaded from the network.
    Network,
}

impl std::fmt::Display for ImageOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Disk => write!(f, "disk"),
            Self::Network => write!(f, "network"),
        }
    }
}

/// Image bytes successfully resolved for a reference.
#[derive(Debug, Clone)]
pub struct ResolvedImage {
    /// The cache key the bytes belong to.
    pub key: ImageKey,
    /// Encoded image bytes, ready to decode and render.
    pub bytes: Bytes,
    /// The tier that served the bytes.
    pub origin: ImageOrigin,
}

/// Terminal outcome of resolving a single image reference.
///
/// Placeholder outcomes are distinct from bytes: the caller renders an
/// offline or error indicator instead of image content.
#[derive(Debug, Clone)]
pub enum ResolveOutcome {
    /// Bytes were obtained from one of the tiers.
    Resolved(ResolvedImage),
    /// Disconnected and not cached; nothing was fetched or stored.
    OfflinePlaceholder,
    /// Transport or decode failure; nothing was stored.
    ErrorPlaceholder {
        /// Human-readable failure description.
        reason: String,
    },
}

impl ResolveOutcome {
    /// Returns true if bytes were obtained.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Returns true if the caller should render a placeholder.
    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        !self.is_resolved()
    }

    /// Returns the resolved bytes, if any.
    #[must_use]
    pub fn bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Resolved(img) => Some(&img.bytes),
            _ => None,
        }
    }

    /// Returns the tier that served the bytes, if any.
    #[must_use]
    pub fn origin(&self) -> Option<ImageOrigin> {
        match self {
            Self::Resolved(img) => Some(img.origin),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_round_trip() {
        let key = ImageKey::new("42");
        assert_eq!(key.as_str(), "42");
        assert_eq!(key.to_string(), "42");
        assert_eq!(ImageKey::from("42"), key);
    }

    #[test]
    fn test_default_dimensions() {
        let img = ImageRef::with_default_dimensions("7");
        assert_eq!(img.width(), DEFAULT_DIMENSION);
        assert_eq!(img.height(), DEFAULT_DIMENSION);
        assert_eq!(img.key().as_str(), "7");
    }

    #[test]
    fn test_outcome_predicates() {
        let resolved = ResolveOutcome::Resolved(ResolvedImage {
            key: ImageKey::new("1"),
            bytes: Bytes::from_static(b"jpeg"),
            origin: ImageOrigin::Disk,
        });
        assert!(resolved.is_resolved());
        assert_eq!(resolved.origin(), Some(ImageOrigin::Disk));
        assert_eq!(resolved.bytes().map(|b| b.len()), Some(4));

        let offline = ResolveOutcome::OfflinePlaceholder;
        assert!(offline.is_placeholder());
        assert!(offline.bytes().is_none());

        let failed = ResolveOutcome::ErrorPlaceholder {
            reason: "HTTP 503".to_string(),
        };
        assert!(failed.is_placeholder());
        assert!(failed.origin().is_none());
    }
}
