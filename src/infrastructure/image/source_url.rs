//! Source URL derivation and blob file naming.

use sha2::{Digest, Sha256};

use crate::domain::entities::{ImageKey, ImageRef};

/// Base URL of the backing image service.
pub const SOURCE_BASE_URL: &str = "https://picsum.photos";

/// Derives the fetch URL for an image reference.
///
/// Computed deterministically from `(key, width, height)`; the URL is a
/// transport detail, never the identity — the key is.
#[must_use]
pub fn source_url(image: &ImageRef) -> String {
    format!(
        "{SOURCE_BASE_URL}/{}/{}?random={}",
        image.width(),
        image.height(),
        image.key()
    )
}

/// Derives the blob file stem for a cache key.
///
/// Keys are caller-assigned and may contain path-hostile characters, so blob
/// files are named by a truncated SHA-256 of the key instead.
#[must_use]
pub fn blob_stem(key: &ImageKey) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_str().as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..16])
}
