//! Domain entities.

mod connectivity;
mod image;
mod page;

pub use connectivity::{ConnectivityState, InterfaceKind};
pub use image::{
    DEFAULT_DIMENSION, ImageKey, ImageOrigin, ImageRef, ResolveOutcome, ResolvedImage,
};
pub use page::{LoadPhase, PageState};
