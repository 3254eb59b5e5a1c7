//! Pagination state for the gallery feed.

use super::image::ImageRef;

/// Loading phase of the gallery feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    /// No load in flight.
    #[default]
    Idle,
    /// The initial page (and offline bootstrap) is being loaded.
    LoadingInitial,
    /// A subsequent page is being appended.
    LoadingMore,
}

impl LoadPhase {
    /// Returns true while any load is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::LoadingInitial | Self::LoadingMore)
    }
}

impl std::fmt::Display for LoadPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::LoadingInitial => write!(f, "loading initial"),
            Self::LoadingMore => write!(f, "loading more"),
        }
    }
}

/// Feed state owned exclusively by the gallery service.
///
/// `images` only grows within a session; it is reset to empty solely by an
/// explicit reload.
#[derive(Debug)]
pub struct PageState {
    current_page: u32,
    phase: LoadPhase,
    has_loaded_initial: bool,
    images: Vec<ImageRef>,
}

impl Default for PageState {
    fn default() -> Self {
        Self::new()
    }
}

impl PageState {
    /// Creates an empty feed positioned at page 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current_page: 1,
            phase: LoadPhase::Idle,
            has_loaded_initial: false,
            images: Vec::new(),
        }
    }

    /// Resets to an empty page-1 feed and enters the initial-load phase.
    pub fn begin_initial_load(&mut self) {
        self.current_page = 1;
        self.has_loaded_initial = false;
        self.images.clear();
        self.phase = LoadPhase::LoadingInitial;
    }

    /// Attempts to enter the load-more phase.
    ///
    /// Returns the page number to fetch, or `None` if a load is already in
    /// flight.
    pub fn begin_load_more(&mut self) -> Option<u32> {
        if self.phase.is_loading() {
            return None;
        }
        self.phase = LoadPhase::LoadingMore;
        Some(self.current_page + 1)
    }

    /// Replaces the feed contents with a freshly loaded first page.
    pub fn complete_initial_load(&mut self, images: Vec<ImageRef>) {
        self.images = images;
        self.current_page = 1;
        self.has_loaded_initial = true;
        self.phase = LoadPhase::Idle;
    }

    /// Appends a fetched page and advances the page counter.
    ///
    /// The counter only advances after the append, so pages always land in
    /// increasing order.
    pub fn complete_load_more(&mut self, page: u32, images: Vec<ImageRef>) {
        self.images.extend(images);
        self.current_page = page;
        self.phase = LoadPhase::Idle;
    }

    /// Returns to idle without touching the feed, e.g. after a failed fetch.
    pub fn abort_load(&mut self) {
        self.phase = LoadPhase::Idle;
    }

    /// Replaces the feed with references rehydrated from cached keys.
    ///
    /// Used for the offline bootstrap; does not count as an initial load.
    pub fn show_cached(&mut self, images: Vec<ImageRef>) {
        self.images = images;
    }

    /// Returns the current page number.
    #[must_use]
    pub const fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Returns the current loading phase.
    #[must_use]
    pub const fn phase(&self) -> LoadPhase {
        self.phase
    }

    /// Returns true once a network page has been loaded this session.
    #[must_use]
    pub const fn has_loaded_initial(&self) -> bool {
        self.has_loaded_initial
    }

    /// Returns the reference at `index`, if present.
    #[must_use]
    pub fn image(&self, index: usize) -> Option<&ImageRef> {
        self.images.get(index)
    }

    /// Returns the number of references in the feed.
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Returns true if the feed holds no references.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
