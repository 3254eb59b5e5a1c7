//! Port definition for sampling network reachability.

use crate::domain::entities::ConnectivityState;

/// Port for one reachability observation.
///
/// The connectivity monitor polls this on its background task; adapters
/// decide what "reachable" means for the platform.
#[async_trait::async_trait]
pub trait ConnectivityProbePort: Send + Sync {
    /// Samples the current reachability.
    async fn probe(&self) -> ConnectivityState;
}
