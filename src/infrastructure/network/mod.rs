//! Network infrastructure: reachability monitoring and HTTP fetching.

pub mod connectivity;
pub mod http_fetch;

pub use connectivity::{ConnectivityMonitor, TcpProbe};
pub use http_fetch::HttpImageFetcher;
