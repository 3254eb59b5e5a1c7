//! Network connectivity domain types.

/// Kind of network interface the current connection runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterfaceKind {
    /// Wireless LAN.
    Wifi,
    /// Mobile data.
    Cellular,
    /// Wired ethernet.
    Ethernet,
    /// Loopback interface.
    Loopback,
    /// Some other interface the platform can name but we do not classify.
    Other,
    /// Interface kind not yet observed.
    #[default]
    Unknown,
}

impl std::fmt::Display for InterfaceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Wifi => write!(f, "wifi"),
            Self::Cellular => write!(f, "cellular"),
            Self::Ethernet => write!(f, "ethernet"),
            Self::Loopback => write!(f, "loopback"),
            Self::Other => write!(f, "other"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Snapshot of network reachability.
///
/// The default is optimistically connected: callers behave as online until
/// the first real observation arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityState {
    /// Whether the network is reachable.
    pub is_connected: bool,
    /// The interface kind carrying the connection, when known.
    pub interface: InterfaceKind,
}

impl Default for ConnectivityState {
    fn default() -> Self {
        Self {
            is_connected: true,
            interface: InterfaceKind::Unknown,
        }
    }
}

impl ConnectivityState {
    /// Connected over the given interface.
    #[must_use]
    pub const fn online(interface: InterfaceKind) -> Self {
        Self {
            is_connected: true,
            interface,
        }
    }

    /// Disconnected.
    #[must_use]
    pub const fn offline() -> Self {
        Self {
            is_connected: false,
            interface: InterfaceKind::Unknown,
        }
    }
}

impl std::fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_connected {
            write!(f, "connected ({})", self.interface)
        } else {
            write!(f, "disconnected")
        }
    }
}
