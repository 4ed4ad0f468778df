//! Speculative data-limit probes.
//!
//! Classifying the active network is a platform concern and stays outside
//! this crate. What lives here is the mapping from a classified
//! [`NetworkProfile`] to a byte quota, and the [`DataLimitProbe`] seam the
//! scheduler set calls whenever the speculative budget is reset.

use serde::Serialize;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;

/// Supplies the byte quota for speculative traffic.
pub trait DataLimitProbe: Send + Sync {
    fn data_limit(&self) -> u64;
}

/// A probe that always returns the same quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDataLimit(pub u64);

impl DataLimitProbe for FixedDataLimit {
    fn data_limit(&self) -> u64 {
        self.0
    }
}

/// Coarse network classes, as reported by a platform classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NetworkProfile {
    /// Classification failed or no active connection was reported.
    Unknown,
    Offline,
    Roaming,
    /// CDMA 1x, EDGE and other 2G radios.
    Slow2G,
    /// WCDMA, HSPA, EHRPD.
    ThreeG,
    Lte,
    /// Wi-Fi, Ethernet, WiMAX or Bluetooth tethering, as reported by a
    /// platform that can tell these links apart.
    Unmetered,
    /// Reachable without a cellular radio on a platform that only reports
    /// "cellular or not". Gets the desktop quota, not the unmetered one.
    NonCellular,
    /// Desktop host without a metered radio.
    Desktop,
    /// No platform probe is available.
    Portable,
}

impl NetworkProfile {
    pub const ALL: [NetworkProfile; 10] = [
        Self::Unknown,
        Self::Offline,
        Self::Roaming,
        Self::Slow2G,
        Self::ThreeG,
        Self::Lte,
        Self::Unmetered,
        Self::NonCellular,
        Self::Desktop,
        Self::Portable,
    ];

    pub const fn data_limit(self) -> u64 {
        match self {
            Self::Unknown | Self::Offline | Self::Roaming | Self::Slow2G => 512 * KIB,
            Self::ThreeG => 2 * MIB,
            Self::Lte | Self::Unmetered | Self::Portable => 5 * MIB,
            Self::NonCellular | Self::Desktop => 10 * MIB,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Offline => "offline",
            Self::Roaming => "roaming",
            Self::Slow2G => "2g",
            Self::ThreeG => "3g",
            Self::Lte => "lte",
            Self::Unmetered => "unmetered",
            Self::NonCellular => "non_cellular",
            Self::Desktop => "desktop",
            Self::Portable => "portable",
        }
    }
}

/// Calls a classifier on every reset and maps its answer through [`NetworkProfile::data_limit`].
pub struct ProfileProbe<F> {
    classify: F,
}

impl<F> ProfileProbe<F>
where
    F: Fn() -> NetworkProfile + Send + Sync,
{
    pub fn new(classify: F) -> Self {
        Self { classify }
    }
}

impl<F> DataLimitProbe for ProfileProbe<F>
where
    F: Fn() -> NetworkProfile + Send + Sync,
{
    fn data_limit(&self) -> u64 {
        let profile = (self.classify)();
        let limit = profile.data_limit();
        tracing::debug!(profile = profile.as_str(), limit, "speculative data limit probed");
        limit
    }
}
