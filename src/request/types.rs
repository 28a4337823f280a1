use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of network the platform reports as granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkType {
    Cell,
    Wifi,
    Bluetooth,
    Unknown,
}

impl NetworkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkType::Cell => "cell",
            NetworkType::Wifi => "wifi",
            NetworkType::Bluetooth => "bluetooth",
            NetworkType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of transports a request accepts. Requests with the same set share
/// one aggregation bucket and one platform acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportSet {
    WifiOnly,
    CellOnly,
    Any,
}

impl TransportSet {
    pub const ALL: [TransportSet; 3] = [TransportSet::WifiOnly, TransportSet::CellOnly, TransportSet::Any];

    /// Map a (wifi, cell) flag pair to its set. `None` when neither is allowed.
    pub fn from_flags(wifi: bool, cell: bool) -> Option<Self> {
        match (wifi, cell) {
            (true, false) => Some(TransportSet::WifiOnly),
            (false, true) => Some(TransportSet::CellOnly),
            (true, true) => Some(TransportSet::Any),
            (false, false) => None,
        }
    }

    pub fn wifi(&self) -> bool {
        matches!(self, TransportSet::WifiOnly | TransportSet::Any)
    }

    pub fn cell(&self) -> bool {
        matches!(self, TransportSet::CellOnly | TransportSet::Any)
    }

    /// Whether a granted network of this type satisfies the set.
    pub fn allows(&self, network: NetworkType) -> bool {
        match network {
            NetworkType::Wifi => self.wifi(),
            NetworkType::Cell => self.cell(),
            NetworkType::Bluetooth | NetworkType::Unknown => false,
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            TransportSet::WifiOnly => 0,
            TransportSet::CellOnly => 1,
            TransportSet::Any => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportSet::WifiOnly => "wifi_only",
            TransportSet::CellOnly => "cell_only",
            TransportSet::Any => "any",
        }
    }
}

impl fmt::Display for TransportSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of the work a request is made for. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    LogsUpload,
    MediaDownload,
    MediaStream,
    ImageRequest,
    ApiRequest,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::LogsUpload => "logs_upload",
            RequestType::MediaDownload => "media_download",
            RequestType::MediaStream => "media_stream",
            RequestType::ImageRequest => "image_request",
            RequestType::ApiRequest => "api_request",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_set_from_flags() {
        assert_eq!(TransportSet::from_flags(true, false), Some(TransportSet::WifiOnly));
        assert_eq!(TransportSet::from_flags(false, true), Some(TransportSet::CellOnly));
        assert_eq!(TransportSet::from_flags(true, true), Some(TransportSet::Any));
        assert_eq!(TransportSet::from_flags(false, false), None);
    }

    #[test]
    fn test_transport_set_allows() {
        assert!(TransportSet::WifiOnly.allows(NetworkType::Wifi));
        assert!(!TransportSet::WifiOnly.allows(NetworkType::Cell));
        assert!(TransportSet::Any.allows(NetworkType::Cell));
        assert!(!TransportSet::Any.allows(NetworkType::Bluetooth));
    }

    #[test]
    fn test_transport_set_indices_are_distinct() {
        let mut seen = [false; 3];
        for set in TransportSet::ALL {
            assert!(!seen[set.index()]);
            seen[set.index()] = true;
        }
    }
}
