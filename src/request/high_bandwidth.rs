use std::fmt;

use thiserror::Error;

use super::types::{RequestType, TransportSet};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("a high bandwidth request must allow at least one of wifi or cell")]
    NoTransport,
}

/// Immutable description of which transports a caller will accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HighBandwidthRequest {
    transports: TransportSet,
    request_type: Option<RequestType>,
}

impl HighBandwidthRequest {
    /// Any transport, Wi-Fi or cellular.
    pub const ANY: Self = Self::of(TransportSet::Any);
    pub const WIFI_ONLY: Self = Self::of(TransportSet::WifiOnly);
    pub const CELL_ONLY: Self = Self::of(TransportSet::CellOnly);

    pub fn new(wifi: bool, cell: bool) -> Result<Self, RequestError> {
        TransportSet::from_flags(wifi, cell)
            .map(Self::of)
            .ok_or(RequestError::NoTransport)
    }

    pub const fn of(transports: TransportSet) -> Self {
        Self {
            transports,
            request_type: None,
        }
    }

    pub fn with_request_type(self, request_type: RequestType) -> Self {
        Self {
            request_type: Some(request_type),
            ..self
        }
    }

    pub fn wifi(&self) -> bool {
        self.transports.wifi()
    }

    pub fn cell(&self) -> bool {
        self.transports.cell()
    }

    pub fn transports(&self) -> TransportSet {
        self.transports
    }

    pub fn request_type(&self) -> Option<RequestType> {
        self.request_type
    }
}

impl fmt::Display for HighBandwidthRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.request_type {
            Some(request_type) => write!(f, "{}({})", self.transports, request_type),
            None => write!(f, "{}", self.transports),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_transport_set() {
        assert_eq!(HighBandwidthRequest::new(false, false), Err(RequestError::NoTransport));
    }

    #[test]
    fn test_constants_match_flags() {
        assert_eq!(HighBandwidthRequest::new(true, true).unwrap(), HighBandwidthRequest::ANY);
        assert_eq!(HighBandwidthRequest::new(true, false).unwrap(), HighBandwidthRequest::WIFI_ONLY);
        assert_eq!(HighBandwidthRequest::new(false, true).unwrap(), HighBandwidthRequest::CELL_ONLY);
        assert!(HighBandwidthRequest::CELL_ONLY.cell());
        assert!(!HighBandwidthRequest::CELL_ONLY.wifi());
    }

    #[test]
    fn test_request_type_does_not_change_bucket() {
        let tagged = HighBandwidthRequest::WIFI_ONLY.with_request_type(RequestType::MediaDownload);
        assert_ne!(tagged, HighBandwidthRequest::WIFI_ONLY);
        assert_eq!(tagged.transports(), HighBandwidthRequest::WIFI_ONLY.transports());
        assert_eq!(tagged.to_string(), "wifi_only(media_download)");
    }
}
