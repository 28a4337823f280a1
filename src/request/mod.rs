// Request value objects — what a caller is willing to accept from the platform.

pub mod high_bandwidth;
pub mod types;

pub use high_bandwidth::{HighBandwidthRequest, RequestError};
pub use types::{NetworkType, RequestType, TransportSet};
