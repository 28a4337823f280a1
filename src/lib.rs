// High-bandwidth network mediator — aggregates transport requests from many callers
// into a single platform acquisition per transport set.

pub mod api;
pub mod config;
pub mod engine;
pub mod request;
pub mod requester;

pub use engine::lease::Lease;
pub use engine::mediator::HighBandwidthMediator;
pub use engine::pinned::PinnedNetworks;
pub use request::{HighBandwidthRequest, NetworkType, RequestError, RequestType, TransportSet};
