use std::sync::Arc;

use crate::request::{HighBandwidthRequest, NetworkType};

/// Receives grant and loss notifications for one platform acquisition.
///
/// Implementations may be called from any thread, including synchronously from
/// inside [`NetworkRequester::request_network`].
pub trait NetworkEventListener: Send + Sync {
    fn on_available(&self, network: NetworkType);
    fn on_lost(&self);
}

/// A live platform acquisition. Releasing it cancels the request.
pub trait NetworkReference: Send {
    fn release(self: Box<Self>);
}

/// Starts platform-level acquisition of a high-bandwidth network.
///
/// Must not block: registration is expected to be fire-and-forget, with the
/// outcome reported later through the listener. A request that can never be
/// satisfied simply never reports `on_available`.
pub trait NetworkRequester: Send + Sync {
    fn request_network(
        &self,
        request: &HighBandwidthRequest,
        listener: Arc<dyn NetworkEventListener>,
    ) -> Box<dyn NetworkReference>;
}
