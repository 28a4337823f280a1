use std::sync::Once;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Environment variable checked before `RUST_LOG`, so an embedding app can
/// tune this crate's logging without touching its own filter.
pub const LOG_ENV: &str = "HB_NETWORK_LOG";

const DEFAULT_FILTER: &str = "warn,hb_network_engine=info";

static INIT_TRACING: Once = Once::new();

/// Install the process-wide fmt subscriber unless one is already set.
/// Later calls are no-ops. Called by [`LeaseRegistry::new`](super::lease_registry::LeaseRegistry::new).
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        if tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .is_ok()
        {
            info!("high bandwidth mediator logging initialized");
        }
    });
}
