// Engine orchestration — bucket aggregation, lease lifecycle and grant publication.

pub mod bucket;
pub mod lease;
pub mod mediator;
pub mod pinned;
pub mod stats;
