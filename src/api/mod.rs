// Embedding surface — logging bootstrap and an id-keyed lease registry for bridge callers.

pub mod lease_registry;
pub mod logging;
