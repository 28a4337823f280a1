// Platform capability abstraction — the mediator drives network acquisition through these traits.

pub mod manual;
pub mod traits;
