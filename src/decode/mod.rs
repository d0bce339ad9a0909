//! Payload decoders: pure functions from one raw source response to
//! canonical points. No network access and no state lives here, which is
//! what keeps the adapters testable offline.

pub mod script;
pub mod wide;
pub mod wrapped;
