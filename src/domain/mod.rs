//! Domain layer types and invariants.

pub mod channels;
pub mod entities;
pub mod frame;
pub mod frame_action;
pub mod profile;
pub mod tx;
