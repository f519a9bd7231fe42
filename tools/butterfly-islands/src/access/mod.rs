//! Access model and per-edge access resolution

pub mod defaults;
pub mod model;

pub use defaults::{default_access, is_accessible, AccessState, AccessTable};
pub use model::{AccessMap, AccessModel, ModeId, TransportMode, POSITIVE_ACCESS};
