//! Normalizes VRM avatar metadata (legacy `VRM` 0.x and revised `VRMC_vrm`
//! 1.0) into engine-agnostic bone, expression, spring-bone and license tables.

pub mod convert;
pub mod error;
pub mod logging;
pub mod scene;
pub mod settings;

pub use error::MetaError;
pub use logging::{LogLevel, init_logging};
