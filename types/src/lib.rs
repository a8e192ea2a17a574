//! Core domain types for settle.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! The polling loop lives in `settle-core`; config file parsing lives in `settle-config`.

mod condition;
mod error;
mod wait_config;

pub use condition::ConditionResult;
pub use error::{BoxError, WaitError, WaitErrorKind};
pub use wait_config::{
    DEFAULT_ATTEMPTS_BEFORE_SLOWING, DEFAULT_INITIAL_INTERVAL, DEFAULT_TIMEOUT, WaitConfig,
};
