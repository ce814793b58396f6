//! The module contains the errors the engine can return.
//!
//! Every variant is a local, recoverable rejection: the session that returned
//! it is left exactly as it was before the call.
//!
//! - [`InvalidWays`] returned when a split asks for fewer than two or more
//!   than [`MAX_WAYS`](crate::MAX_WAYS) parts.
//! - [`NoItemSelected`] returned when a move runs without an active item.
//! - [`ItemPaid`] returned when a paid item would be reassigned.
//! - [`LastCheck`] returned when deleting the only remaining check.
//! - [`IntegrityBlocked`] returned when a commit is attempted while the
//!   integrity checker reports issues.
//!
//!  [`InvalidWays`]: EngineError::InvalidWays
//!  [`NoItemSelected`]: EngineError::NoItemSelected
//!  [`ItemPaid`]: EngineError::ItemPaid
//!  [`LastCheck`]: EngineError::LastCheck
//!  [`IntegrityBlocked`]: EngineError::IntegrityBlocked
use thiserror::Error;

use crate::{CheckId, IntegrityIssue, ItemId, SplitMode};

/// Engine custom errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("a split needs between 2 and 100 ways, got {0}")]
    InvalidWays(u32),
    #[error("no item selected")]
    NoItemSelected,
    #[error("item \"{0}\" not found")]
    ItemNotFound(ItemId),
    #[error("check {0} not found")]
    CheckNotFound(CheckId),
    #[error("item \"{0}\" is already paid and cannot be reassigned")]
    ItemPaid(ItemId),
    #[error("item \"{0}\" is split into claims; merge it first")]
    ItemFragmented(ItemId),
    #[error("item \"{0}\" is not split")]
    ItemNotFragmented(ItemId),
    #[error("the last remaining check cannot be deleted")]
    LastCheck,
    #[error("operation not available in {0} mode")]
    ModeUnavailable(SplitMode),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid order: {0}")]
    InvalidOrder(String),
    #[error("commit blocked by {} integrity issue(s)", .0.len())]
    IntegrityBlocked(Vec<IntegrityIssue>),
}
