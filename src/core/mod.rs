//! Core types for polybuild: target and resource identifiers plus the
//! error system shared by every stage of graph construction.
//!
//! - [`TargetInfo`] - canonical reference to one build target (`//dir:name`)
//! - [`Resource`] - a file artifact within an output tree, with tags
//! - [`PolybuildError`] - enumerated fatal error kinds; graph construction
//!   either completes or surfaces one of these with full context
//! - [`ErrorContext`] / [`user_friendly_error`] - terminal-facing report
//!   with per-kind suggestions, used by the CLI only

pub mod error;
pub mod resource;
pub mod target;

pub use error::{user_friendly_error, ErrorContext, PolybuildError};
pub use resource::Resource;
pub use target::TargetInfo;
