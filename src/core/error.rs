//! Error handling for polybuild.
//!
//! Graph construction is all-or-nothing: any failure surfaces immediately
//! with full context (file path, key, offending value) and no partial graph
//! is returned. The error system has two layers:
//!
//! - [`PolybuildError`] - strongly-typed error kinds for every failure mode,
//!   matched on by tests and by callers that need precise handling
//! - [`ErrorContext`] / [`user_friendly_error`] - a terminal-facing wrapper
//!   that adds actionable suggestions; used by the CLI before exiting
//!
//! Library code returns [`anyhow::Result`] with `PolybuildError` values at
//! the root of the chain, so callers can `downcast_ref` to the typed kind.

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Enumerated fatal error kinds for graph construction.
#[derive(Debug, Error)]
pub enum PolybuildError {
    /// Malformed specification text.
    #[error("failed to parse {file} (line {line}, column {column}): {message}")]
    Parse {
        file: String,
        line: usize,
        column: usize,
        message: String,
    },

    /// An attribute tree does not match the node kind's expectations.
    #[error("schema violation in {file}: {message}")]
    Schema { file: String, message: String },

    /// Attribute keyword with no registered builder and no matching plugin.
    #[error("unknown build rule \"{key}\" in {file}")]
    UnknownKind { key: String, file: String },

    /// Two nodes produced with the same canonical target path.
    #[error("duplicate target: {target}")]
    DuplicateTarget { target: String },

    /// A declared dependency has no matching node in the resolved graph.
    #[error("cannot find {target}, which is a dependency of {dependent}")]
    UnresolvedDependency { target: String, dependent: String },

    /// Plugin expansion did not converge on one attribute block.
    #[error("plugin expansion did not converge in {file} (key \"{key}\")")]
    PluginLoop { file: String, key: String },

    /// The source provider could not make a specification available.
    #[error("source unavailable: {path}")]
    SourceUnavailable { path: String },

    /// Reading a specification failed after it was initialised.
    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The dependency edges contain a cycle.
    #[error("circular dependency detected: {cycle}")]
    DependencyCycle { cycle: String },

    /// A target reference string could not be parsed.
    #[error("invalid target \"{spec}\": {message}")]
    InvalidTarget { spec: String, message: String },
}

/// A user-facing error report: the error plus optional suggestion/details.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error.
    pub error: anyhow::Error,
    /// Actionable step the user can take, shown in green.
    pub suggestion: Option<String>,
    /// Context on why the error occurred, shown in yellow.
    pub details: Option<String>,
}

impl ErrorContext {
    pub fn new(error: anyhow::Error) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Prints the report to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {:#}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {details}", "details".yellow());
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {suggestion}", "suggestion".green());
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

/// Converts any error into a user-friendly report with a per-kind suggestion.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let (suggestion, details) = match error.downcast_ref::<PolybuildError>() {
        Some(PolybuildError::Parse { file, .. }) => (
            Some(format!("Check {file} for JSON syntax errors")),
            Some("Specification files are JSON documents whose top level is an array of objects".to_string()),
        ),
        Some(PolybuildError::Schema { file, .. }) => (
            Some(format!("Fix the offending attribute in {file}")),
            None,
        ),
        Some(PolybuildError::UnknownKind { key, .. }) => (
            Some(format!(
                "Register a builder or a plugin for \"{key}\", or fix the keyword spelling"
            )),
            None,
        ),
        Some(PolybuildError::DuplicateTarget { .. }) => (
            Some("Rename one of the colliding targets".to_string()),
            Some("Every target path must be declared exactly once across the tree".to_string()),
        ),
        Some(PolybuildError::UnresolvedDependency { target, .. }) => (
            Some(format!(
                "Declare {target} in its specification file, or remove the dependency"
            )),
            None,
        ),
        Some(PolybuildError::PluginLoop { key, .. }) => (
            Some(format!(
                "Make the plugin handling \"{key}\" rewrite the key to a different keyword"
            )),
            Some("Plugin expansion must be monotone: a rewrite may not re-trigger itself".to_string()),
        ),
        Some(PolybuildError::SourceUnavailable { path }) => (
            Some(format!("Check that {path} exists under the tree root")),
            None,
        ),
        Some(PolybuildError::DependencyCycle { .. }) => (
            Some("Break the cycle by removing one of the listed edges".to_string()),
            None,
        ),
        _ => (None, None),
    };

    let mut ctx = ErrorContext::new(error);
    if let Some(s) = suggestion {
        ctx = ctx.with_suggestion(s);
    }
    if let Some(d) = details {
        ctx = ctx.with_details(d);
    }
    ctx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let err = PolybuildError::UnresolvedDependency {
            target: "//lib:util".to_string(),
            dependent: "//app:main".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("//lib:util"));
        assert!(msg.contains("//app:main"));
    }

    #[test]
    fn user_friendly_report_adds_suggestion() {
        let err = anyhow::Error::new(PolybuildError::DuplicateTarget {
            target: "//d:x".to_string(),
        });
        let ctx = user_friendly_error(err);
        assert!(ctx.suggestion.is_some());
        assert!(ctx.to_string().contains("//d:x"));
    }

    #[test]
    fn downcast_through_anyhow() {
        let err: anyhow::Error = PolybuildError::DuplicateTarget {
            target: "//d:x".to_string(),
        }
        .into();
        assert!(matches!(
            err.downcast_ref::<PolybuildError>(),
            Some(PolybuildError::DuplicateTarget { .. })
        ));
    }
}
