//! Error types.
//!
//! Every error here is a configuration error: it is raised while a memoized
//! function or selector is being built, never on a later call.

/// Errors raised while building memoized functions and selectors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// More than one cache strategy was selected at once.
    #[error(
        "{selected} can't be combined to create a memoizer, choose the one that best suits the application"
    )]
    ConflictingCacheOptions {
        /// The strategies that were selected, comma separated.
        selected: String,
    },

    /// A configuration document could not be parsed.
    #[error("invalid memoizer configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
