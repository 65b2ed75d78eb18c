//! Error taxonomy for the bundling pipeline.
//!
//! Every failure during graph traversal or assembly propagates synchronously
//! to the top-level caller; there is no local recovery or retry. A failed
//! bundle never writes output.

use thiserror::Error;

/// Errors produced while resolving, rewriting, or writing a bundle.
#[derive(Debug, Error)]
pub enum BundleError {
    /// An imported script name does not resolve to an existing file.
    #[error("cannot resolve script `{name}`{}", .importer.as_deref().map(|i| format!(" (imported by `{i}`)")).unwrap_or_default())]
    MissingDependency {
        name: String,
        /// `None` when the unresolvable script was the requested root.
        importer: Option<String>,
    },

    /// A script imports itself, directly or transitively.
    #[error("import cycle detected: {}", .chain.join(" -> "))]
    CyclicImport { chain: Vec<String> },

    /// The underlying store failed to read a script.
    #[error("failed to read script `{name}`")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// The underlying store failed to write the assembled bundle.
    #[error("failed to write bundle `{name}`")]
    Write {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// A rewrite pattern derived from the configuration failed to compile.
    #[error("invalid rewrite pattern")]
    Pattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, BundleError>;
