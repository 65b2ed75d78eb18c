//! Import statement discovery.
//!
//! The host's import convention is a declaration line whose right-hand side
//! calls the import function with the target script's name:
//!
//! ```text
//! const Util = importModule("Util")
//! ```
//!
//! Discovery is literal text matching over the raw source, never parsing of
//! the host language. Everything outside the matched shapes is preserved
//! byte for byte by later rewriting stages.

use regex::Regex;

use crate::{config::Config, error::Result};

/// One discovered import, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStatement {
    /// Identifier the importer binds the module to.
    pub local_name: String,
    /// Literal text of the import call, the substring replaced by the
    /// dependency's assigned alias during rewiring.
    pub call: String,
    /// Name of the referenced script, without extension.
    pub script_name: String,
}

/// Compiled matcher for the configured import convention.
#[derive(Debug)]
pub struct ImportScanner {
    pattern: Regex,
}

impl ImportScanner {
    pub fn new(config: &Config) -> Result<Self> {
        let import_fn = regex::escape(&config.import_function);
        let pattern = Regex::new(&format!(
            r#"(?m)^[ \t]*(?:const|let|var)\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*=\s*({import_fn}\(\s*["']([^"']+)["']\s*\))"#
        ))?;
        Ok(Self { pattern })
    }

    /// All imports in `source`, top to bottom. Discovery order determines
    /// assembly order in the final bundle.
    pub fn scan(&self, source: &str) -> Vec<ImportStatement> {
        self.pattern
            .captures_iter(source)
            .map(|caps| ImportStatement {
                local_name: caps[1].to_owned(),
                call: caps[2].to_owned(),
                script_name: caps[3].to_owned(),
            })
            .collect()
    }
}
