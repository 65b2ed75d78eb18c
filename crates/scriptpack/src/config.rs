//! Configuration for the host's textual script conventions.
//!
//! All conventions the bundler recognizes (import call shape, header size,
//! export object name) are host-specific and therefore configurable. Values
//! are layered: an explicit `--config` path wins over `scriptpack.toml` in
//! the base directory, which wins over the per-user config directory, which
//! wins over the built-in defaults.

use std::path::Path;

use anyhow::{Context, Result};
use etcetera::{BaseStrategy, choose_base_strategy};
use log::debug;
use serde::{Deserialize, Serialize};

/// Name of the config file looked up in the base directory and in the
/// per-user config directory.
pub const CONFIG_FILE_NAME: &str = "scriptpack.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Script file extension, without the leading dot.
    pub extension: String,

    /// Number of leading lines of every script reserved for host directives.
    /// The header is preserved only from the bundle root.
    pub header_lines: usize,

    /// Suffix appended to the root script's name to form the bundle name.
    pub bundle_suffix: String,

    /// Name of the host's import function, the call shape being
    /// `const <ident> = <import_function>("<scriptName>")`.
    pub import_function: String,

    /// Identifier every script uses for its internal namespace-export
    /// object. Renamed per-dependency to the assigned module alias.
    pub exports_alias: String,

    /// Prefix of export-registration statements. Lines starting with it are
    /// stripped from inlined dependencies.
    pub export_object: String,

    /// Tag label applied to bundle outputs so they are never offered as
    /// bundle roots themselves.
    pub tag_label: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extension: "js".to_owned(),
            header_lines: 3,
            bundle_suffix: "-bundle".to_owned(),
            import_function: "importModule".to_owned(),
            exports_alias: "Exports".to_owned(),
            export_object: "module.exports".to_owned(),
            tag_label: "bundled".to_owned(),
        }
    }
}

impl Config {
    /// Load a config from an explicit TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = toml::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Resolve the effective config for a bundling run rooted at `base_dir`.
    pub fn discover(base_dir: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            debug!("using explicit config {}", path.display());
            return Self::load(path);
        }

        let local = base_dir.join(CONFIG_FILE_NAME);
        if local.is_file() {
            debug!("using project config {}", local.display());
            return Self::load(&local);
        }

        if let Ok(strategy) = choose_base_strategy() {
            let user = strategy
                .config_dir()
                .join("scriptpack")
                .join(CONFIG_FILE_NAME);
            if user.is_file() {
                debug!("using user config {}", user.display());
                return Self::load(&user);
            }
        }

        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_match_host_conventions() {
        let config = Config::default();
        assert_eq!(config.extension, "js");
        assert_eq!(config.header_lines, 3);
        assert_eq!(config.import_function, "importModule");
        assert_eq!(config.exports_alias, "Exports");
        assert_eq!(config.export_object, "module.exports");
    }

    #[test]
    fn partial_toml_overrides_keep_remaining_defaults() {
        let config: Config = toml::from_str(
            r#"
            extension = "scriptable"
            header_lines = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.extension, "scriptable");
        assert_eq!(config.header_lines, 4);
        assert_eq!(config.import_function, "importModule");
        assert_eq!(config.bundle_suffix, "-bundle");
    }

    #[test]
    fn project_config_wins_over_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "bundle_suffix = \" Bundle\"\n",
        )
        .unwrap();

        let config = Config::discover(dir.path(), None).unwrap();
        assert_eq!(config.bundle_suffix, " Bundle");
        assert_eq!(config.extension, "js");
    }
}
