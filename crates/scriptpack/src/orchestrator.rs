//! End-to-end bundling flow.
//!
//! Ties the preflight graph walk, the recursive assembly, and the single
//! final write together. Nothing is written unless the whole bundle
//! assembled cleanly, and the written output is tagged so it is never
//! offered as a bundle root itself.

use log::{debug, info};

use crate::{
    bundler::Bundler,
    config::Config,
    error::{BundleError, Result},
    graph::DependencyGraph,
    store::ScriptStore,
    util::script_file,
};

#[derive(Debug)]
pub struct Orchestrator<'a, S: ScriptStore> {
    store: &'a S,
    config: &'a Config,
}

impl<'a, S: ScriptStore> Orchestrator<'a, S> {
    pub fn new(store: &'a S, config: &'a Config) -> Self {
        Self { store, config }
    }

    /// Script names eligible as bundle roots: files with the configured
    /// extension that are not tagged as bundle output.
    pub fn candidates(&self) -> std::io::Result<Vec<String>> {
        let suffix = format!(".{}", self.config.extension);
        let mut names = Vec::new();
        for file in self.store.list_files()? {
            let Some(name) = file.strip_suffix(&suffix) else {
                continue;
            };
            if self.store.is_tagged(&file, &self.config.tag_label) {
                debug!("skipping tagged bundle output `{file}`");
                continue;
            }
            names.push(name.to_owned());
        }
        Ok(names)
    }

    /// Bundle `script_name` into `<script_name><bundle_suffix>` next to its
    /// sources.
    pub fn bundle(&self, script_name: &str) -> Result<String> {
        self.bundle_as(script_name, None)
    }

    /// Bundle `script_name`, writing the result under `output` when given.
    /// Returns the written file name.
    pub fn bundle_as(&self, script_name: &str, output: Option<&str>) -> Result<String> {
        let graph = DependencyGraph::build(self.store, self.config, script_name)?;
        graph.ensure_acyclic()?;
        info!(
            "bundling `{script_name}` ({} script(s) in its import closure)",
            graph.len()
        );

        let unit = Bundler::new(self.store, self.config)?.bundle(script_name)?;

        let out_name = match output {
            Some(name) => name.to_owned(),
            None => format!("{script_name}{}", self.config.bundle_suffix),
        };
        let out_file = script_file(&out_name, &self.config.extension);
        self.store
            .write_text(&out_file, &unit.content)
            .map_err(|source| BundleError::Write {
                name: out_file.clone(),
                source,
            })?;
        self.store
            .tag(&out_file, &self.config.tag_label)
            .map_err(|source| BundleError::Write {
                name: out_file.clone(),
                source,
            })?;

        info!("wrote `{out_file}` ({} bytes)", unit.content.len());
        Ok(out_file)
    }
}
