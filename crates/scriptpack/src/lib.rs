//! scriptpack bundles one automation script written for a sandboxed scripting
//! host together with all of its transitive `importModule` dependencies,
//! producing a single self-contained file ready to be dropped back into the
//! host's flat script directory.

pub mod bundler;
pub mod config;
pub mod error;
pub mod graph;
pub mod orchestrator;
pub mod scanner;
pub mod store;
pub mod util;
