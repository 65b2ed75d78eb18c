//! Dependency graph preflight.
//!
//! Before any text is rewritten, the import closure of the requested root is
//! walked once to verify that every referenced script exists and that the
//! graph is acyclic. Failing here guarantees no partial bundle output is
//! ever produced. The graph holds one node per script name; diamond imports
//! are legal and are only duplicated later, per edge, by the bundler.

use std::collections::VecDeque;

use indexmap::IndexMap;
use log::{debug, trace};
use petgraph::{
    algo::tarjan_scc,
    graph::{DiGraph, NodeIndex},
};

use crate::{
    config::Config,
    error::{BundleError, Result},
    scanner::ImportScanner,
    store::ScriptStore,
    util::script_file,
};

/// Import graph of one bundling run, rooted at a single script.
#[derive(Debug)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    nodes: IndexMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Walk the import closure of `root`, failing with
    /// [`BundleError::MissingDependency`] on the first unresolvable name.
    pub fn build<S: ScriptStore>(store: &S, config: &Config, root: &str) -> Result<Self> {
        let scanner = ImportScanner::new(config)?;
        let mut graph = DiGraph::new();
        let mut nodes: IndexMap<String, NodeIndex> = IndexMap::new();

        if !store.exists(&script_file(root, &config.extension)) {
            return Err(BundleError::MissingDependency {
                name: root.to_owned(),
                importer: None,
            });
        }

        let root_index = graph.add_node(root.to_owned());
        nodes.insert(root.to_owned(), root_index);

        let mut worklist = VecDeque::from([root.to_owned()]);
        while let Some(name) = worklist.pop_front() {
            let file = script_file(&name, &config.extension);
            let text = store
                .read_text(&file)
                .map_err(|source| BundleError::Read {
                    name: name.clone(),
                    source,
                })?;
            let from = nodes[&name];

            for import in scanner.scan(&text) {
                trace!("edge {name} -> {}", import.script_name);
                if !store.exists(&script_file(&import.script_name, &config.extension)) {
                    return Err(BundleError::MissingDependency {
                        name: import.script_name,
                        importer: Some(name),
                    });
                }
                let to = match nodes.get(&import.script_name) {
                    Some(index) => *index,
                    None => {
                        let index = graph.add_node(import.script_name.clone());
                        nodes.insert(import.script_name.clone(), index);
                        worklist.push_back(import.script_name.clone());
                        index
                    }
                };
                graph.update_edge(from, to, ());
            }
        }

        debug!("import closure of `{root}` holds {} script(s)", nodes.len());
        Ok(Self { graph, nodes })
    }

    /// Reject any strongly connected component larger than one script, and
    /// any script importing itself.
    pub fn ensure_acyclic(&self) -> Result<()> {
        for scc in tarjan_scc(&self.graph) {
            let cyclic =
                scc.len() > 1 || self.graph.find_edge(scc[0], scc[0]).is_some();
            if cyclic {
                let mut chain: Vec<String> =
                    scc.iter().rev().map(|i| self.graph[*i].clone()).collect();
                chain.push(chain[0].clone());
                return Err(BundleError::CyclicImport { chain });
            }
        }
        Ok(())
    }

    /// Number of distinct scripts in the closure, the root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Script names in discovery order, the root first.
    pub fn scripts(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }
}
