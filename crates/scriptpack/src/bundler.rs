//! Recursive single-file assembly.
//!
//! The bundler inlines a script's import graph depth-first, leaves first:
//! each dependency's fully expanded body lands in the accumulator before the
//! body of its importer, and the metadata header of the root script is
//! prepended exactly once at the end of assembly. Dependency internals are
//! renamed per (parent, child) edge, so the same script imported by two
//! different parents is inlined twice under two distinct aliases. Assembly
//! is pure text transformation; writing the result is the caller's job.

use cow_utils::CowUtils;
use log::{debug, trace};
use regex::{NoExpand, Regex};

use crate::{
    config::Config,
    error::{BundleError, Result},
    scanner::ImportScanner,
    store::ScriptStore,
    util::{script_file, strip_whitespace},
};

/// Accumulating result of one bundling run, threaded by value through the
/// recursion and returned from every call.
#[derive(Debug, Default)]
pub struct BundleUnit {
    /// Assembled text, dependency bodies before their importers.
    pub content: String,
    /// Alias assigned to the script of the most recent call; `None` when
    /// that script was the bundle root.
    pub module_name: Option<String>,
}

impl BundleUnit {
    fn new() -> Self {
        Self::default()
    }

    /// Put the root script's header in front of everything accumulated.
    fn prepend(&mut self, header: &str) {
        if header.is_empty() {
            return;
        }
        let mut out = String::with_capacity(header.len() + self.content.len() + 1);
        out.push_str(header);
        if !header.ends_with('\n') && !self.content.is_empty() {
            out.push('\n');
        }
        out.push_str(&self.content);
        self.content = out;
    }

    /// Append one script body, inserting a line break between chunks only
    /// when the previous chunk did not end with one.
    fn append(&mut self, body: &str) {
        if !self.content.is_empty() && !self.content.ends_with('\n') {
            self.content.push('\n');
        }
        self.content.push_str(body);
    }
}

/// Assembles one script and its transitive imports into a single text blob.
pub struct Bundler<'a, S: ScriptStore> {
    store: &'a S,
    config: &'a Config,
    scanner: ImportScanner,
    /// Strips export-registration lines from inlined dependencies.
    export_pattern: Regex,
    /// Matches the conventional namespace-export identifier, word-bounded.
    alias_pattern: Regex,
    /// Run-scoped counter disambiguating generated aliases.
    alias_seq: u32,
    /// Scripts on the current recursion path, for cycle rejection.
    active: Vec<String>,
}

impl<S: ScriptStore> std::fmt::Debug for Bundler<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bundler")
            .field("alias_seq", &self.alias_seq)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl<'a, S: ScriptStore> Bundler<'a, S> {
    pub fn new(store: &'a S, config: &'a Config) -> Result<Self> {
        let scanner = ImportScanner::new(config)?;
        let export_pattern = Regex::new(&format!(
            r"(?m)^[ \t]*{}\b[^\n]*\n?",
            regex::escape(&config.export_object)
        ))?;
        let alias_pattern =
            Regex::new(&format!(r"\b{}\b", regex::escape(&config.exports_alias)))?;
        Ok(Self {
            store,
            config,
            scanner,
            export_pattern,
            alias_pattern,
            alias_seq: 0,
            active: Vec::new(),
        })
    }

    /// Assemble the bundle rooted at `script_name`.
    ///
    /// The returned unit's `module_name` is `None`, the root being nobody's
    /// dependency. No side effects: the store is only read.
    pub fn bundle(&mut self, script_name: &str) -> Result<BundleUnit> {
        self.alias_seq = 0;
        self.active.clear();
        self.bundle_script(script_name, None, BundleUnit::new())
    }

    fn bundle_script(
        &mut self,
        name: &str,
        parent: Option<&str>,
        mut unit: BundleUnit,
    ) -> Result<BundleUnit> {
        if self.active.iter().any(|active| active == name) {
            let mut chain = self.active.clone();
            chain.push(name.to_owned());
            return Err(BundleError::CyclicImport { chain });
        }

        let file = script_file(name, &self.config.extension);
        if !self.store.exists(&file) {
            return Err(BundleError::MissingDependency {
                name: name.to_owned(),
                importer: parent.map(str::to_owned),
            });
        }
        let mut text = self
            .store
            .read_text(&file)
            .map_err(|source| BundleError::Read {
                name: name.to_owned(),
                source,
            })?;

        self.active.push(name.to_owned());
        let imports = self.scanner.scan(&text);
        debug!("bundling `{name}` with {} import(s)", imports.len());

        for import in imports {
            // A duplicate import statement shares its call text with an
            // earlier one, which the earlier substitution already rewired.
            if !text.contains(&import.call) {
                trace!("skipping already substituted import of `{}`", import.script_name);
                continue;
            }
            unit = self.bundle_script(&import.script_name, Some(name), unit)?;
            let alias = unit
                .module_name
                .clone()
                .expect("dependency bundling always assigns a module alias");
            trace!("rewiring `{}` to `{alias}` in `{name}`", import.call);
            text = text.cow_replace(import.call.as_str(), &alias).into_owned();
        }
        self.active.pop();

        let (header, body) = split_header(&text, self.config.header_lines);
        let module_name = parent.map(|p| self.next_alias(p, name));

        let body = match &module_name {
            Some(alias) => self.rewrite_dependency(body, alias),
            None => body.to_owned(),
        };

        if parent.is_none() {
            unit.prepend(header);
        }
        unit.append(&body);
        unit.module_name = module_name;
        Ok(unit)
    }

    /// Alias for one (parent, child) import edge. The run-scoped sequence
    /// number keeps aliases distinct even when the same pair occurs twice.
    fn next_alias(&mut self, parent: &str, child: &str) -> String {
        self.alias_seq += 1;
        format!(
            "{}_{}_{}",
            strip_whitespace(parent),
            strip_whitespace(child),
            self.alias_seq
        )
    }

    /// Rewrite an inlined dependency's body: drop export-registration lines
    /// (meaningless once inlined), then rename the conventional export
    /// object to the assigned alias so the parent's rewired references
    /// resolve to it.
    fn rewrite_dependency(&self, body: &str, alias: &str) -> String {
        let stripped = self.export_pattern.replace_all(body, "");
        self.alias_pattern
            .replace_all(&stripped, NoExpand(alias))
            .into_owned()
    }
}

/// Split off the reserved metadata header. A script shorter than the header
/// size is all header.
fn split_header(text: &str, lines: usize) -> (&str, &str) {
    if lines == 0 {
        return ("", text);
    }
    let mut seen = 0;
    for (i, byte) in text.bytes().enumerate() {
        if byte == b'\n' {
            seen += 1;
            if seen == lines {
                return (&text[..=i], &text[i + 1..]);
            }
        }
    }
    (text, "")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::store::MemoryStore;

    const HEADER: &str = "// host: run-on-wifi\n// icon-color: blue\n// icon-glyph: bolt\n";

    fn store_with(files: &[(&str, &str)]) -> MemoryStore {
        let store = MemoryStore::new();
        for (file, body) in files {
            store.insert(file, &format!("{HEADER}{body}"));
        }
        store
    }

    fn bundle(store: &MemoryStore, root: &str) -> Result<BundleUnit> {
        let config = Config::default();
        Bundler::new(store, &config)?.bundle(root)
    }

    #[test]
    fn leaf_script_bundles_to_its_own_source() {
        let body = "const Exports = {}\nExports.answer = 42\nmodule.exports = Exports\n";
        let store = store_with(&[("Solo.js", body)]);

        let unit = bundle(&store, "Solo").unwrap();
        assert_eq!(unit.content, format!("{HEADER}{body}"));
        assert_eq!(unit.module_name, None);
    }

    #[test]
    fn header_appears_once_and_only_from_the_root() {
        let store = store_with(&[
            ("Main.js", "const Util = importModule(\"Util\")\n"),
            ("Util.js", "const Exports = {}\n"),
        ]);

        let unit = bundle(&store, "Main").unwrap();
        assert!(unit.content.starts_with(HEADER));
        assert_eq!(unit.content.matches("// host: run-on-wifi").count(), 1);
    }

    #[test]
    fn example_scenario_matches_expected_assembly() {
        let store = store_with(&[
            (
                "Main.js",
                "const Util = importModule(\"Util\")\nconsole.log(Util.greet())\n",
            ),
            (
                "Util.js",
                "const Exports = {}\nExports.greet = () => \"hi\"\nmodule.exports = Exports\n",
            ),
        ]);

        let unit = bundle(&store, "Main").unwrap();
        let expected = format!(
            "{HEADER}const Main_Util_1 = {{}}\nMain_Util_1.greet = () => \"hi\"\n\
             const Util = Main_Util_1\nconsole.log(Util.greet())\n"
        );
        assert_eq!(unit.content, expected);
    }

    #[test]
    fn sibling_imports_keep_source_order() {
        let store = store_with(&[
            (
                "Main.js",
                "const A = importModule(\"A\")\nconst B = importModule(\"B\")\nA.run()\n",
            ),
            ("A.js", "const Exports = {}\nExports.marker = \"body of A\"\n"),
            ("B.js", "const Exports = {}\nExports.marker = \"body of B\"\n"),
        ]);

        let unit = bundle(&store, "Main").unwrap();
        let a = unit.content.find("body of A").unwrap();
        let b = unit.content.find("body of B").unwrap();
        let main = unit.content.find("A.run()").unwrap();
        assert!(a < b && b < main, "expected A before B before Main");
    }

    #[test]
    fn transitive_imports_are_inlined_leaves_first() {
        let store = store_with(&[
            ("A.js", "const B = importModule(\"B\")\n// body of A\n"),
            ("B.js", "const C = importModule(\"C\")\n// body of B\n"),
            ("C.js", "// body of C\n"),
        ]);

        let unit = bundle(&store, "A").unwrap();
        let c = unit.content.find("// body of C").unwrap();
        let b = unit.content.find("// body of B").unwrap();
        let a = unit.content.find("// body of A").unwrap();
        assert!(c < b && b < a, "expected C before B before A");

        // Leaf of the chain got the first alias.
        assert!(unit.content.contains("const C = B_C_1"));
        assert!(unit.content.contains("const B = A_B_2"));
    }

    #[test]
    fn import_call_sites_are_rewired_to_the_alias() {
        let store = store_with(&[
            (
                "Main.js",
                "const Util = importModule(\"Util\")\nconst Again = importModule(\"Util\")\n",
            ),
            ("Util.js", "const Exports = {}\n"),
        ]);

        let unit = bundle(&store, "Main").unwrap();
        assert!(!unit.content.contains("importModule"));
        // Identical call text is substituted once, for both statements.
        assert!(unit.content.contains("const Util = Main_Util_1"));
        assert!(unit.content.contains("const Again = Main_Util_1"));
        assert_eq!(unit.content.matches("const Main_Util_1 = {}").count(), 1);
    }

    #[test]
    fn export_registration_is_stripped_only_from_dependencies() {
        let store = store_with(&[
            (
                "Main.js",
                "const Util = importModule(\"Util\")\nmodule.exports = Exports\n",
            ),
            ("Util.js", "const Exports = {}\nmodule.exports = Exports\n"),
        ]);

        let unit = bundle(&store, "Main").unwrap();
        assert_eq!(unit.content.matches("module.exports").count(), 1);
        assert!(unit.content.contains("const Main_Util_1 = {}\n"));
    }

    #[test]
    fn alias_rename_is_word_bounded() {
        let store = store_with(&[
            ("Main.js", "const Util = importModule(\"Util\")\n"),
            (
                "Util.js",
                "const Exports = {}\nconst ExportsBackup = null\nExports.x = 1\n",
            ),
        ]);

        let unit = bundle(&store, "Main").unwrap();
        assert!(unit.content.contains("const ExportsBackup = null"));
        assert!(unit.content.contains("Main_Util_1.x = 1"));
        assert!(!unit.content.contains("\nExports"));
    }

    #[test]
    fn diamond_import_is_inlined_once_per_edge() {
        let store = store_with(&[
            (
                "Main.js",
                "const A = importModule(\"A\")\nconst B = importModule(\"B\")\n",
            ),
            ("A.js", "const C = importModule(\"C\")\n"),
            ("B.js", "const C = importModule(\"C\")\n"),
            ("C.js", "const Exports = {}\n// shared body\n"),
        ]);

        let unit = bundle(&store, "Main").unwrap();
        assert_eq!(unit.content.matches("// shared body").count(), 2);
        assert!(unit.content.contains("const A_C_1 = {}"));
        assert!(unit.content.contains("const B_C_3 = {}"));
    }

    #[test]
    fn aliases_strip_whitespace_from_script_names() {
        let store = store_with(&[
            ("Bundler UI.js", "const Core = importModule(\"Bundler Core\")\n"),
            ("Bundler Core.js", "const Exports = {}\n"),
        ]);

        let unit = bundle(&store, "Bundler UI").unwrap();
        assert!(unit.content.contains("const Core = BundlerUI_BundlerCore_1"));
    }

    #[test]
    fn missing_dependency_aborts_the_whole_bundle() {
        let store = store_with(&[("Main.js", "const X = importModule(\"Ghost\")\n")]);
        let err = bundle(&store, "Main").unwrap_err();
        match err {
            BundleError::MissingDependency { name, importer } => {
                assert_eq!(name, "Ghost");
                assert_eq!(importer.as_deref(), Some("Main"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn direct_self_import_is_rejected() {
        let store = store_with(&[("Loop.js", "const Me = importModule(\"Loop\")\n")]);
        let err = bundle(&store, "Loop").unwrap_err();
        match err {
            BundleError::CyclicImport { chain } => assert_eq!(chain, vec!["Loop", "Loop"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn transitive_cycle_is_rejected_with_full_chain() {
        let store = store_with(&[
            ("A.js", "const B = importModule(\"B\")\n"),
            ("B.js", "const A = importModule(\"A\")\n"),
        ]);
        let err = bundle(&store, "A").unwrap_err();
        match err {
            BundleError::CyclicImport { chain } => assert_eq!(chain, vec!["A", "B", "A"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn short_script_is_all_header() {
        let store = MemoryStore::new();
        store.insert("Tiny.js", "// only line\n");
        let unit = bundle(&store, "Tiny").unwrap();
        assert_eq!(unit.content, "// only line\n");
    }

    #[test]
    fn split_header_takes_exactly_n_lines() {
        let (header, body) = split_header("a\nb\nc\nbody\n", 3);
        assert_eq!(header, "a\nb\nc\n");
        assert_eq!(body, "body\n");

        let (header, body) = split_header("a\nb\n", 3);
        assert_eq!(header, "a\nb\n");
        assert_eq!(body, "");

        let (header, body) = split_header("body\n", 0);
        assert_eq!(header, "");
        assert_eq!(body, "body\n");
    }
}
