use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::frontend::lexer::Lexer;
use crate::frontend::parser::Parser;
use crate::lang::stmt::Stmt;
use crate::lang::tree::SourceTree;

/// Extension given to import paths written without one.
pub const SOURCE_EXTENSION: &str = "sap";

/// Loads a source file and everything it `use`s into one `SourceTree`.
pub struct Loader {
    tree: SourceTree,

    /// Files already included (prevents duplicates and import cycles)
    included: HashSet<PathBuf>,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    pub fn new() -> Self {
        Self {
            tree: SourceTree::new(),
            included: HashSet::new(),
        }
    }

    pub fn load_file(mut self, path: &Path) -> Result<SourceTree> {
        self.load_recursive(path)?;
        Ok(self.tree)
    }

    /// Loads in-memory source. Imports resolve against `base_dir`, or the
    /// working directory when none is given.
    pub fn load_source(mut self, source: &str, base_dir: Option<&Path>) -> Result<SourceTree> {
        let items = parse(source, None)?;
        let base_dir = base_dir.unwrap_or_else(|| Path::new("."));
        self.inject(items, base_dir)?;
        Ok(self.tree)
    }

    fn load_recursive(&mut self, path: &Path) -> Result<()> {
        let mut path_buf = path.to_path_buf();
        if path_buf.extension().is_none() {
            path_buf.set_extension(SOURCE_EXTENSION);
        }

        let canonical = path_buf.canonicalize().map_err(|e| Error::Io {
            path: path_buf.clone(),
            source: e,
        })?;

        if !self.included.insert(canonical.clone()) {
            debug!(path = %canonical.display(), "already included, skipping");
            return Ok(());
        }

        let source = std::fs::read_to_string(&canonical).map_err(|e| Error::Io {
            path: canonical.clone(),
            source: e,
        })?;
        debug!(path = %canonical.display(), bytes = source.len(), "loading source");

        let items = parse(&source, Some(&canonical))?;
        let base_dir = canonical.parent().unwrap_or_else(|| Path::new("."));
        self.inject(items, base_dir)
    }

    /// Loads imports first (depth-first), then this file's definitions.
    fn inject(&mut self, items: Vec<Stmt>, base_dir: &Path) -> Result<()> {
        for item in &items {
            if let Stmt::Use(import) = item {
                self.load_recursive(&base_dir.join(import))?;
            }
        }
        self.tree.inject(items)?;
        Ok(())
    }
}

fn parse(source: &str, path: Option<&Path>) -> Result<Vec<Stmt>> {
    let mut lexer = Lexer::new(source);
    if let Some(p) = path {
        lexer = lexer.with_path(p);
    }
    let tokens = lexer.tokenize()?;

    let mut parser = Parser::new(tokens);
    if let Some(p) = path {
        parser = parser.with_path(p);
    }
    Ok(parser.parse()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, source: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, source).unwrap();
        path
    }

    #[test]
    fn test_load_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let main = write(dir.path(), "main.sap", "rout main { debug 1; }");

        let tree = Loader::new().load_file(&main).unwrap();
        assert!(tree.routine("main").is_some());
    }

    #[test]
    fn test_use_resolves_relative_to_importing_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "lib/math.sap", "use 'point'; rout double(in x; out r;) { put r = x + x; }");
        write(dir.path(), "lib/point.sap", "seq point { x y }");
        let main = write(
            dir.path(),
            "main.sap",
            "use 'lib/math.sap';\nrout main { sub double(x ~ 2, r); }",
        );

        let tree = Loader::new().load_file(&main).unwrap();
        assert!(tree.routine("main").is_some());
        assert!(tree.routine("double").is_some());
        assert_eq!(tree.constant("point::y"), Some(1));
    }

    #[test]
    fn test_import_cycle_is_loaded_once() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.sap", "use 'b.sap'; rout a { }");
        write(dir.path(), "b.sap", "use 'a.sap'; rout b { }");
        let main = write(dir.path(), "main.sap", "use 'a.sap'; use 'b.sap'; rout main { }");

        let tree = Loader::new().load_file(&main).unwrap();
        let mut names: Vec<_> = tree.routine_names().collect();
        names.sort();
        assert_eq!(names, vec!["a", "b", "main"]);
    }

    #[test]
    fn test_duplicate_routine_across_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "lib.sap", "rout main { }");
        let main = write(dir.path(), "main.sap", "use 'lib.sap'; rout main { }");

        let err = Loader::new().load_file(&main).unwrap_err();
        assert!(err.to_string().contains("defined twice"), "{}", err);
    }

    #[test]
    fn test_missing_import() {
        let dir = tempfile::tempdir().unwrap();
        let main = write(dir.path(), "main.sap", "use 'nowhere.sap'; rout main { }");

        let err = Loader::new().load_file(&main).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().contains("nowhere.sap"));
    }

    #[test]
    fn test_parse_error_carries_path() {
        let dir = tempfile::tempdir().unwrap();
        let main = write(dir.path(), "main.sap", "rout main {\n  put ;\n}");

        let err = Loader::new().load_file(&main).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("main.sap:2:7"), "{}", msg);
    }

    #[test]
    fn test_load_source_without_imports() {
        let tree = Loader::new()
            .load_source("seq pair { lo hi } rout main { }", None)
            .unwrap();
        assert_eq!(tree.constant("pair"), Some(2));
    }
}
