use std::collections::HashMap;

use crate::bytecode::compile_error::CompileError;
use crate::lang::routine::{Routine, SeqType};
use crate::lang::stmt::Stmt;

/// The whole program after parsing and import expansion: every routine plus
/// the global constant table rendered from sequence types.
#[derive(Debug, Clone, Default)]
pub struct SourceTree {
    routines: HashMap<String, Routine>,
    constants: HashMap<String, i64>,
}

impl SourceTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tree from top-level statements (`use` already expanded).
    pub fn from_stmts(stmts: Vec<Stmt>) -> Result<Self, CompileError> {
        let mut tree = SourceTree::new();
        tree.inject(stmts)?;
        Ok(tree)
    }

    /// Adds top-level definitions. `use` items are skipped; the loader
    /// expands them before injecting.
    pub fn inject(&mut self, stmts: Vec<Stmt>) -> Result<(), CompileError> {
        for stmt in stmts {
            match stmt {
                Stmt::Routine(routine) => self.add_routine(routine)?,
                Stmt::Seq(seq) => self.add_seq(seq)?,
                Stmt::Use(_) => {}
                other => {
                    return Err(CompileError::invalid_position(
                        other.kind(),
                        None,
                        "only definitions may appear at the top level",
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn add_routine(&mut self, routine: Routine) -> Result<(), CompileError> {
        if self.routines.contains_key(&routine.name) {
            return Err(CompileError::DuplicateRoutine {
                name: routine.name,
            });
        }
        self.routines.insert(routine.name.clone(), routine);
        Ok(())
    }

    pub fn add_seq(&mut self, seq: SeqType) -> Result<(), CompileError> {
        for (name, value) in seq.constants() {
            if self.constants.contains_key(&name) {
                return Err(CompileError::DuplicateConstant { name });
            }
            self.constants.insert(name, value);
        }
        Ok(())
    }

    pub fn routine(&self, name: &str) -> Option<&Routine> {
        self.routines.get(name)
    }

    pub fn routine_names(&self) -> impl Iterator<Item = &str> {
        self.routines.keys().map(String::as_str)
    }

    pub fn constant(&self, name: &str) -> Option<i64> {
        self.constants.get(name).copied()
    }
}
