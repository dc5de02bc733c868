//! AST to bytecode.
//!
//! Routines are emitted on demand, starting from the entry routine and
//! following calls depth-first, so only reachable routines end up in the
//! program. Each routine gets a `RoutineCtx` holding its resolved slots and
//! an owned copy of its body that `defer` may extend during generation.

mod expr;
pub mod scope;
mod stmt;
mod template;

use tracing::debug;

use crate::bytecode::compile_error::CompileError;
use crate::bytecode::executable::Executable;
use crate::bytecode::op::{Op, Target};
use crate::bytecode::program::Program;
use crate::lang::routine::Routine;
use crate::lang::stmt::{Stmt, called_routines};
use crate::lang::tree::SourceTree;

pub use scope::Scope;

/// Routine executed by `call <entry>` at the start of every program.
pub const ENTRY_ROUTINE: &str = "main";

pub struct Compiler<'t> {
    tree: &'t SourceTree,
    program: Program,
}

/// Generation state of the routine currently being emitted.
pub(crate) struct RoutineCtx<'t> {
    pub routine: &'t Routine,
    pub scope: Scope,
    /// Statements still to generate; `defer` appends here.
    pub body: Vec<Stmt>,
}

impl RoutineCtx<'_> {
    pub fn name(&self) -> &str {
        &self.routine.name
    }

    pub fn label(&self, name: &str) -> Target {
        Target::label(&self.routine.name, name)
    }
}

impl<'t> Compiler<'t> {
    pub fn new(tree: &'t SourceTree) -> Self {
        Self {
            tree,
            program: Program::new(),
        }
    }

    /// Emits `entry` and everything reachable from it, then assembles.
    pub fn compile(mut self, entry: &str) -> Result<Executable, CompileError> {
        self.emit_routine(entry)?;
        self.program.assemble(entry)
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Emits one routine followed by its callees. Already emitted routines
    /// are skipped, which also terminates recursion.
    pub fn emit_routine(&mut self, name: &str) -> Result<(), CompileError> {
        if self.program.is_routine_defined(name) {
            return Ok(());
        }
        let tree = self.tree;
        let routine = tree.routine(name).ok_or_else(|| CompileError::UnknownRoutine {
            name: name.to_string(),
        })?;

        self.program.define_routine(name)?;
        let scope = Scope::resolve(routine, tree);
        let locals = scope.local_count();
        debug!(
            routine = name,
            address = self.program.address(),
            params = routine.params.len(),
            locals,
            "emitting routine"
        );

        self.program.annotate(format!("rout {}", name));
        self.program.annotate(format!("vars: {}", scope.locals().join(" ")));
        self.program.emit(Op::Alloc(locals));

        let mut ctx = RoutineCtx {
            routine,
            scope,
            body: routine.body.clone(),
        };
        let mut index = 0;
        while index < ctx.body.len() {
            let stmt = ctx.body[index].clone();
            self.stmt(&mut ctx, &stmt)?;
            index += 1;
        }

        self.program.emit(Op::Free(locals));
        self.program.emit(Op::Return);

        for callee in called_routines(&ctx.body) {
            self.emit_routine(callee)?;
        }
        Ok(())
    }
}

/// Compiles a loaded tree starting at `main`.
pub fn compile(tree: &SourceTree) -> Result<Executable, CompileError> {
    Compiler::new(tree).compile(ENTRY_ROUTINE)
}
