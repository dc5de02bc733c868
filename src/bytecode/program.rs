use std::collections::HashMap;

use tracing::debug;

use crate::bytecode::compile_error::CompileError;
use crate::bytecode::executable::Executable;
use crate::bytecode::op::{Address, Op, Target};

/// Instructions placed in front of the program by `assemble`:
/// `call <entry>` and `halt`.
pub const LINK_HEADER: Address = 2;

#[derive(Debug, Clone, PartialEq)]
enum Item {
    Op(Op<Target>),
    /// Generator annotation; occupies no address.
    Note(String),
}

/// Bytecode under construction. Control transfers stay symbolic until
/// `assemble` resolves them against the label and routine tables.
#[derive(Debug, Default)]
pub struct Program {
    items: Vec<Item>,
    labels: HashMap<(String, String), Address>,
    routines: HashMap<String, Address>,
    op_count: usize,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, op: Op<Target>) {
        self.items.push(Item::Op(op));
        self.op_count += 1;
    }

    pub fn annotate(&mut self, note: impl Into<String>) {
        self.items.push(Item::Note(note.into()));
    }

    /// Address the next emitted instruction will have after assembly.
    pub fn address(&self) -> Address {
        self.op_count + LINK_HEADER
    }

    pub fn define_label(&mut self, routine: &str, name: &str) -> Result<(), CompileError> {
        let key = (routine.to_string(), name.to_string());
        if self.labels.contains_key(&key) {
            return Err(CompileError::DuplicateLabel {
                routine: routine.to_string(),
                name: name.to_string(),
            });
        }
        self.labels.insert(key, self.address());
        Ok(())
    }

    pub fn define_routine(&mut self, name: &str) -> Result<(), CompileError> {
        if self.routines.contains_key(name) {
            return Err(CompileError::DuplicateRoutine {
                name: name.to_string(),
            });
        }
        self.routines.insert(name.to_string(), self.address());
        Ok(())
    }

    pub fn is_routine_defined(&self, name: &str) -> bool {
        self.routines.contains_key(name)
    }

    /// Number of instructions emitted so far (annotations excluded).
    pub fn len(&self) -> usize {
        self.op_count
    }

    pub fn is_empty(&self) -> bool {
        self.op_count == 0
    }

    fn resolve(&self, target: Target) -> Result<Address, CompileError> {
        match target {
            Target::Label { routine, name } => self
                .labels
                .get(&(routine.clone(), name.clone()))
                .copied()
                .ok_or(CompileError::UndefinedLabel { routine, name }),
            Target::Routine(name) => self
                .routines
                .get(&name)
                .copied()
                .ok_or(CompileError::UndefinedRoutine { name }),
        }
    }

    /// Resolves every symbolic target and prefixes `call <entry>; halt`.
    pub fn assemble(&self, entry: &str) -> Result<Executable, CompileError> {
        let entry_addr = self.resolve(Target::routine(entry))?;
        let mut ops: Vec<Op> = Vec::with_capacity(self.op_count + LINK_HEADER);
        let mut notes = Vec::new();
        ops.push(Op::Call(entry_addr));
        ops.push(Op::Halt);

        for item in &self.items {
            match item {
                Item::Op(op) => ops.push(op.clone().map_target(|t| self.resolve(t))?),
                Item::Note(note) => notes.push((ops.len(), note.clone())),
            }
        }

        debug!(
            entry,
            entry_addr,
            ops = ops.len(),
            routines = self.routines.len(),
            labels = self.labels.len(),
            "assembled program"
        );
        Ok(Executable { ops, notes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addresses_include_link_header() {
        let mut p = Program::new();
        assert_eq!(p.address(), 2);
        p.annotate("rout main");
        assert_eq!(p.address(), 2);
        assert!(p.is_empty());
        p.emit(Op::Const(1));
        assert_eq!(p.address(), 3);
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn test_assemble_resolves_targets() {
        let mut p = Program::new();
        p.define_routine("main").unwrap();
        p.define_label("main", "top").unwrap();
        p.emit(Op::Call(Target::routine("f")));
        p.emit(Op::Jump(Target::label("main", "top")));
        p.emit(Op::Return);
        p.define_routine("f").unwrap();
        p.annotate("rout f");
        p.emit(Op::Return);

        let exe = p.assemble("main").unwrap();
        assert_eq!(
            exe.ops,
            vec![
                Op::Call(2),
                Op::Halt,
                Op::Call(5),
                Op::Jump(2),
                Op::Return,
                Op::Return,
            ]
        );
        assert_eq!(exe.notes, vec![(5, "rout f".to_string())]);
    }

    #[test]
    fn test_labels_are_scoped_per_routine() {
        let mut p = Program::new();
        p.define_label("a", "top").unwrap();
        p.define_label("b", "top").unwrap();
        let err = p.define_label("a", "top").unwrap_err();
        assert!(matches!(err, CompileError::DuplicateLabel { .. }));
    }

    #[test]
    fn test_duplicate_routine() {
        let mut p = Program::new();
        p.define_routine("main").unwrap();
        assert!(p.is_routine_defined("main"));
        assert!(matches!(
            p.define_routine("main"),
            Err(CompileError::DuplicateRoutine { .. })
        ));
    }

    #[test]
    fn test_undefined_label() {
        let mut p = Program::new();
        p.define_routine("main").unwrap();
        p.emit(Op::Jump(Target::label("main", "nowhere")));
        let err = p.assemble("main").unwrap_err();
        assert!(matches!(err, CompileError::UndefinedLabel { name, .. } if name == "nowhere"));
    }

    #[test]
    fn test_undefined_routine() {
        let mut p = Program::new();
        p.define_routine("main").unwrap();
        p.emit(Op::Call(Target::routine("ghost")));
        let err = p.assemble("main").unwrap_err();
        assert!(matches!(err, CompileError::UndefinedRoutine { name } if name == "ghost"));
    }

    #[test]
    fn test_missing_entry() {
        let p = Program::new();
        assert!(p.assemble("main").is_err());
    }
}
