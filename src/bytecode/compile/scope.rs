use std::collections::HashMap;

use crate::lang::expr::Expr;
use crate::lang::routine::{ParamInterface, Routine};
use crate::lang::stmt::Stmt;
use crate::lang::tree::SourceTree;

/// Slot table of one routine: parameters at negative offsets, locals from 0
/// upward in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    slots: HashMap<String, i64>,
    locals: Vec<String>,
}

impl Scope {
    pub fn new(params: &ParamInterface) -> Self {
        let slots = params
            .bindings()
            .map(|(name, offset)| (name.to_string(), offset))
            .collect();
        Scope {
            slots,
            locals: Vec::new(),
        }
    }

    /// Returns the slot of `name`, giving it the next local slot on first use.
    pub fn allocate(&mut self, name: &str) -> i64 {
        if let Some(&slot) = self.slots.get(name) {
            return slot;
        }
        let slot = self.locals.len() as i64;
        self.slots.insert(name.to_string(), slot);
        self.locals.push(name.to_string());
        slot
    }

    pub fn slot(&self, name: &str) -> Option<i64> {
        self.slots.get(name).copied()
    }

    pub fn local_count(&self) -> i64 {
        self.locals.len() as i64
    }

    /// Local names in slot order.
    pub fn locals(&self) -> &[String] {
        &self.locals
    }

    /// Walks the routine body and allocates a slot for every variable it
    /// names. Loop hidden slots are allocated where the loop appears;
    /// constants are skipped.
    pub fn resolve(routine: &Routine, tree: &SourceTree) -> Scope {
        let mut resolver = Resolver {
            scope: Scope::new(&routine.params),
            tree,
        };
        resolver.block(&routine.body);
        resolver.scope
    }
}

struct Resolver<'t> {
    scope: Scope,
    tree: &'t SourceTree,
}

impl Resolver<'_> {
    fn name(&mut self, name: &str) {
        if self.tree.constant(name).is_none() {
            self.scope.allocate(name);
        }
    }

    fn expr(&mut self, expr: &Expr) {
        expr.for_each_var(&mut |name| self.name(name));
    }

    fn block(&mut self, body: &[Stmt]) {
        for stmt in body {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Put(e) | Stmt::Void(e) | Stmt::Debug(e) | Stmt::Push(e) | Stmt::Pull(e) => {
                self.expr(e)
            }
            Stmt::Jump { cond, .. } => {
                if let Some(cond) = cond {
                    self.expr(cond);
                }
            }
            Stmt::Call(call) => {
                for binding in &call.bindings {
                    self.expr(&binding.expr);
                }
            }
            Stmt::Trans { size, target } | Stmt::Pers { size, target } => {
                self.expr(size);
                self.expr(target);
            }
            Stmt::Count(l) => {
                self.name(&l.var);
                self.expr(&l.start);
                self.expr(&l.end);
                self.block(&l.body);
            }
            Stmt::Enum(l) | Stmt::Iter(l) => {
                self.name(&l.elem);
                self.name(&l.index_slot());
                self.expr(&l.block);
                self.scope.allocate(&l.base_slot());
                self.scope.allocate(&l.len_slot());
                self.block(&l.body);
            }
            Stmt::Defer(inner) => self.stmt(inner),
            Stmt::Label(_) | Stmt::Routine(_) | Stmt::Seq(_) | Stmt::Use(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::loader::Loader;

    fn resolve(source: &str, routine: &str) -> Scope {
        let tree = Loader::new().load_source(source, None).unwrap();
        Scope::resolve(tree.routine(routine).unwrap(), &tree)
    }

    #[test]
    fn test_params_are_preseeded() {
        let scope = resolve("rout f(in a; out r;) { put r = a + t; }", "f");
        assert_eq!(scope.slot("a"), Some(-4));
        assert_eq!(scope.slot("r"), Some(-3));
        assert_eq!(scope.slot("t"), Some(0));
        assert_eq!(scope.local_count(), 1);
    }

    #[test]
    fn test_locals_in_order_of_first_appearance() {
        let scope = resolve("rout main { put x = 1; put y = x + z; put x = 2; }", "main");
        assert_eq!(scope.locals(), &["x", "y", "z"]);
    }

    #[test]
    fn test_allocate_is_idempotent() {
        let mut scope = Scope::default();
        assert_eq!(scope.allocate("a"), 0);
        assert_eq!(scope.allocate("b"), 1);
        assert_eq!(scope.allocate("a"), 0);
        assert_eq!(scope.local_count(), 2);
    }

    #[test]
    fn test_constants_are_not_allocated() {
        let scope = resolve(
            "seq point { x y } rout main { pers point ~ p; put v = p.point::y; }",
            "main",
        );
        assert_eq!(scope.locals(), &["p", "v"]);
        assert_eq!(scope.slot("point"), None);
    }

    #[test]
    fn test_loop_slots_share_the_flat_space() {
        let scope = resolve(
            "rout main { put b = 0; iter e ~ b { count i ~ 1..e { put s = s + i; } } }",
            "main",
        );
        assert_eq!(
            scope.locals(),
            &["b", "e", "#loop0.index", "#loop0.base", "#loop0.len", "i", "s"]
        );
    }

    #[test]
    fn test_enum_index_is_a_named_local() {
        let scope = resolve("rout main { enum e @ k ~ blk { } }", "main");
        assert_eq!(scope.locals(), &["e", "k", "blk", "#loop0.base", "#loop0.len"]);
    }

    #[test]
    fn test_deferred_and_call_bindings_are_visited() {
        let scope = resolve(
            "rout f(in a;) { } rout main { defer void q; sub f(a ~ w); }",
            "main",
        );
        assert_eq!(scope.locals(), &["q", "w"]);
    }

    #[test]
    fn test_template_names_are_not_scanned() {
        let scope = resolve("rout main { debug 'v = {v}'; }", "main");
        assert_eq!(scope.local_count(), 0);
    }
}
