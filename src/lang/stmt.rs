use crate::lang::expr::Expr;
use crate::lang::routine::{Routine, SeqType};

/// Identifies a loop statement within its source file; used to name the
/// loop's hidden slots and labels.
pub type LoopId = usize;

/// One `name ~ expr` binding at a call site. The shorthand `name` alone is
/// parsed as `name ~ name`.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub param: String,
    pub expr: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub routine: String,
    pub bindings: Vec<Binding>,
}

impl Call {
    pub fn binding(&self, param: &str) -> Option<&Expr> {
        self.bindings
            .iter()
            .find(|b| b.param == param)
            .map(|b| &b.expr)
    }
}

/// `count var ~ start..end { body }` with an inclusive upper bound.
#[derive(Debug, Clone, PartialEq)]
pub struct CountLoop {
    pub id: LoopId,
    pub var: String,
    pub start: Expr,
    pub end: Expr,
    pub body: Vec<Stmt>,
}

/// `enum elem @ index ~ block { body }` and `iter elem ~ block { body }`.
/// `index` is `None` for `iter`, which owns a hidden index slot instead.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockLoop {
    pub id: LoopId,
    pub elem: String,
    pub index: Option<String>,
    pub block: Expr,
    pub body: Vec<Stmt>,
}

impl BlockLoop {
    pub fn base_slot(&self) -> String {
        format!("#loop{}.base", self.id)
    }

    pub fn len_slot(&self) -> String {
        format!("#loop{}.len", self.id)
    }

    pub fn index_slot(&self) -> String {
        match &self.index {
            Some(name) => name.clone(),
            None => format!("#loop{}.index", self.id),
        }
    }
}

/// Labels generated for loop desugaring. `#` cannot start a user label.
pub fn loop_labels(id: LoopId) -> (String, String) {
    (format!("#loop{}.top", id), format!("#loop{}.exit", id))
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `put expr;`
    Put(Expr),
    /// `lab name;`
    Label(String),
    /// `jump name;` or `jump name ~ cond;`
    Jump { label: String, cond: Option<Expr> },
    /// `sub name(bindings);`
    Call(Call),
    /// `rout name(params) { body }`, top level only.
    Routine(Routine),
    /// `seq name { fields }`, top level only.
    Seq(SeqType),
    /// `use 'path';`, top level only.
    Use(String),
    /// `trans size ~ target;`
    Trans { size: Expr, target: Expr },
    /// `pers size ~ target;`
    Pers { size: Expr, target: Expr },
    /// `void block;`
    Void(Expr),
    Count(CountLoop),
    Enum(BlockLoop),
    Iter(BlockLoop),
    /// `defer stmt`
    Defer(Box<Stmt>),
    /// `debug expr;`
    Debug(Expr),
    /// `push expr;`
    Push(Expr),
    /// `pull target;`
    Pull(Expr),
}

impl Stmt {
    pub fn kind(&self) -> &'static str {
        match self {
            Stmt::Put(_) => "put",
            Stmt::Label(_) => "lab",
            Stmt::Jump { .. } => "jump",
            Stmt::Call(_) => "sub",
            Stmt::Routine(_) => "rout",
            Stmt::Seq(_) => "seq",
            Stmt::Use(_) => "use",
            Stmt::Trans { .. } => "trans",
            Stmt::Pers { .. } => "pers",
            Stmt::Void(_) => "void",
            Stmt::Count(_) => "count",
            Stmt::Enum(_) => "enum",
            Stmt::Iter(_) => "iter",
            Stmt::Defer(_) => "defer",
            Stmt::Debug(_) => "debug",
            Stmt::Push(_) => "push",
            Stmt::Pull(_) => "pull",
        }
    }

    /// Nested statements executed as part of this one.
    pub fn children(&self) -> &[Stmt] {
        match self {
            Stmt::Count(l) => &l.body,
            Stmt::Enum(l) | Stmt::Iter(l) => &l.body,
            Stmt::Defer(inner) => std::slice::from_ref(inner.as_ref()),
            _ => &[],
        }
    }
}

/// Collects the target of every call in `body`, nested blocks included,
/// in source order. Repeats are kept.
pub fn called_routines(body: &[Stmt]) -> Vec<&str> {
    fn walk<'a>(body: &'a [Stmt], out: &mut Vec<&'a str>) {
        for stmt in body {
            if let Stmt::Call(call) = stmt {
                out.push(&call.routine);
            }
            walk(stmt.children(), out);
        }
    }
    let mut out = Vec::new();
    walk(body, &mut out);
    out
}
