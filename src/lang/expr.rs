#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Assign,
    PreAdd,
    PostAdd,
    PreSub,
    PostSub,
    And,
    Or,
    Greater,
    Lesser,
    GreaterEq,
    LesserEq,
    Equal,
    NotEqual,
    BitAnd,
    BitOr,
    Add,
    Sub,
    Mul,
    Member,
}

impl BinOp {
    /// Binding strength, lowest first. Every level associates to the right,
    /// so `a - b - c` is `a - (b - c)`.
    pub fn precedence(self) -> u8 {
        use BinOp::*;
        match self {
            Assign => 0,
            PreAdd | PostAdd | PreSub | PostSub => 1,
            And | Or => 2,
            Greater | Lesser | GreaterEq | LesserEq | Equal | NotEqual => 3,
            BitAnd | BitOr => 4,
            Add | Sub => 5,
            Mul => 6,
            Member => 7,
        }
    }

    pub fn symbol(self) -> &'static str {
        use BinOp::*;
        match self {
            Assign => "=",
            PreAdd => "+=",
            PostAdd => "=+",
            PreSub => "-=",
            PostSub => "=-",
            And => "&&",
            Or => "||",
            Greater => ">",
            Lesser => "<",
            GreaterEq => ">=",
            LesserEq => "<=",
            Equal => "==",
            NotEqual => "!=",
            BitAnd => "&",
            BitOr => "|",
            Add => "+",
            Sub => "-",
            Mul => "*",
            Member => ".",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(i64),
    Var(String),
    Str(String),
    Char(char),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Visits every variable name in source order.
    pub fn for_each_var(&self, f: &mut impl FnMut(&str)) {
        match self {
            Expr::Var(name) => f(name),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.for_each_var(f);
                rhs.for_each_var(f);
            }
            Expr::Number(_) | Expr::Str(_) | Expr::Char(_) => {}
        }
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Str(s) => write!(f, "'{}'", s),
            Expr::Char(c) => write!(f, "`{}", c),
            Expr::Binary { op, lhs, rhs } => write!(f, "({} {} {})", lhs, op.symbol(), rhs),
        }
    }
}
