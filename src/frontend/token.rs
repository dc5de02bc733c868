#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Number(i64),
    Str(std::string::String),
    Char(char),

    // Top-level definitions
    Rout,
    Seq,
    Use,
    In,
    Out,

    // Statements
    Put,
    Lab,
    Jump,
    Sub,
    Trans,
    Pers,
    Void,
    Count,
    Enum,
    Iter,
    Defer,
    Debug,
    Push,
    Pull,

    // Operators
    Assign,  // =
    PreAdd,  // +=
    PostAdd, // =+
    PreSub,  // -=
    PostSub, // =-
    AndAnd,  // &&
    OrOr,    // ||
    Gt,
    Lt,
    GtEq,
    LtEq,
    EqEq,
    NotEq,
    Amp,  // &
    Pipe, // |
    Plus,
    Minus,
    Star,
    Dot,

    // Punctuation
    Bind,   // ~
    At,     // @
    Range,  // ..
    Semi,   // ;
    Comma,  // ,
    LParen, // (
    RParen, // )
    LBrace, // {
    RBrace, // }

    // Identifier (variable, label, routine, constant)
    Ident(std::string::String),

    Eof,
}

impl Token {
    pub fn keyword(word: &str) -> Option<Token> {
        Some(match word {
            "rout" => Token::Rout,
            "seq" => Token::Seq,
            "use" => Token::Use,
            "in" => Token::In,
            "out" => Token::Out,
            "put" => Token::Put,
            "lab" => Token::Lab,
            "jump" => Token::Jump,
            "sub" => Token::Sub,
            "trans" => Token::Trans,
            "pers" => Token::Pers,
            "void" => Token::Void,
            "count" => Token::Count,
            "enum" => Token::Enum,
            "iter" => Token::Iter,
            "defer" => Token::Defer,
            "debug" => Token::Debug,
            "push" => Token::Push,
            "pull" => Token::Pull,
            _ => return None,
        })
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Token::Number(n) => return write!(f, "{}", n),
            Token::Str(s) => return write!(f, "'{}'", s),
            Token::Char(c) => return write!(f, "`{}", c),
            Token::Ident(name) => return write!(f, "{}", name),

            Token::Rout => "rout",
            Token::Seq => "seq",
            Token::Use => "use",
            Token::In => "in",
            Token::Out => "out",
            Token::Put => "put",
            Token::Lab => "lab",
            Token::Jump => "jump",
            Token::Sub => "sub",
            Token::Trans => "trans",
            Token::Pers => "pers",
            Token::Void => "void",
            Token::Count => "count",
            Token::Enum => "enum",
            Token::Iter => "iter",
            Token::Defer => "defer",
            Token::Debug => "debug",
            Token::Push => "push",
            Token::Pull => "pull",

            Token::Assign => "=",
            Token::PreAdd => "+=",
            Token::PostAdd => "=+",
            Token::PreSub => "-=",
            Token::PostSub => "=-",
            Token::AndAnd => "&&",
            Token::OrOr => "||",
            Token::Gt => ">",
            Token::Lt => "<",
            Token::GtEq => ">=",
            Token::LtEq => "<=",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::Amp => "&",
            Token::Pipe => "|",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Dot => ".",

            Token::Bind => "~",
            Token::At => "@",
            Token::Range => "..",
            Token::Semi => ";",
            Token::Comma => ",",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",

            Token::Eof => "end of file",
        };
        write!(f, "{}", s)
    }
}
