use std::path::{Path, PathBuf};

use crate::frontend::error::{Location, ParseError};
use crate::frontend::lexer::{Span, Spanned};
use crate::frontend::token::Token;
use crate::lang::expr::{BinOp, Expr};
use crate::lang::routine::{ParamInterface, Routine, SeqType};
use crate::lang::stmt::{Binding, BlockLoop, Call, CountLoop, LoopId, Stmt};

/// Recursive-descent parser for sapling.
///
/// The parser consumes lexed `Spanned` tokens and produces the list of
/// top-level definitions (`rout`, `seq`, `use`). Statements are only valid
/// inside routine bodies; definitions are only valid at the top level.
///
/// Expressions are parsed by precedence climbing over `BinOp::precedence`.
pub struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    path: Option<PathBuf>,
    /// Span of the most recently consumed token, used for errors at EOF.
    last_span: Option<Span>,
    next_loop: LoopId,
}

impl Parser {
    pub fn new(tokens: Vec<Spanned>) -> Self {
        Parser {
            tokens,
            pos: 0,
            path: None,
            last_span: None,
            next_loop: 0,
        }
    }

    /// Attaches the source path used in diagnostics.
    pub fn with_path(mut self, path: &Path) -> Self {
        self.path = Some(path.to_path_buf());
        self
    }

    fn current(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if let Some(s) = &token {
            self.last_span = Some(s.span.clone());
        }
        self.pos += 1;
        token.map(|s| s.token)
    }

    fn peek(&self) -> Option<&Token> {
        self.current().map(|s| &s.token)
    }

    fn at(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek(), None | Some(Token::Eof))
    }

    /// Constructs a `ParseError` at the current token, falling back to the
    /// last consumed token and finally to 1:1 for empty input.
    fn error(&self, message: impl Into<String>) -> ParseError {
        let span = self
            .current()
            .map(|s| s.span.clone())
            .or_else(|| self.last_span.clone())
            .unwrap_or(Span { line: 1, col: 1 });
        ParseError {
            message: message.into(),
            location: Location {
                path: self.path.clone(),
                line: span.line,
                col: span.col,
            },
        }
    }

    fn found(&self) -> String {
        match self.peek() {
            Some(token) => format!("'{}'", token),
            None => "end of file".to_string(),
        }
    }

    fn expect(&mut self, token: Token) -> Result<(), ParseError> {
        if self.at(&token) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("expected '{}' but found {}", token, self.found())))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, ParseError> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error(format!("expected {} but found {}", what, self.found()))),
        }
    }

    fn next_loop_id(&mut self) -> LoopId {
        let id = self.next_loop;
        self.next_loop += 1;
        id
    }

    /// Parses a complete source file into its top-level definitions.
    pub fn parse(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut items = Vec::new();
        while !self.at_eof() {
            let item = match self.peek() {
                Some(Token::Rout) => self.parse_routine()?,
                Some(Token::Seq) => self.parse_seq()?,
                Some(Token::Use) => self.parse_use()?,
                _ => {
                    return Err(self.error(format!(
                        "expected 'rout', 'seq' or 'use' but found {}",
                        self.found()
                    )));
                }
            };
            items.push(item);
        }
        Ok(items)
    }

    /// Parses a routine definition:
    ///
    /// ```text
    /// rout <name> ( in <a>; out <b>; ) { <body...> }
    /// ```
    ///
    /// The parameter list is optional.
    fn parse_routine(&mut self) -> Result<Stmt, ParseError> {
        self.advance(); // consume 'rout'
        let name = self.expect_ident("routine name")?;

        let mut params = ParamInterface::default();
        if self.at(&Token::LParen) {
            self.advance();
            while !self.at(&Token::RParen) {
                let is_in = match self.peek() {
                    Some(Token::In) => true,
                    Some(Token::Out) => false,
                    _ => {
                        return Err(self.error(format!(
                            "expected 'in', 'out' or ')' but found {}",
                            self.found()
                        )));
                    }
                };
                self.advance();
                let param = self.expect_ident("parameter name")?;
                if params.declares(&param) {
                    return Err(self.error(format!(
                        "parameter '{}' declared twice in routine '{}'",
                        param, name
                    )));
                }
                if is_in {
                    params.ins.push(param);
                } else {
                    params.outs.push(param);
                }
                self.expect(Token::Semi)?;
            }
            self.expect(Token::RParen)?;
        }

        let body = self.parse_block()?;
        Ok(Stmt::Routine(Routine { name, params, body }))
    }

    /// Parses a sequence type: `seq <name> { <field> [,] <field> ... }`.
    fn parse_seq(&mut self) -> Result<Stmt, ParseError> {
        self.advance(); // consume 'seq'
        let name = self.expect_ident("sequence name")?;
        self.expect(Token::LBrace)?;
        let mut fields = Vec::new();
        while !self.at(&Token::RBrace) {
            fields.push(self.expect_ident("field name")?);
            if self.at(&Token::Comma) {
                self.advance();
            }
        }
        self.expect(Token::RBrace)?;
        Ok(Stmt::Seq(SeqType { name, fields }))
    }

    /// Parses an import: `use '<path>';`.
    fn parse_use(&mut self) -> Result<Stmt, ParseError> {
        self.advance(); // consume 'use'
        let path = match self.peek() {
            Some(Token::Str(path)) => path.clone(),
            _ => return Err(self.error(format!("expected import path but found {}", self.found()))),
        };
        self.advance();
        self.expect(Token::Semi)?;
        Ok(Stmt::Use(path))
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect(Token::LBrace)?;
        let mut body = Vec::new();
        while !self.at(&Token::RBrace) {
            if self.at_eof() {
                return Err(self.error("expected '}' but found end of file"));
            }
            body.push(self.parse_stmt()?);
        }
        self.expect(Token::RBrace)?;
        Ok(body)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        let token = self.peek().cloned();
        let stmt = match token {
            Some(Token::Put) => {
                self.advance();
                Stmt::Put(self.parse_expr()?)
            }
            Some(Token::Lab) => {
                self.advance();
                Stmt::Label(self.expect_ident("label name")?)
            }
            Some(Token::Jump) => {
                self.advance();
                let label = self.expect_ident("label name")?;
                let cond = if self.at(&Token::Bind) {
                    self.advance();
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                Stmt::Jump { label, cond }
            }
            Some(Token::Sub) => {
                self.advance();
                Stmt::Call(self.parse_call()?)
            }
            Some(Token::Trans) | Some(Token::Pers) => {
                self.advance();
                let size = self.parse_expr()?;
                self.expect(Token::Bind)?;
                let target = self.parse_expr()?;
                if token == Some(Token::Trans) {
                    Stmt::Trans { size, target }
                } else {
                    Stmt::Pers { size, target }
                }
            }
            Some(Token::Void) => {
                self.advance();
                Stmt::Void(self.parse_expr()?)
            }
            Some(Token::Debug) => {
                self.advance();
                Stmt::Debug(self.parse_expr()?)
            }
            Some(Token::Push) => {
                self.advance();
                Stmt::Push(self.parse_expr()?)
            }
            Some(Token::Pull) => {
                self.advance();
                Stmt::Pull(self.parse_expr()?)
            }
            // Block-bodied statements carry no terminator.
            Some(Token::Count) => return self.parse_count(),
            Some(Token::Enum) => return self.parse_block_loop(true),
            Some(Token::Iter) => return self.parse_block_loop(false),
            Some(Token::Defer) => {
                self.advance();
                return Ok(Stmt::Defer(Box::new(self.parse_stmt()?)));
            }
            Some(Token::Rout) | Some(Token::Seq) | Some(Token::Use) => {
                return Err(self.error(format!(
                    "{} is only allowed at the top level",
                    self.found()
                )));
            }
            _ => {
                return Err(self.error(format!("expected a statement but found {}", self.found())));
            }
        };
        self.expect(Token::Semi)?;
        Ok(stmt)
    }

    /// Parses the rest of a call: `<name> [( <param> [~ <expr>] [,] ... )]`.
    fn parse_call(&mut self) -> Result<Call, ParseError> {
        let routine = self.expect_ident("routine name")?;
        let mut bindings: Vec<Binding> = Vec::new();
        if self.at(&Token::LParen) {
            self.advance();
            while !self.at(&Token::RParen) {
                let param = self.expect_ident("parameter name")?;
                let expr = if self.at(&Token::Bind) {
                    self.advance();
                    self.parse_expr()?
                } else {
                    Expr::var(param.clone())
                };
                if bindings.iter().any(|b| b.param == param) {
                    return Err(self.error(format!(
                        "parameter '{}' bound twice in call to '{}'",
                        param, routine
                    )));
                }
                bindings.push(Binding { param, expr });
                if self.at(&Token::Comma) {
                    self.advance();
                }
            }
            self.expect(Token::RParen)?;
        }
        Ok(Call { routine, bindings })
    }

    /// `count <var> ~ <start> .. <end> { <body> }`
    fn parse_count(&mut self) -> Result<Stmt, ParseError> {
        self.advance(); // consume 'count'
        let id = self.next_loop_id();
        let var = self.expect_ident("loop variable")?;
        self.expect(Token::Bind)?;
        let start = self.parse_expr()?;
        self.expect(Token::Range)?;
        let end = self.parse_expr()?;
        let body = self.parse_block()?;
        Ok(Stmt::Count(CountLoop {
            id,
            var,
            start,
            end,
            body,
        }))
    }

    /// `enum <elem> @ <index> ~ <block> { <body> }` or
    /// `iter <elem> ~ <block> { <body> }`
    fn parse_block_loop(&mut self, indexed: bool) -> Result<Stmt, ParseError> {
        self.advance(); // consume 'enum' / 'iter'
        let id = self.next_loop_id();
        let elem = self.expect_ident("element variable")?;
        let index = if indexed {
            self.expect(Token::At)?;
            Some(self.expect_ident("index variable")?)
        } else {
            None
        };
        self.expect(Token::Bind)?;
        let block = self.parse_expr()?;
        let body = self.parse_block()?;
        let l = BlockLoop {
            id,
            elem,
            index,
            block,
            body,
        };
        Ok(if indexed { Stmt::Enum(l) } else { Stmt::Iter(l) })
    }

    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_expr_prec(0)
    }

    fn parse_expr_prec(&mut self, min: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_terminal()?;
        while let Some(op) = self.peek().and_then(binop) {
            let prec = op.precedence();
            if prec < min {
                break;
            }
            self.advance();
            // the right operand stays at this level: right associative
            let rhs = self.parse_expr_prec(prec)?;
            lhs = Expr::binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_terminal(&mut self) -> Result<Expr, ParseError> {
        let expr = match self.peek() {
            Some(Token::Number(n)) => Expr::Number(*n),
            Some(Token::Ident(name)) => Expr::Var(name.clone()),
            Some(Token::Str(s)) => Expr::Str(s.clone()),
            Some(Token::Char(c)) => Expr::Char(*c),
            Some(Token::LParen) => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(Token::RParen)?;
                return Ok(inner);
            }
            _ => return Err(self.error(format!("expected an expression but found {}", self.found()))),
        };
        self.advance();
        Ok(expr)
    }
}

fn binop(token: &Token) -> Option<BinOp> {
    Some(match token {
        Token::Assign => BinOp::Assign,
        Token::PreAdd => BinOp::PreAdd,
        Token::PostAdd => BinOp::PostAdd,
        Token::PreSub => BinOp::PreSub,
        Token::PostSub => BinOp::PostSub,
        Token::AndAnd => BinOp::And,
        Token::OrOr => BinOp::Or,
        Token::Gt => BinOp::Greater,
        Token::Lt => BinOp::Lesser,
        Token::GtEq => BinOp::GreaterEq,
        Token::LtEq => BinOp::LesserEq,
        Token::EqEq => BinOp::Equal,
        Token::NotEq => BinOp::NotEqual,
        Token::Amp => BinOp::BitAnd,
        Token::Pipe => BinOp::BitOr,
        Token::Plus => BinOp::Add,
        Token::Minus => BinOp::Sub,
        Token::Star => BinOp::Mul,
        Token::Dot => BinOp::Member,
        _ => return None,
    })
}
