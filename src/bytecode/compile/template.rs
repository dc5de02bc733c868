use crate::bytecode::compile::{Compiler, RoutineCtx};
use crate::bytecode::compile_error::CompileError;
use crate::bytecode::op::{DebugMode, Op};

/// Piece of a `debug '...'` template.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Piece {
    Char(char),
    /// `{name}`, `{name.field}`; a leading backtick prints the value as a string.
    Embed {
        name: String,
        field: Option<String>,
        as_str: bool,
    },
}

pub(super) fn parse_template(template: &str) -> Result<Vec<Piece>, CompileError> {
    let mut pieces = Vec::new();
    let mut chars = template.chars();
    while let Some(c) = chars.next() {
        if c != '{' {
            pieces.push(Piece::Char(c));
            continue;
        }

        let mut inner = String::new();
        loop {
            match chars.next() {
                Some('}') => break,
                Some('{') => return Err(CompileError::bad_template(template, "nested '{'")),
                Some(c) => inner.push(c),
                None => return Err(CompileError::bad_template(template, "unterminated embed")),
            }
        }

        let (as_str, path) = match inner.strip_prefix('`') {
            Some(rest) => (true, rest),
            None => (false, inner.as_str()),
        };
        let path = path.trim();
        let (name, field) = match path.split_once('.') {
            Some((name, field)) => (name.trim(), Some(field.trim().to_string())),
            None => (path, None),
        };
        if name.is_empty() || field.as_deref() == Some("") {
            return Err(CompileError::bad_template(
                template,
                format!("empty name in '{{{}}}'", inner),
            ));
        }
        pieces.push(Piece::Embed {
            name: name.to_string(),
            field,
            as_str,
        });
    }
    Ok(pieces)
}

impl Compiler<'_> {
    pub(super) fn debug_template(
        &mut self,
        ctx: &RoutineCtx,
        template: &str,
    ) -> Result<(), CompileError> {
        for piece in parse_template(template)? {
            match piece {
                Piece::Char(c) => {
                    self.program.emit(Op::Const(c as i64));
                    self.program.emit(Op::Debug(DebugMode::Raw));
                }
                Piece::Embed {
                    name,
                    field,
                    as_str,
                } => {
                    self.check_embed(ctx, template, &name)?;
                    if let Some(field) = &field {
                        self.check_embed(ctx, template, field)?;
                        self.read_var(ctx, field)?;
                        self.program.emit(Op::Push);
                        self.read_var(ctx, &name)?;
                        self.program.emit(Op::Add);
                        self.program.emit(Op::Deref);
                    } else {
                        self.read_var(ctx, &name)?;
                    }
                    let mode = if as_str { DebugMode::Str } else { DebugMode::Num };
                    self.program.emit(Op::Debug(mode));
                }
            }
        }
        Ok(())
    }

    fn check_embed(&self, ctx: &RoutineCtx, template: &str, name: &str) -> Result<(), CompileError> {
        if ctx.scope.slot(name).is_none() && self.tree.constant(name).is_none() {
            return Err(CompileError::bad_template(
                template,
                format!("'{}' is not a variable or constant", name),
            ));
        }
        Ok(())
    }
}
