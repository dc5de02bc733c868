use crate::bytecode::compile::{Compiler, RoutineCtx};
use crate::bytecode::compile_error::CompileError;
use crate::bytecode::op::{Op, Target};
use crate::lang::expr::{BinOp, Expr};

impl Compiler<'_> {
    /// Generates code leaving the value of `expr` in the accumulator.
    /// The operand stack is left as it was found.
    pub(super) fn expr(&mut self, ctx: &RoutineCtx, expr: &Expr) -> Result<(), CompileError> {
        match expr {
            Expr::Number(n) => self.program.emit(Op::Const(*n)),
            Expr::Char(c) => self.program.emit(Op::Const(*c as i64)),
            Expr::Var(name) => self.read_var(ctx, name)?,
            Expr::Str(s) => self.string_literal(s),
            Expr::Binary { op, lhs, rhs } => self.binary(ctx, *op, lhs, rhs)?,
        }
        Ok(())
    }

    fn binary(
        &mut self,
        ctx: &RoutineCtx,
        op: BinOp,
        lhs: &Expr,
        rhs: &Expr,
    ) -> Result<(), CompileError> {
        match op {
            BinOp::Assign => {
                self.expr(ctx, rhs)?;
                self.write(ctx, lhs)?;
            }
            BinOp::PreAdd | BinOp::PreSub => {
                self.expr(ctx, rhs)?;
                self.program.emit(Op::Push);
                self.expr(ctx, lhs)?;
                self.program.emit(if op == BinOp::PreAdd { Op::Add } else { Op::Sub });
                self.write(ctx, lhs)?;
            }
            BinOp::PostAdd | BinOp::PostSub => {
                // Keep the old value on the stack across the write-back.
                self.expr(ctx, lhs)?;
                self.program.emit(Op::Push);
                self.expr(ctx, rhs)?;
                self.program.emit(Op::Push);
                self.expr(ctx, lhs)?;
                self.program.emit(if op == BinOp::PostAdd { Op::Add } else { Op::Sub });
                self.write(ctx, lhs)?;
                self.program.emit(Op::Pull);
            }
            BinOp::And | BinOp::Or => {
                self.expr(ctx, rhs)?;
                self.program.emit(Op::Truth);
                self.program.emit(Op::Push);
                self.expr(ctx, lhs)?;
                self.program.emit(Op::Truth);
                self.program.emit(if op == BinOp::And { Op::BitAnd } else { Op::BitOr });
            }
            BinOp::Member => {
                self.member_address(ctx, lhs, rhs)?;
                self.program.emit(Op::Deref);
            }
            _ => {
                self.expr(ctx, rhs)?;
                self.program.emit(Op::Push);
                self.expr(ctx, lhs)?;
                self.program.emit(arith_op(op)?);
            }
        }
        Ok(())
    }

    /// Leaves `base + offset` in the accumulator.
    fn member_address(
        &mut self,
        ctx: &RoutineCtx,
        base: &Expr,
        offset: &Expr,
    ) -> Result<(), CompileError> {
        self.expr(ctx, offset)?;
        self.program.emit(Op::Push);
        self.expr(ctx, base)?;
        self.program.emit(Op::Add);
        Ok(())
    }

    pub(super) fn read_var(&mut self, ctx: &RoutineCtx, name: &str) -> Result<(), CompileError> {
        if let Some(slot) = ctx.scope.slot(name) {
            self.program.emit(Op::Load(slot));
        } else if let Some(value) = self.tree.constant(name) {
            self.program.emit(Op::Const(value));
        } else {
            return Err(CompileError::UnregisteredVariable {
                routine: ctx.name().to_string(),
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Stores the accumulator into `target`. The accumulator keeps the value.
    pub(super) fn write(&mut self, ctx: &RoutineCtx, target: &Expr) -> Result<(), CompileError> {
        match target {
            Expr::Var(name) => match ctx.scope.slot(name) {
                Some(slot) => self.program.emit(Op::Store(slot)),
                None if self.tree.constant(name).is_some() => {
                    return Err(CompileError::NotWritable {
                        target: name.clone(),
                    });
                }
                None => {
                    return Err(CompileError::UnregisteredVariable {
                        routine: ctx.name().to_string(),
                        name: name.clone(),
                    });
                }
            },
            Expr::Binary {
                op: BinOp::Member,
                lhs,
                rhs,
            } => {
                self.program.emit(Op::Push);
                self.member_address(ctx, lhs, rhs)?;
                self.program.emit(Op::Ref);
                self.program.emit(Op::Deref);
            }
            other => {
                return Err(CompileError::NotWritable {
                    target: other.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Builds a persistent block of `s.len()` content cells holding the bytes
    /// of `s`; the accumulator receives the content base. The terminating
    /// zero goes to the cell just past the block.
    fn string_literal(&mut self, s: &str) {
        let bytes = s.bytes().chain(std::iter::once(0));
        self.program.emit(Op::Const(s.len() as i64));
        self.program.emit(Op::Pers);
        self.program.emit(Op::Push);
        for (index, byte) in bytes.enumerate() {
            self.program.emit(Op::Const(byte as i64));
            self.program.emit(Op::Push);
            self.program.emit(Op::Peek(1));
            self.program.emit(Op::Push);
            self.program.emit(Op::Const(index as i64));
            self.program.emit(Op::Add);
            self.program.emit(Op::Ref);
        }
        self.program.emit(Op::Pull);
    }
}

fn arith_op(op: BinOp) -> Result<Op<Target>, CompileError> {
    Ok(match op {
        BinOp::Add => Op::Add,
        BinOp::Sub => Op::Sub,
        BinOp::Mul => Op::Mul,
        BinOp::Greater => Op::Greater,
        BinOp::Lesser => Op::Lesser,
        BinOp::GreaterEq => Op::GreaterEq,
        BinOp::LesserEq => Op::LesserEq,
        BinOp::Equal => Op::Equal,
        BinOp::NotEqual => Op::NotEqual,
        BinOp::BitAnd => Op::BitAnd,
        BinOp::BitOr => Op::BitOr,
        other => {
            return Err(CompileError::internal(format!(
                "'{}' is not a plain arithmetic operator",
                other.symbol()
            )));
        }
    })
}

#[cfg(test)]
mod tests {
    use crate::bytecode::compile::test_util::*;
    use crate::bytecode::compile_error::CompileError;
    use crate::bytecode::op::Op;

    /// Body ops of `main` between `alloc` and `free`.
    fn body(source: &str) -> Vec<Op> {
        let exe = compile(&format!("rout main {{ {} }}", source));
        let ops = routine_ops(&exe, "main");
        ops[1..ops.len() - 2].to_vec()
    }

    #[test]
    fn test_assign_number() {
        assert_eq!(body("put a = 5;"), vec![Op::Const(5), Op::Store(0)]);
    }

    #[test]
    fn test_binary_evaluates_right_first() {
        assert_eq!(
            body("put a = b - 1;"),
            vec![Op::Const(1), Op::Push, Op::Load(1), Op::Sub, Op::Store(0)]
        );
    }

    #[test]
    fn test_char_literal() {
        assert_eq!(body("put c = `A;"), vec![Op::Const(65), Op::Store(0)]);
    }

    #[test]
    fn test_boolean_ops_normalize() {
        assert_eq!(
            body("put r = a && b;"),
            vec![
                Op::Load(2),
                Op::Truth,
                Op::Push,
                Op::Load(1),
                Op::Truth,
                Op::BitAnd,
                Op::Store(0),
            ]
        );
    }

    #[test]
    fn test_pre_increment() {
        assert_eq!(
            body("put i += 2;"),
            vec![Op::Const(2), Op::Push, Op::Load(0), Op::Add, Op::Store(0)]
        );
    }

    #[test]
    fn test_post_decrement_yields_old_value() {
        assert_eq!(
            body("put i =- 1;"),
            vec![
                Op::Load(0),
                Op::Push,
                Op::Const(1),
                Op::Push,
                Op::Load(0),
                Op::Sub,
                Op::Store(0),
                Op::Pull,
            ]
        );
    }

    #[test]
    fn test_member_read_uses_constant_offset() {
        let exe = compile("seq pair { lo hi } rout main { put v = p.pair::hi; }");
        let ops = routine_ops(&exe, "main");
        assert_eq!(
            ops[1..ops.len() - 2],
            [Op::Const(1), Op::Push, Op::Load(1), Op::Add, Op::Deref, Op::Store(0)]
        );
    }

    #[test]
    fn test_member_write() {
        let exe = compile("seq pair { lo hi } rout main { put p.pair::lo = 9; }");
        let ops = routine_ops(&exe, "main");
        assert_eq!(
            ops[1..ops.len() - 2],
            [
                Op::Const(9),
                Op::Push,
                Op::Const(0),
                Op::Push,
                Op::Load(0),
                Op::Add,
                Op::Ref,
                Op::Deref,
            ]
        );
    }

    #[test]
    fn test_string_literal_layout() {
        let ops = body("put s = 'hi';");
        // header is k+1 for k bytes
        assert_eq!(ops[..3], [Op::Const(2), Op::Pers, Op::Push]);
        // three cells written: 'h', 'i', 0
        assert_eq!(ops.iter().filter(|op| **op == Op::Ref).count(), 3);
        assert_eq!(
            ops[3..10],
            [
                Op::Const(104),
                Op::Push,
                Op::Peek(1),
                Op::Push,
                Op::Const(0),
                Op::Add,
                Op::Ref,
            ]
        );
        assert_eq!(ops[ops.len() - 2..], [Op::Pull, Op::Store(0)]);
    }

    #[test]
    fn test_writing_a_constant_fails() {
        let err = compile_err("seq pair { lo hi } rout main { put pair = 1; }");
        assert!(matches!(err, CompileError::NotWritable { target } if target == "pair"));
    }

    #[test]
    fn test_writing_an_expression_fails() {
        let err = compile_err("rout main { put a + 1 = 2; }");
        assert!(matches!(err, CompileError::NotWritable { .. }));
    }
}
