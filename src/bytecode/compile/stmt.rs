use tracing::trace;

use crate::bytecode::compile::{Compiler, RoutineCtx};
use crate::bytecode::compile_error::CompileError;
use crate::bytecode::op::{DebugMode, Op, Target};
use crate::lang::expr::Expr;
use crate::lang::stmt::{BlockLoop, Call, CountLoop, Stmt, loop_labels};

impl<'t> Compiler<'t> {
    pub(super) fn stmt(&mut self, ctx: &mut RoutineCtx<'t>, stmt: &Stmt) -> Result<(), CompileError> {
        trace!(routine = ctx.name(), kind = stmt.kind(), "generating statement");
        match stmt {
            Stmt::Put(e) => self.expr(ctx, e)?,
            Stmt::Label(name) => self.program.define_label(ctx.name(), name)?,
            Stmt::Jump { label, cond: None } => self.program.emit(Op::Jump(ctx.label(label))),
            Stmt::Jump {
                label,
                cond: Some(cond),
            } => {
                self.expr(ctx, cond)?;
                self.program.emit(Op::Branch(ctx.label(label)));
            }
            Stmt::Call(call) => self.call(ctx, call)?,
            Stmt::Trans { size, target } => self.alloc_block(ctx, size, Op::Trans, target)?,
            Stmt::Pers { size, target } => self.alloc_block(ctx, size, Op::Pers, target)?,
            Stmt::Void(block) => {
                self.expr(ctx, block)?;
                self.program.emit(Op::Void);
            }
            Stmt::Count(l) => self.count_loop(ctx, l)?,
            Stmt::Enum(l) | Stmt::Iter(l) => self.block_loop(ctx, l)?,
            Stmt::Defer(inner) => ctx.body.push((**inner).clone()),
            Stmt::Debug(e) => self.debug(ctx, e)?,
            Stmt::Push(e) => {
                self.expr(ctx, e)?;
                self.program.emit(Op::Push);
            }
            Stmt::Pull(target) => {
                self.program.emit(Op::Pull);
                self.write(ctx, target)?;
            }
            Stmt::Routine(r) => return Err(CompileError::definition_in_body("rout", &r.name)),
            Stmt::Seq(s) => return Err(CompileError::definition_in_body("seq", &s.name)),
            Stmt::Use(path) => return Err(CompileError::definition_in_body("use", path)),
        }
        Ok(())
    }

    fn block(&mut self, ctx: &mut RoutineCtx<'t>, body: &[Stmt]) -> Result<(), CompileError> {
        for stmt in body {
            self.stmt(ctx, stmt)?;
        }
        Ok(())
    }

    /// Call site: push ins in declared order, reserve the outs, call, pop
    /// the outs in reverse into their targets, release the ins.
    fn call(&mut self, ctx: &RoutineCtx, call: &Call) -> Result<(), CompileError> {
        let tree = self.tree;
        let callee = tree
            .routine(&call.routine)
            .ok_or_else(|| CompileError::UnknownRoutine {
                name: call.routine.clone(),
            })?;
        let params = &callee.params;

        if let Some(unknown) = call.bindings.iter().find(|b| !params.declares(&b.param)) {
            return Err(CompileError::UnknownParameter {
                routine: call.routine.clone(),
                param: unknown.param.clone(),
            });
        }
        let bound = |param: &String| {
            call.binding(param)
                .ok_or_else(|| CompileError::UnboundParameter {
                    routine: call.routine.clone(),
                    param: param.clone(),
                })
        };

        for param in &params.ins {
            self.expr(ctx, bound(param)?)?;
            self.program.emit(Op::Push);
        }
        let outs = params
            .outs
            .iter()
            .map(bound)
            .collect::<Result<Vec<&Expr>, _>>()?;

        self.program.emit(Op::Alloc(outs.len() as i64));
        self.program.emit(Op::Call(Target::routine(&call.routine)));
        for target in outs.iter().rev() {
            self.program.emit(Op::Pull);
            self.write(ctx, target)?;
        }
        self.program.emit(Op::Free(params.ins.len() as i64));
        Ok(())
    }

    fn alloc_block(
        &mut self,
        ctx: &RoutineCtx,
        size: &Expr,
        op: Op<Target>,
        target: &Expr,
    ) -> Result<(), CompileError> {
        self.expr(ctx, size)?;
        self.program.emit(op);
        self.write(ctx, target)
    }

    fn slot(&self, ctx: &RoutineCtx, name: &str) -> Result<i64, CompileError> {
        ctx.scope
            .slot(name)
            .ok_or_else(|| CompileError::UnregisteredVariable {
                routine: ctx.name().to_string(),
                name: name.to_string(),
            })
    }

    /// `count var ~ start..end`, both bounds inclusive. `end` is evaluated
    /// before every pass.
    fn count_loop(&mut self, ctx: &mut RoutineCtx<'t>, l: &CountLoop) -> Result<(), CompileError> {
        let (top, exit) = loop_labels(l.id);
        let var = self.slot(ctx, &l.var)?;

        self.expr(ctx, &l.start)?;
        self.program.emit(Op::Store(var));
        self.program.define_label(ctx.name(), &top)?;
        self.expr(ctx, &l.end)?;
        self.program.emit(Op::Push);
        self.program.emit(Op::Load(var));
        self.program.emit(Op::Greater);
        self.program.emit(Op::Branch(ctx.label(&exit)));

        self.block(ctx, &l.body)?;

        self.program.emit(Op::Load(var));
        self.program.emit(Op::Inc);
        self.program.emit(Op::Store(var));
        self.program.emit(Op::Jump(ctx.label(&top)));
        self.program.define_label(ctx.name(), &exit)
    }

    /// `enum` / `iter`: pins the block base and its content length, then
    /// loads `base[index]` into the element slot before each pass.
    fn block_loop(&mut self, ctx: &mut RoutineCtx<'t>, l: &BlockLoop) -> Result<(), CompileError> {
        let (top, exit) = loop_labels(l.id);
        let base = self.slot(ctx, &l.base_slot())?;
        let len = self.slot(ctx, &l.len_slot())?;
        let index = self.slot(ctx, &l.index_slot())?;
        let elem = self.slot(ctx, &l.elem)?;

        self.expr(ctx, &l.block)?;
        self.program.emit(Op::Store(base));
        // content length = header - 1
        self.program.emit(Op::Dec);
        self.program.emit(Op::Deref);
        self.program.emit(Op::Dec);
        self.program.emit(Op::Store(len));
        self.program.emit(Op::Const(0));
        self.program.emit(Op::Store(index));

        self.program.define_label(ctx.name(), &top)?;
        self.program.emit(Op::Load(len));
        self.program.emit(Op::Push);
        self.program.emit(Op::Load(index));
        self.program.emit(Op::GreaterEq);
        self.program.emit(Op::Branch(ctx.label(&exit)));
        self.program.emit(Op::Load(index));
        self.program.emit(Op::Push);
        self.program.emit(Op::Load(base));
        self.program.emit(Op::Add);
        self.program.emit(Op::Deref);
        self.program.emit(Op::Store(elem));

        self.block(ctx, &l.body)?;

        self.program.emit(Op::Load(index));
        self.program.emit(Op::Inc);
        self.program.emit(Op::Store(index));
        self.program.emit(Op::Jump(ctx.label(&top)));
        self.program.define_label(ctx.name(), &exit)
    }

    fn debug(&mut self, ctx: &RoutineCtx, e: &Expr) -> Result<(), CompileError> {
        match e {
            Expr::Char(c) => {
                self.program.emit(Op::Const(*c as i64));
                self.program.emit(Op::Debug(DebugMode::Char));
                return Ok(());
            }
            Expr::Str(template) => self.debug_template(ctx, template)?,
            _ => {
                self.expr(ctx, e)?;
                self.program.emit(Op::Debug(DebugMode::Num));
            }
        }
        self.program.emit(Op::Const('\n' as i64));
        self.program.emit(Op::Debug(DebugMode::Raw));
        Ok(())
    }
}
