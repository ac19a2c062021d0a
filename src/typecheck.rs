use crate::ast::{
    BinOp, ElifBranch, Expr, ExprKind, Flow, FunDef, Program, Stmt, StmtKind, Type, Typed,
    TypedVar, UnOp, Untyped, VarDef,
};
use crate::error::{CompileError, CompileResult};
use crate::span::Span;
use std::collections::HashMap;

/// Host-provided functions: name and the type of their single parameter.
/// Both return None.
pub const BUILTINS: [(&str, Type); 2] = [("print_int", Type::Int), ("print_bool", Type::Bool)];

pub fn typecheck(program: &Program<Untyped>) -> CompileResult<Program<Typed>> {
    let mut checker = TypeChecker::new();
    checker.check_program(program)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<Type>,
    pub ret: Type,
}

/// Which frame satisfied a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The innermost frame: names this scope may assign.
    Declared,
    /// An enclosing frame, visible read-only.
    Outer,
}

/// Stack of binding frames, innermost last.
#[derive(Debug, Default)]
pub struct Env {
    frames: Vec<HashMap<String, Type>>,
}

impl Env {
    pub fn enter_scope(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn exit_scope(&mut self) {
        self.frames.pop();
    }

    pub fn declare(&mut self, var: &TypedVar) -> CompileResult<()> {
        let Some(frame) = self.frames.last_mut() else {
            return Err(CompileError::type_at("No scope to declare in", var.span));
        };
        if frame.contains_key(&var.name) {
            return Err(CompileError::type_at(
                format!("Duplicate declaration of {}", var.name),
                var.span,
            ));
        }
        frame.insert(var.name.clone(), var.ty);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<(Type, Origin)> {
        let innermost = self.frames.len().checked_sub(1)?;
        self.frames
            .iter()
            .enumerate()
            .rev()
            .find_map(|(depth, frame)| {
                let origin = if depth == innermost {
                    Origin::Declared
                } else {
                    Origin::Outer
                };
                frame.get(name).map(|ty| (*ty, origin))
            })
    }
}

/// Where the statements being checked live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    TopLevel,
    Function { ret: Type },
}

struct TypeChecker {
    env: Env,
    functions: HashMap<String, Signature>,
}

impl TypeChecker {
    fn new() -> Self {
        let functions = BUILTINS
            .iter()
            .map(|(name, param)| {
                (
                    name.to_string(),
                    Signature {
                        params: vec![*param],
                        ret: Type::None,
                    },
                )
            })
            .collect();
        Self {
            env: Env::default(),
            functions,
        }
    }

    fn check_program(&mut self, program: &Program<Untyped>) -> CompileResult<Program<Typed>> {
        self.env.enter_scope();
        for g in &program.globals {
            self.check_var_def(g)?;
        }

        for func in &program.functions {
            if BUILTINS.iter().any(|(name, _)| *name == func.name) {
                return Err(CompileError::type_at(
                    format!("Cannot redefine built-in function {}", func.name),
                    func.span,
                ));
            }
            if self.functions.contains_key(&func.name) {
                return Err(CompileError::type_at(
                    format!("Duplicate function {}", func.name),
                    func.span,
                ));
            }
            self.functions.insert(
                func.name.clone(),
                Signature {
                    params: func.params.iter().map(|p| p.ty).collect(),
                    ret: func.ret,
                },
            );
        }

        let functions = program
            .functions
            .iter()
            .map(|func| self.check_function(func))
            .collect::<CompileResult<Vec<_>>>()?;
        let (stmts, _) = self.check_block(&program.stmts, Context::TopLevel)?;
        self.env.exit_scope();

        log::debug!(
            "type checked {} globals, {} functions, {} statements",
            program.globals.len(),
            functions.len(),
            stmts.len()
        );
        Ok(Program {
            globals: program.globals.clone(),
            functions,
            stmts,
        })
    }

    /// The literal must have exactly the declared type.
    fn check_var_def(&mut self, def: &VarDef) -> CompileResult<()> {
        let found = def.literal.ty();
        if found != def.var.ty {
            return Err(CompileError::type_at(
                format!("Expected `{}`; but got `{}`", def.var.ty, found),
                def.span,
            ));
        }
        self.env.declare(&def.var)
    }

    fn check_function(&mut self, func: &FunDef<Untyped>) -> CompileResult<FunDef<Typed>> {
        self.env.enter_scope();
        let result = self.check_function_body(func);
        self.env.exit_scope();
        let (body, flow) = result?;

        if func.ret != Type::None && flow.returns() != Some(func.ret) {
            return Err(CompileError::type_at(
                format!(
                    "Function {} must return a value of type {} on all paths",
                    func.name, func.ret
                ),
                func.span,
            ));
        }
        log::trace!("checked function {}", func.name);
        Ok(FunDef {
            name: func.name.clone(),
            params: func.params.clone(),
            ret: func.ret,
            locals: func.locals.clone(),
            body,
            span: func.span,
        })
    }

    fn check_function_body(
        &mut self,
        func: &FunDef<Untyped>,
    ) -> CompileResult<(Vec<Stmt<Typed>>, Flow)> {
        for param in &func.params {
            self.env.declare(param)?;
        }
        for local in &func.locals {
            self.check_var_def(local)?;
        }
        self.check_block(&func.body, Context::Function { ret: func.ret })
    }

    /// Check statements in order; the block's flow is its last statement's.
    fn check_block(
        &mut self,
        stmts: &[Stmt<Untyped>],
        ctx: Context,
    ) -> CompileResult<(Vec<Stmt<Typed>>, Flow)> {
        let mut checked = Vec::with_capacity(stmts.len());
        let mut flow = Flow::FallsThrough;
        for stmt in stmts {
            if flow != Flow::FallsThrough {
                return Err(CompileError::type_at(
                    "Unreachable code after return",
                    stmt.span,
                ));
            }
            let stmt = self.check_stmt(stmt, ctx)?;
            flow = stmt.flow();
            checked.push(stmt);
        }
        Ok((checked, flow))
    }

    fn check_stmt(&mut self, stmt: &Stmt<Untyped>, ctx: Context) -> CompileResult<Stmt<Typed>> {
        let span = stmt.span;
        let (kind, flow) = match &stmt.kind {
            StmtKind::Assign { name, value } => {
                let target = match self.env.lookup(name) {
                    None => {
                        return Err(CompileError::type_at(
                            format!("Unbound identifier {}", name),
                            span,
                        ))
                    }
                    Some((_, Origin::Outer)) => {
                        return Err(CompileError::type_at(
                            format!("Cannot assign to {}: not declared in this scope", name),
                            span,
                        ))
                    }
                    Some((ty, Origin::Declared)) => ty,
                };
                let value = self.check_expr(value)?;
                if value.ty() != target {
                    return Err(CompileError::type_at(
                        format!(
                            "Cannot assign {} to {} of type {}",
                            value.ty(),
                            name,
                            target
                        ),
                        span,
                    ));
                }
                let kind = StmtKind::Assign {
                    name: name.clone(),
                    value,
                };
                (kind, Flow::FallsThrough)
            }
            StmtKind::Expr(expr) => (StmtKind::Expr(self.check_expr(expr)?), Flow::FallsThrough),
            StmtKind::If {
                cond,
                then,
                elifs,
                orelse,
            } => {
                let cond = self.check_condition(cond)?;
                let (then, then_flow) = self.check_block(then, ctx)?;
                let mut flows = vec![then_flow];
                let mut checked_elifs = Vec::with_capacity(elifs.len());
                for elif in elifs {
                    let cond = self.check_condition(&elif.cond)?;
                    let (body, flow) = self.check_block(&elif.body, ctx)?;
                    flows.push(flow);
                    checked_elifs.push(ElifBranch { cond, body });
                }
                let orelse = match orelse {
                    Some(block) => {
                        let (block, flow) = self.check_block(block, ctx)?;
                        flows.push(flow);
                        Some(block)
                    }
                    None => None,
                };
                // Without an else some path skips every arm.
                let flow = match flows[0] {
                    Flow::Returns(ty)
                        if orelse.is_some() && flows.iter().all(|f| *f == Flow::Returns(ty)) =>
                    {
                        Flow::Returns(ty)
                    }
                    _ => Flow::FallsThrough,
                };
                let kind = StmtKind::If {
                    cond,
                    then,
                    elifs: checked_elifs,
                    orelse,
                };
                (kind, flow)
            }
            StmtKind::While { cond, body } => {
                let cond = self.check_condition(cond)?;
                let (body, _) = self.check_block(body, ctx)?;
                (StmtKind::While { cond, body }, Flow::FallsThrough)
            }
            StmtKind::Pass => (StmtKind::Pass, Flow::FallsThrough),
            StmtKind::Return(value) => {
                let Context::Function { ret } = ctx else {
                    return Err(CompileError::type_at(
                        "Return statement outside of a function",
                        span,
                    ));
                };
                let value = value.as_ref().map(|e| self.check_expr(e)).transpose()?;
                let found = value.as_ref().map_or(Type::None, |e| e.ty());
                if found != ret {
                    let message = match value {
                        None => format!("Missing return value; expected {}", ret),
                        Some(_) => format!("Expected return type {}; got {}", ret, found),
                    };
                    return Err(CompileError::type_at(message, span));
                }
                (StmtKind::Return(value), Flow::Returns(found))
            }
        };
        Ok(Stmt::new(kind, span, flow))
    }

    fn check_condition(&mut self, cond: &Expr<Untyped>) -> CompileResult<Expr<Typed>> {
        let cond = self.check_expr(cond)?;
        if cond.ty() != Type::Bool {
            return Err(CompileError::type_at(
                format!("Condition must be bool; got {}", cond.ty()),
                cond.span,
            ));
        }
        Ok(cond)
    }

    fn check_expr(&mut self, expr: &Expr<Untyped>) -> CompileResult<Expr<Typed>> {
        let span = expr.span;
        let (kind, ty) = match &expr.kind {
            ExprKind::Literal(lit) => (ExprKind::Literal(*lit), lit.ty()),
            ExprKind::Id(name) => {
                let (ty, _) = self.env.lookup(name).ok_or_else(|| {
                    CompileError::type_at(format!("Unbound identifier {}", name), span)
                })?;
                (ExprKind::Id(name.clone()), ty)
            }
            ExprKind::Unary { op, expr } => {
                let operand = self.check_expr(expr)?;
                let expected = match op {
                    UnOp::Not => Type::Bool,
                    UnOp::Neg => Type::Int,
                };
                if operand.ty() != expected {
                    return Err(CompileError::type_at(
                        format!(
                            "Operator {} expects {}; got {}",
                            op,
                            expected,
                            operand.ty()
                        ),
                        span,
                    ));
                }
                let kind = ExprKind::Unary {
                    op: *op,
                    expr: Box::new(operand),
                };
                (kind, expected)
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.check_expr(left)?;
                let right = self.check_expr(right)?;
                let ty = binary_result(*op, left.ty(), right.ty()).ok_or_else(|| {
                    CompileError::type_at(
                        format!(
                            "Cannot apply operator {} to {} and {}",
                            op,
                            left.ty(),
                            right.ty()
                        ),
                        span,
                    )
                })?;
                let kind = ExprKind::Binary {
                    op: *op,
                    left: Box::new(left),
                    right: Box::new(right),
                };
                (kind, ty)
            }
            ExprKind::Paren(inner) => {
                let inner = self.check_expr(inner)?;
                let ty = inner.ty();
                (ExprKind::Paren(Box::new(inner)), ty)
            }
            ExprKind::Call { name, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.check_expr(arg))
                    .collect::<CompileResult<Vec<_>>>()?;
                let ret = self.check_call(name, &args, span)?;
                let kind = ExprKind::Call {
                    name: name.clone(),
                    args,
                };
                (kind, ret)
            }
        };
        Ok(Expr::new(kind, span, ty))
    }

    fn check_call(&self, name: &str, args: &[Expr<Typed>], span: Span) -> CompileResult<Type> {
        let sig = self
            .functions
            .get(name)
            .ok_or_else(|| CompileError::type_at(format!("Unknown function {}", name), span))?;
        if sig.params.len() != args.len() {
            return Err(CompileError::type_at(
                format!(
                    "Function {} expects {} arguments; got {}",
                    name,
                    sig.params.len(),
                    args.len()
                ),
                span,
            ));
        }
        for (i, (param, arg)) in sig.params.iter().zip(args).enumerate() {
            if *param != arg.ty() {
                return Err(CompileError::type_at(
                    format!(
                        "Argument {} of {}: expected {}; got {}",
                        i + 1,
                        name,
                        param,
                        arg.ty()
                    ),
                    arg.span,
                ));
            }
        }
        Ok(sig.ret)
    }
}

fn binary_result(op: BinOp, left: Type, right: Type) -> Option<Type> {
    match op {
        _ if op.is_arithmetic() => (left == Type::Int && right == Type::Int).then_some(Type::Int),
        _ if op.is_relational() => (left == Type::Int && right == Type::Int).then_some(Type::Bool),
        BinOp::Eq | BinOp::Ne => (left == right && left != Type::None).then_some(Type::Bool),
        BinOp::Is => (left == Type::None && right == Type::None).then_some(Type::Bool),
        _ => None,
    }
}
