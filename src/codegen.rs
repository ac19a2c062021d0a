use crate::ast::{
    BinOp, ElifBranch, Expr, ExprKind, Flow, FunDef, Literal, Program, Stmt, StmtKind, Type,
    Typed, UnOp,
};
use crate::error::{CompileError, CompileResult};
use crate::typecheck::BUILTINS;
use std::collections::HashSet;

/// Slot that swallows the value of an expression statement.
const SCRATCH: &str = "$.scratch";

/// Lower a checked program to a WebAssembly text module.
pub fn generate(program: &Program<Typed>) -> CompileResult<String> {
    let mut gen = CodeGen::new();
    gen.gen_module(program)?;
    log::debug!(
        "generated {} bytes of WAT, {} loop labels",
        gen.out.len(),
        gen.label_count
    );
    Ok(gen.out)
}

/// Name resolution for the function being emitted.
struct Frame<'a> {
    locals: HashSet<&'a str>,
    in_function: bool,
    has_result: bool,
}

impl<'a> Frame<'a> {
    fn entry() -> Self {
        Frame {
            locals: HashSet::new(),
            in_function: false,
            has_result: false,
        }
    }

    fn function(func: &'a FunDef<Typed>) -> Self {
        let locals = func
            .params
            .iter()
            .map(|p| p.name.as_str())
            .chain(func.locals.iter().map(|l| l.var.name.as_str()))
            .collect();
        Frame {
            locals,
            in_function: true,
            has_result: func.ret != Type::None,
        }
    }

    fn get(&self, name: &str) -> String {
        if self.locals.contains(name) {
            format!("local.get ${}", name)
        } else {
            format!("global.get ${}", name)
        }
    }

    fn set(&self, name: &str) -> String {
        if self.locals.contains(name) {
            format!("local.set ${}", name)
        } else {
            format!("global.set ${}", name)
        }
    }
}

/// Generator context for one compilation.
struct CodeGen {
    out: String,
    depth: usize,
    label_count: usize,
}

impl CodeGen {
    fn new() -> Self {
        CodeGen {
            out: String::new(),
            depth: 0,
            label_count: 0,
        }
    }

    fn new_label(&mut self) -> String {
        self.label_count += 1;
        let label = format!("$loop_{}", self.label_count);
        log::trace!("allocated loop label {}", label);
        label
    }

    fn emit(&mut self, line: impl AsRef<str>) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
        self.out.push_str(line.as_ref());
        self.out.push('\n');
    }

    fn open(&mut self, header: impl AsRef<str>) {
        self.emit(header);
        self.depth += 1;
    }

    fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.emit(")");
    }

    fn gen_module(&mut self, program: &Program<Typed>) -> CompileResult<()> {
        self.open("(module");
        for (name, _) in BUILTINS {
            self.emit(format!(
                "(func ${} (import \"imports\" \"{}\") (param i32))",
                name, name
            ));
        }
        for global in &program.globals {
            self.emit(format!(
                "(global ${} (mut i32) (i32.const {}))",
                global.var.name,
                global.literal.encode()
            ));
        }
        for func in &program.functions {
            self.gen_function(func)?;
        }

        self.open("(func (export \"_start\")");
        self.emit(format!("(local {} i32)", SCRATCH));
        self.gen_block(&program.stmts, &Frame::entry(), false)?;
        self.close();
        self.close();
        Ok(())
    }

    fn gen_function(&mut self, func: &FunDef<Typed>) -> CompileResult<()> {
        let frame = Frame::function(func);
        let mut header = format!("(func ${}", func.name);
        for param in &func.params {
            header.push_str(&format!(" (param ${} i32)", param.name));
        }
        if frame.has_result {
            if !func
                .body
                .last()
                .is_some_and(|s| s.flow() == Flow::Returns(func.ret))
            {
                return Err(CompileError::internal(format!(
                    "function {} can fall off its end",
                    func.name
                )));
            }
            header.push_str(" (result i32)");
        }

        self.open(header);
        for local in &func.locals {
            self.emit(format!("(local ${} i32)", local.var.name));
        }
        self.emit(format!("(local {} i32)", SCRATCH));
        for local in &func.locals {
            self.emit(format!("i32.const {}", local.literal.encode()));
            self.emit(format!("local.set ${}", local.var.name));
        }
        self.gen_block(&func.body, &frame, frame.has_result)?;
        self.close();
        Ok(())
    }

    /// `tail` marks a block whose last statement produces the function result.
    fn gen_block(&mut self, stmts: &[Stmt<Typed>], frame: &Frame, tail: bool) -> CompileResult<()> {
        let last = stmts.len().saturating_sub(1);
        for (i, stmt) in stmts.iter().enumerate() {
            self.gen_stmt(stmt, frame, tail && i == last)?;
        }
        Ok(())
    }

    fn gen_stmt(&mut self, stmt: &Stmt<Typed>, frame: &Frame, tail: bool) -> CompileResult<()> {
        match &stmt.kind {
            StmtKind::Assign { name, value } => {
                self.gen_expr(value, frame)?;
                self.emit(frame.set(name));
            }
            StmtKind::Expr(expr) => match &expr.kind {
                ExprKind::Call { name, args } if expr.ty() == Type::None => {
                    self.gen_call(name, args, frame)?;
                }
                _ => {
                    self.gen_expr(expr, frame)?;
                    self.emit(format!("local.set {}", SCRATCH));
                }
            },
            StmtKind::If {
                cond,
                then,
                elifs,
                orelse,
            } => {
                let result = tail && matches!(stmt.flow(), Flow::Returns(ty) if ty != Type::None);
                self.gen_if(cond, then, elifs, orelse.as_deref(), frame, result)?;
            }
            StmtKind::While { cond, body } => {
                let label = self.new_label();
                self.gen_expr(cond, frame)?;
                self.open("(if");
                self.open("(then");
                self.open(format!("(loop {}", label));
                self.gen_block(body, frame, false)?;
                self.gen_expr(cond, frame)?;
                self.emit(format!("br_if {}", label));
                self.close();
                self.close();
                self.close();
            }
            StmtKind::Pass => self.emit("nop"),
            StmtKind::Return(value) => {
                if !frame.in_function {
                    return Err(CompileError::internal("return outside of a function"));
                }
                match value {
                    Some(expr) => {
                        self.gen_expr(expr, frame)?;
                        if !frame.has_result {
                            self.emit("drop");
                        }
                    }
                    None if frame.has_result => {
                        return Err(CompileError::internal(
                            "bare return in a function with a result",
                        ))
                    }
                    None => {}
                }
                self.emit("return");
            }
        }
        Ok(())
    }

    /// Elif branches become an `if` nested in the else arm of the previous one.
    fn gen_if(
        &mut self,
        cond: &Expr<Typed>,
        then: &[Stmt<Typed>],
        elifs: &[ElifBranch<Typed>],
        orelse: Option<&[Stmt<Typed>]>,
        frame: &Frame,
        result: bool,
    ) -> CompileResult<()> {
        if result && orelse.is_none() {
            return Err(CompileError::internal(
                "value-producing conditional without an else arm",
            ));
        }
        self.gen_expr(cond, frame)?;
        self.open(if result { "(if (result i32)" } else { "(if" });
        self.open("(then");
        self.gen_block(then, frame, result)?;
        self.close();
        match elifs.split_first() {
            Some((elif, rest)) => {
                self.open("(else");
                self.gen_if(&elif.cond, &elif.body, rest, orelse, frame, result)?;
                self.close();
            }
            None => {
                if let Some(orelse) = orelse {
                    self.open("(else");
                    self.gen_block(orelse, frame, result)?;
                    self.close();
                }
            }
        }
        self.close();
        Ok(())
    }

    fn gen_expr(&mut self, expr: &Expr<Typed>, frame: &Frame) -> CompileResult<()> {
        match &expr.kind {
            ExprKind::Literal(lit) => self.emit(format!("i32.const {}", lit.encode())),
            ExprKind::Id(name) => self.emit(frame.get(name)),
            ExprKind::Unary { op, expr } => {
                // Both are `k - e`: negation with k = 0, boolean not with k = 1.
                let k = match op {
                    UnOp::Neg => 0,
                    UnOp::Not => 1,
                };
                self.emit(format!("i32.const {}", k));
                self.gen_expr(expr, frame)?;
                self.emit("i32.sub");
            }
            ExprKind::Binary { op, left, right } => {
                self.gen_expr(left, frame)?;
                self.gen_expr(right, frame)?;
                self.emit(binop_instr(*op));
            }
            ExprKind::Paren(inner) => self.gen_expr(inner, frame)?,
            ExprKind::Call { name, args } => {
                self.gen_call(name, args, frame)?;
                if expr.ty() == Type::None {
                    self.emit(format!("i32.const {}", Literal::None.encode()));
                }
            }
        }
        Ok(())
    }

    fn gen_call(&mut self, name: &str, args: &[Expr<Typed>], frame: &Frame) -> CompileResult<()> {
        for arg in args {
            self.gen_expr(arg, frame)?;
        }
        self.emit(format!("call ${}", name));
        Ok(())
    }
}

fn binop_instr(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "i32.add",
        BinOp::Sub => "i32.sub",
        BinOp::Mul => "i32.mul",
        BinOp::Div => "i32.div_s",
        BinOp::Rem => "i32.rem_s",
        BinOp::Eq | BinOp::Is => "i32.eq",
        BinOp::Ne => "i32.ne",
        BinOp::Le => "i32.le_s",
        BinOp::Ge => "i32.ge_s",
        BinOp::Lt => "i32.lt_s",
        BinOp::Gt => "i32.gt_s",
    }
}
