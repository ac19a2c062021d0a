//! Syntax builder: walks a concrete syntax tree through a [`TreeCursor`] and
//! produces an unannotated [`Program`].
//!
//! Every helper is entered with the cursor on the node it is responsible for
//! and leaves it on that same node. Descents go through [`with_children`],
//! which returns to the parent whatever happened below.

use crate::ast::{
    BinOp, ElifBranch, Expr, ExprKind, FunDef, Literal, Program, Stmt, StmtKind, Type, TypedVar,
    UnOp, Untyped, VarDef,
};
use crate::cst::{NodeKind, TreeCursor};
use crate::error::{CompileError, CompileResult};
use crate::span::Span;
use crate::{grammar, lexer};

/// Lex, build the concrete tree and then the AST for `src`.
pub fn parse(src: &str) -> CompileResult<Program<Untyped>> {
    let tokens = lexer::lex(src)?;
    let tree = grammar::parse_tree(src, &tokens)?;
    parse_program(src, &mut tree.cursor())
}

/// Build the AST from a cursor positioned on the tree's `Script` node.
pub fn parse_program<C: TreeCursor>(src: &str, cursor: &mut C) -> CompileResult<Program<Untyped>> {
    if cursor.kind() != NodeKind::Script {
        return Err(CompileError::syntax_at(
            format!("Expected a Script node, found {}", cursor.kind()),
            cursor.span(),
        ));
    }
    let builder = Builder { src };
    let scope = if cursor.goto_first_child() {
        let scope = builder.collect_scope(cursor, ScopeKind::Module);
        cursor.goto_parent();
        scope?
    } else {
        Scope::default()
    };

    log::debug!(
        "parsed {} globals, {} functions, {} statements",
        scope.vars.len(),
        scope.funs.len(),
        scope.stmts.len()
    );
    Ok(Program {
        globals: scope.vars,
        functions: scope.funs,
        stmts: scope.stmts,
    })
}

/// Run `f` on the first child of the current node, then return to the node.
fn with_children<C, T, F>(cursor: &mut C, f: F) -> CompileResult<T>
where
    C: TreeCursor,
    F: FnOnce(&mut C) -> CompileResult<T>,
{
    if !cursor.goto_first_child() {
        return Err(CompileError::syntax_at(
            format!("Unexpected empty {} node", cursor.kind()),
            cursor.span(),
        ));
    }
    let result = f(cursor);
    cursor.goto_parent();
    result
}

/// Move to the next sibling or fail with `message` pointing at the current node.
fn next<C: TreeCursor>(cursor: &mut C, message: &str) -> CompileResult<()> {
    if cursor.goto_next_sibling() {
        Ok(())
    } else {
        Err(CompileError::syntax_at(message, cursor.span()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    Module,
    Function,
}

#[derive(Debug, Default)]
struct Scope {
    vars: Vec<VarDef>,
    funs: Vec<FunDef<Untyped>>,
    stmts: Vec<Stmt<Untyped>>,
}

struct Builder<'a> {
    src: &'a str,
}

impl<'a> Builder<'a> {
    fn text(&self, span: Span) -> &'a str {
        span.text(self.src)
    }

    /// Collect a scope's leading declarations followed by its statements.
    /// The cursor is on the first member of the scope.
    fn collect_scope<C: TreeCursor>(&self, c: &mut C, kind: ScopeKind) -> CompileResult<Scope> {
        let mut scope = Scope::default();
        let mut decls_closed = false;
        loop {
            match c.kind() {
                NodeKind::AssignStatement if self.is_declaration(c) => {
                    if decls_closed {
                        return Err(CompileError::syntax_at(
                            "Unexpected variable declaration among statements",
                            c.span(),
                        ));
                    }
                    let var = self.var_def(c)?;
                    log::trace!("declaration {}: {}", var.var.name, var.var.ty);
                    scope.vars.push(var);
                }
                NodeKind::FunctionDefinition => {
                    if kind == ScopeKind::Function {
                        return Err(CompileError::syntax_at(
                            "Nested function definitions are not supported",
                            c.span(),
                        ));
                    }
                    if decls_closed {
                        return Err(CompileError::syntax_at(
                            "Unexpected function declaration among statements",
                            c.span(),
                        ));
                    }
                    let fun = self.fun_def(c)?;
                    log::trace!("function {} with {} params", fun.name, fun.params.len());
                    scope.funs.push(fun);
                }
                _ => {
                    decls_closed = true;
                    scope.stmts.push(self.stmt(c)?);
                }
            }
            if !c.goto_next_sibling() {
                break;
            }
        }
        Ok(scope)
    }

    /// An assignment is a declaration when its second child is a `TypeDef`.
    fn is_declaration<C: TreeCursor>(&self, c: &mut C) -> bool {
        if !c.goto_first_child() {
            return false;
        }
        let typed = if c.goto_next_sibling() {
            let typed = c.kind() == NodeKind::TypeDef;
            c.goto_prev_sibling();
            typed
        } else {
            false
        };
        c.goto_parent();
        typed
    }

    fn var_def<C: TreeCursor>(&self, c: &mut C) -> CompileResult<VarDef> {
        let span = c.span();
        with_children(c, |c| {
            let name_span = c.span();
            if c.kind() != NodeKind::VariableName {
                return Err(CompileError::syntax_at(
                    "Only plain names can be declared",
                    name_span,
                ));
            }
            let name = self.text(name_span).to_string();
            next(c, "Expected a type annotation")?;
            let ty = self.type_annotation(c)?;
            next(c, "Expected '='")?;
            next(c, "Expected an initializer")?;
            let literal = self.literal_initializer(c, &name)?;
            Ok(VarDef {
                var: TypedVar {
                    name,
                    ty,
                    span: name_span,
                },
                literal,
                span,
            })
        })
    }

    /// Cursor on a `TypeDef`; its last child names the type.
    fn type_annotation<C: TreeCursor>(&self, c: &mut C) -> CompileResult<Type> {
        if c.kind() != NodeKind::TypeDef {
            return Err(CompileError::syntax_at("Expected a type annotation", c.span()));
        }
        with_children(c, |c| {
            next(c, "Expected a type name")?;
            let text = self.text(c.span());
            match text {
                "int" => Ok(Type::Int),
                "bool" => Ok(Type::Bool),
                "None" => Ok(Type::None),
                _ => Err(CompileError::syntax_at(
                    format!("Invalid type {}", text),
                    c.span(),
                )),
            }
        })
    }

    fn literal_initializer<C: TreeCursor>(&self, c: &mut C, name: &str) -> CompileResult<Literal> {
        match c.kind() {
            NodeKind::Number | NodeKind::Boolean | NodeKind::None => self.literal(c),
            // `-5` is a negative literal, not an expression.
            NodeKind::UnaryExpression => {
                let span = c.span();
                with_children(c, |c| {
                    let is_minus = self.text(c.span()) == "-";
                    if is_minus && c.goto_next_sibling() && c.kind() == NodeKind::Number {
                        self.number(c.span(), true)
                    } else {
                        Err(CompileError::syntax_at(
                            format!("Expected a literal initializer for {}", name),
                            span,
                        ))
                    }
                })
            }
            _ => Err(CompileError::syntax_at(
                format!("Expected a literal initializer for {}", name),
                c.span(),
            )),
        }
    }

    fn literal<C: TreeCursor>(&self, c: &mut C) -> CompileResult<Literal> {
        let span = c.span();
        match c.kind() {
            NodeKind::Number => self.number(span, false),
            NodeKind::Boolean => match self.text(span) {
                "True" => Ok(Literal::Bool(true)),
                "False" => Ok(Literal::Bool(false)),
                other => Err(CompileError::syntax_at(
                    format!("Invalid boolean literal {}", other),
                    span,
                )),
            },
            NodeKind::None => Ok(Literal::None),
            _ => Err(CompileError::syntax_at(
                format!("Parse error near: {}", self.text(span)),
                span,
            )),
        }
    }

    fn number(&self, span: Span, negative: bool) -> CompileResult<Literal> {
        let digits = self.text(span);
        let magnitude: i64 = digits
            .parse()
            .map_err(|_| CompileError::syntax_at("Integer literal out of range", span))?;
        let value = if negative { -magnitude } else { magnitude };
        i32::try_from(value)
            .map(Literal::Num)
            .map_err(|_| CompileError::syntax_at("Integer literal out of range", span))
    }

    fn fun_def<C: TreeCursor>(&self, c: &mut C) -> CompileResult<FunDef<Untyped>> {
        let span = c.span();
        with_children(c, |c| {
            next(c, "Expected a function name")?;
            let name = self.text(c.span()).to_string();
            next(c, "Expected a parameter list")?;
            let params = self.params(c)?;
            next(c, "Expected a function body")?;
            let ret = if c.kind() == NodeKind::TypeDef {
                let ret = self.type_annotation(c)?;
                next(c, "Expected a function body")?;
                ret
            } else {
                Type::None
            };
            let body = self.body_scope(c)?;
            Ok(FunDef {
                name,
                params,
                ret,
                locals: body.vars,
                body: body.stmts,
                span,
            })
        })
    }

    fn params<C: TreeCursor>(&self, c: &mut C) -> CompileResult<Vec<TypedVar>> {
        if c.kind() != NodeKind::ParamList {
            return Err(CompileError::syntax_at("Expected a parameter list", c.span()));
        }
        with_children(c, |c| {
            let mut params = Vec::new();
            // On "(" now; each round starts on a name, "," or ")".
            next(c, "Unterminated parameter list")?;
            while c.kind() != NodeKind::Punctuation || self.text(c.span()) != ")" {
                if c.kind() == NodeKind::Punctuation && self.text(c.span()) == "," {
                    next(c, "Unterminated parameter list")?;
                    continue;
                }
                let name_span = c.span();
                let name = self.text(name_span).to_string();
                if !c.goto_next_sibling() || c.kind() != NodeKind::TypeDef {
                    return Err(CompileError::syntax_at(
                        format!("Expect type annotation for parameter {}", name),
                        name_span,
                    ));
                }
                let ty = self.type_annotation(c)?;
                params.push(TypedVar {
                    name,
                    ty,
                    span: name_span,
                });
                next(c, "Unterminated parameter list")?;
            }
            Ok(params)
        })
    }

    /// Function body: local declarations then statements.
    fn body_scope<C: TreeCursor>(&self, c: &mut C) -> CompileResult<Scope> {
        self.expect_body(c)?;
        with_children(c, |c| {
            next(c, "Expected an indented block")?;
            self.collect_scope(c, ScopeKind::Function)
        })
    }

    /// Nested block of an `if`/`while`: statements only.
    fn block<C: TreeCursor>(&self, c: &mut C) -> CompileResult<Vec<Stmt<Untyped>>> {
        self.expect_body(c)?;
        with_children(c, |c| {
            next(c, "Expected an indented block")?;
            let mut stmts = Vec::new();
            loop {
                match c.kind() {
                    NodeKind::AssignStatement if self.is_declaration(c) => {
                        return Err(CompileError::syntax_at(
                            "Unexpected variable declaration among statements",
                            c.span(),
                        ));
                    }
                    NodeKind::FunctionDefinition => {
                        return Err(CompileError::syntax_at(
                            "Unexpected function declaration among statements",
                            c.span(),
                        ));
                    }
                    _ => stmts.push(self.stmt(c)?),
                }
                if !c.goto_next_sibling() {
                    break;
                }
            }
            Ok(stmts)
        })
    }

    fn expect_body<C: TreeCursor>(&self, c: &mut C) -> CompileResult<()> {
        if c.kind() == NodeKind::Body {
            Ok(())
        } else {
            Err(CompileError::syntax_at("Expected a block", c.span()))
        }
    }

    fn stmt<C: TreeCursor>(&self, c: &mut C) -> CompileResult<Stmt<Untyped>> {
        let span = c.span();
        let kind = match c.kind() {
            NodeKind::AssignStatement => with_children(c, |c| {
                if c.kind() != NodeKind::VariableName {
                    return Err(CompileError::syntax_at("Invalid assignment target", c.span()));
                }
                let name = self.text(c.span()).to_string();
                next(c, "Expected '='")?;
                next(c, "Expected a value")?;
                let value = self.expr(c)?;
                Ok(StmtKind::Assign { name, value })
            })?,
            NodeKind::ExpressionStatement => {
                with_children(c, |c| Ok(StmtKind::Expr(self.expr(c)?)))?
            }
            NodeKind::PassStatement => StmtKind::Pass,
            NodeKind::ReturnStatement => with_children(c, |c| {
                if c.goto_next_sibling() && !c.span().is_empty() {
                    Ok(StmtKind::Return(Some(self.expr(c)?)))
                } else {
                    Ok(StmtKind::Return(None))
                }
            })?,
            NodeKind::WhileStatement => with_children(c, |c| {
                next(c, "Expected a loop condition")?;
                let cond = self.expr(c)?;
                next(c, "Expected a loop body")?;
                let body = self.block(c)?;
                Ok(StmtKind::While { cond, body })
            })?,
            NodeKind::IfStatement => with_children(c, |c| self.if_stmt(c))?,
            other => {
                return Err(CompileError::syntax_at(
                    format!("Unsupported statement {}", other),
                    span,
                ))
            }
        };
        Ok(Stmt::untyped(kind, span))
    }

    /// Cursor on the `if` keyword of a flat `if … elif … else …` chain.
    fn if_stmt<C: TreeCursor>(&self, c: &mut C) -> CompileResult<StmtKind<Untyped>> {
        next(c, "Expected a condition")?;
        let cond = self.expr(c)?;
        next(c, "Expected a block")?;
        let then = self.block(c)?;
        let mut elifs = Vec::new();
        let mut orelse = None;
        while c.goto_next_sibling() {
            let keyword = self.text(c.span());
            if orelse.is_some() {
                return Err(CompileError::syntax_at(
                    "Mismatched if/elif/else structure",
                    c.span(),
                ));
            }
            match (c.kind(), keyword) {
                (NodeKind::Keyword, "elif") => {
                    next(c, "Expected a condition")?;
                    let cond = self.expr(c)?;
                    next(c, "Expected a block")?;
                    let body = self.block(c)?;
                    elifs.push(ElifBranch { cond, body });
                }
                (NodeKind::Keyword, "else") => {
                    next(c, "Expected a block")?;
                    orelse = Some(self.block(c)?);
                }
                _ => {
                    return Err(CompileError::syntax_at(
                        "Mismatched if/elif/else structure",
                        c.span(),
                    ))
                }
            }
        }
        Ok(StmtKind::If {
            cond,
            then,
            elifs,
            orelse,
        })
    }

    fn expr<C: TreeCursor>(&self, c: &mut C) -> CompileResult<Expr<Untyped>> {
        let span = c.span();
        let kind = match c.kind() {
            NodeKind::Number | NodeKind::Boolean | NodeKind::None => {
                ExprKind::Literal(self.literal(c)?)
            }
            NodeKind::VariableName => ExprKind::Id(self.text(span).to_string()),
            NodeKind::UnaryExpression => with_children(c, |c| {
                let token = self.text(c.span());
                let op = UnOp::from_token(token).ok_or_else(|| {
                    CompileError::syntax_at(format!("Unknown unary operator {}", token), c.span())
                })?;
                next(c, "Expected an operand")?;
                // `-<digits>` is one literal so that i32::MIN is expressible.
                if op == UnOp::Neg && c.kind() == NodeKind::Number {
                    return Ok(ExprKind::Literal(self.number(c.span(), true)?));
                }
                let expr = Box::new(self.expr(c)?);
                Ok(ExprKind::Unary { op, expr })
            })?,
            NodeKind::BinaryExpression => with_children(c, |c| {
                let left = Box::new(self.expr(c)?);
                next(c, "Expected an operator")?;
                let token = self.text(c.span());
                let op = BinOp::from_token(token).ok_or_else(|| {
                    CompileError::syntax_at(format!("Unknown binary operator {}", token), c.span())
                })?;
                next(c, "Expected an operand")?;
                let right = Box::new(self.expr(c)?);
                Ok(ExprKind::Binary { op, left, right })
            })?,
            NodeKind::ParenthesizedExpression => with_children(c, |c| {
                next(c, "Expected an expression")?;
                Ok(ExprKind::Paren(Box::new(self.expr(c)?)))
            })?,
            NodeKind::CallExpression => with_children(c, |c| {
                if c.kind() != NodeKind::VariableName {
                    return Err(CompileError::syntax_at(
                        "Only named functions can be called",
                        c.span(),
                    ));
                }
                let name = self.text(c.span()).to_string();
                next(c, "Expected an argument list")?;
                let args = self.args(c)?;
                Ok(ExprKind::Call { name, args })
            })?,
            _ => {
                return Err(CompileError::syntax_at(
                    format!("Could not parse expression near: {}", self.text(span)),
                    span,
                ))
            }
        };
        Ok(Expr::untyped(kind, span))
    }

    fn args<C: TreeCursor>(&self, c: &mut C) -> CompileResult<Vec<Expr<Untyped>>> {
        if c.kind() != NodeKind::ArgList {
            return Err(CompileError::syntax_at("Expected an argument list", c.span()));
        }
        with_children(c, |c| {
            let mut args = Vec::new();
            next(c, "Unterminated argument list")?;
            while c.kind() != NodeKind::Punctuation || self.text(c.span()) != ")" {
                args.push(self.expr(c)?);
                next(c, "Unterminated argument list")?;
                if c.kind() == NodeKind::Punctuation && self.text(c.span()) == "," {
                    next(c, "Unterminated argument list")?;
                }
            }
            Ok(args)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::{Cursor, SyntaxTree};
    use crate::error::ErrorKind;

    fn ok(src: &str) -> Program<Untyped> {
        parse(src).unwrap_or_else(|e| panic!("{}", e.display(src)))
    }

    fn err(src: &str) -> CompileError {
        let e = parse(src).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Syntax, "{}", e);
        e
    }

    fn strip(e: &Expr<Untyped>) -> String {
        match &e.kind {
            ExprKind::Literal(Literal::Num(n)) => n.to_string(),
            ExprKind::Literal(Literal::Bool(b)) => b.to_string(),
            ExprKind::Literal(Literal::None) => "None".to_string(),
            ExprKind::Id(name) => name.clone(),
            ExprKind::Unary { op, expr } => format!("({} {})", op, strip(expr)),
            ExprKind::Binary { op, left, right } => {
                format!("({} {} {})", strip(left), op, strip(right))
            }
            ExprKind::Paren(inner) => format!("[{}]", strip(inner)),
            ExprKind::Call { name, args } => {
                let args: Vec<_> = args.iter().map(strip).collect();
                format!("{}({})", name, args.join(", "))
            }
        }
    }

    fn expr_of(src: &str) -> String {
        let program = ok(src);
        match &program.stmts[0].kind {
            StmtKind::Expr(e) => strip(e),
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn globals_functions_and_statements() {
        let program = ok("x: int = 5\ny: bool = True\nz: None = None\nprint_int(x)\n");
        assert_eq!(program.globals.len(), 3);
        assert_eq!(program.globals[0].var.name, "x");
        assert_eq!(program.globals[0].literal, Literal::Num(5));
        assert_eq!(program.globals[1].var.ty, Type::Bool);
        assert_eq!(program.globals[2].literal, Literal::None);
        assert_eq!(program.stmts.len(), 1);
    }

    #[test]
    fn negative_initializer() {
        let program = ok("x: int = -2147483648\n");
        assert_eq!(program.globals[0].literal, Literal::Num(i32::MIN));
    }

    #[test]
    fn negative_number_in_expression_is_a_literal() {
        let program = ok("print_int(-2147483648)\n");
        match &program.stmts[0].kind {
            StmtKind::Expr(Expr {
                kind: ExprKind::Call { args, .. },
                ..
            }) => assert_eq!(args[0].kind, ExprKind::Literal(Literal::Num(i32::MIN))),
            other => panic!("expected call, got {:?}", other),
        }
        assert_eq!(expr_of("-x"), "(- x)");
        assert_eq!(expr_of("-(5)"), "(- [5])");
        assert_eq!(err("print_int(-2147483649)\n").message(), "Integer literal out of range");
    }

    #[test]
    fn function_definition() {
        let program = ok("def f(a: int, b: bool) -> int:\n  c: int = 1\n  return a\n");
        let f = &program.functions[0];
        assert_eq!(f.name, "f");
        assert_eq!(
            f.params.iter().map(|p| (p.name.as_str(), p.ty)).collect::<Vec<_>>(),
            vec![("a", Type::Int), ("b", Type::Bool)]
        );
        assert_eq!(f.ret, Type::Int);
        assert_eq!(f.locals.len(), 1);
        assert_eq!(f.body.len(), 1);
    }

    #[test]
    fn return_type_defaults_to_none() {
        let program = ok("def f():\n  pass\n");
        assert_eq!(program.functions[0].ret, Type::None);
        assert!(program.functions[0].params.is_empty());
    }

    #[test]
    fn functions_may_follow_declarations_and_vice_versa() {
        let program = ok("def f():\n  pass\nx: int = 1\ndef g():\n  pass\nf()\n");
        assert_eq!(program.functions.len(), 2);
        assert_eq!(program.globals.len(), 1);
    }

    #[test]
    fn declaration_after_statement() {
        let e = err("x: int = 1\nif True:\n  pass\ny: int = 1\n");
        assert_eq!(e.message(), "Unexpected variable declaration among statements");
    }

    #[test]
    fn plain_assignment_closes_declarations() {
        let e = err("x: int = 1\nx = 2\ny: int = 1\n");
        assert_eq!(e.message(), "Unexpected variable declaration among statements");
    }

    #[test]
    fn function_after_statement() {
        let e = err("print_int(1)\ndef f():\n  pass\n");
        assert_eq!(e.message(), "Unexpected function declaration among statements");
    }

    #[test]
    fn local_declaration_after_statement() {
        let e = err("def f():\n  pass\n  x: int = 1\n");
        assert_eq!(e.message(), "Unexpected variable declaration among statements");
    }

    #[test]
    fn declaration_inside_block() {
        let e = err("while True:\n  x: int = 1\n");
        assert_eq!(e.message(), "Unexpected variable declaration among statements");
    }

    #[test]
    fn nested_function() {
        let e = err("def f():\n  def g():\n    pass\n  pass\n");
        assert_eq!(e.message(), "Nested function definitions are not supported");
    }

    #[test]
    fn missing_parameter_annotation() {
        let e = err("def f(a: int, b):\n  pass\n");
        assert_eq!(e.message(), "Expect type annotation for parameter b");
        assert_eq!(e.span(), Some(Span::new(14, 15)));
    }

    #[test]
    fn invalid_type() {
        let e = err("x: str = 1\n");
        assert_eq!(e.message(), "Invalid type str");
    }

    #[test]
    fn non_literal_initializer() {
        let e = err("x: int = 1 + 2\n");
        assert_eq!(e.message(), "Expected a literal initializer for x");
    }

    #[test]
    fn literal_out_of_range() {
        let e = err("x: int = 2147483648\n");
        assert_eq!(e.message(), "Integer literal out of range");
    }

    #[test]
    fn if_elif_else_chain() {
        let program = ok("if a:\n  pass\nelif b:\n  pass\nelif c:\n  pass\nelse:\n  pass\n");
        match &program.stmts[0].kind {
            StmtKind::If {
                cond,
                then,
                elifs,
                orelse,
            } => {
                assert_eq!(strip(cond), "a");
                assert_eq!(then.len(), 1);
                assert_eq!(elifs.len(), 2);
                assert_eq!(strip(&elifs[1].cond), "c");
                assert!(orelse.is_some());
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn while_and_return() {
        let program = ok("def f() -> int:\n  while x:\n    return 1\n  return\n");
        let body = &program.functions[0].body;
        assert!(matches!(&body[0].kind, StmtKind::While { body, .. } if body.len() == 1));
        assert!(matches!(&body[1].kind, StmtKind::Return(None)));
    }

    #[test]
    fn expressions() {
        assert_eq!(expr_of("1 + 2 * 3"), "(1 + (2 * 3))");
        assert_eq!(expr_of("(1 + 2) // 3 % 4"), "(([(1 + 2)] // 3) % 4)");
        assert_eq!(expr_of("not a == -b"), "(not (a == (- b)))");
        assert_eq!(expr_of("x is None"), "(x is None)");
        assert_eq!(expr_of("f(g(), 1, True)"), "f(g(), 1, true)");
    }

    #[test]
    fn unknown_operators() {
        assert_eq!(err("a and b\n").message(), "Unknown binary operator and");
        assert_eq!(err("a / b\n").message(), "Unknown binary operator /");
        assert_eq!(err("+a\n").message(), "Unknown unary operator +");
    }

    #[test]
    fn call_on_non_name() {
        assert_eq!(err("(f)(1)\n").message(), "Only named functions can be called");
    }

    #[test]
    fn invalid_assignment_target() {
        assert_eq!(err("f() = 1\n").message(), "Invalid assignment target");
    }

    #[test]
    fn cursor_is_restored() {
        let src = "x: int = 1\ndef f(a: int) -> int:\n  return a\nprint_int(f(x))\n";
        let tokens = lexer::lex(src).unwrap();
        let tree: SyntaxTree = grammar::parse_tree(src, &tokens).unwrap();
        let mut cursor: Cursor<'_> = tree.cursor();
        parse_program(src, &mut cursor).unwrap();
        assert_eq!(cursor.node(), tree.root());
    }

    #[test]
    fn empty_program() {
        let program = ok("");
        assert!(program.globals.is_empty());
        assert!(program.functions.is_empty());
        assert!(program.stmts.is_empty());
    }
}
