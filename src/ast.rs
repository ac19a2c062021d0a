use crate::span::Span;
use std::fmt;
use std::fmt::Debug;

/// Annotation slots carried by a tree in a given pipeline phase.
pub trait Phase: Debug + Clone + PartialEq {
    type Expr: Debug + Clone + PartialEq;
    type Stmt: Debug + Clone + PartialEq;
}

/// Output of the syntax builder: nothing is annotated yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Untyped;

/// Output of the type checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Typed;

impl Phase for Untyped {
    type Expr = ();
    type Stmt = ();
}

impl Phase for Typed {
    type Expr = Type;
    type Stmt = Flow;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Bool,
    None,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Bool => write!(f, "bool"),
            Type::None => write!(f, "None"),
        }
    }
}

/// Whether control can fall off the end of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    FallsThrough,
    /// Every path through the statement returns a value of this type.
    Returns(Type),
}

impl Flow {
    pub fn returns(self) -> Option<Type> {
        match self {
            Flow::Returns(ty) => Some(ty),
            Flow::FallsThrough => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program<P: Phase> {
    pub globals: Vec<VarDef>,
    pub functions: Vec<FunDef<P>>,
    pub stmts: Vec<Stmt<P>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedVar {
    pub name: String,
    pub ty: Type,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDef {
    pub var: TypedVar,
    pub literal: Literal,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    Num(i32),
    Bool(bool),
    None,
}

impl Literal {
    pub fn ty(&self) -> Type {
        match self {
            Literal::Num(_) => Type::Int,
            Literal::Bool(_) => Type::Bool,
            Literal::None => Type::None,
        }
    }

    /// The machine word this literal is represented by at runtime.
    pub fn encode(&self) -> i32 {
        match self {
            Literal::Num(value) => *value,
            Literal::Bool(true) => 1,
            Literal::Bool(false) => 0,
            Literal::None => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunDef<P: Phase> {
    pub name: String,
    pub params: Vec<TypedVar>,
    pub ret: Type,
    pub locals: Vec<VarDef>,
    pub body: Vec<Stmt<P>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt<P: Phase> {
    pub kind: StmtKind<P>,
    pub span: Span,
    pub a: P::Stmt,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind<P: Phase> {
    Assign {
        name: String,
        value: Expr<P>,
    },
    Expr(Expr<P>),
    If {
        cond: Expr<P>,
        then: Vec<Stmt<P>>,
        elifs: Vec<ElifBranch<P>>,
        orelse: Option<Vec<Stmt<P>>>,
    },
    While {
        cond: Expr<P>,
        body: Vec<Stmt<P>>,
    },
    Pass,
    Return(Option<Expr<P>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElifBranch<P: Phase> {
    pub cond: Expr<P>,
    pub body: Vec<Stmt<P>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr<P: Phase> {
    pub kind: ExprKind<P>,
    pub span: Span,
    pub a: P::Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind<P: Phase> {
    Literal(Literal),
    Id(String),
    Unary {
        op: UnOp,
        expr: Box<Expr<P>>,
    },
    Binary {
        op: BinOp,
        left: Box<Expr<P>>,
        right: Box<Expr<P>>,
    },
    Paren(Box<Expr<P>>),
    Call {
        name: String,
        args: Vec<Expr<P>>,
    },
}

impl<P: Phase> Expr<P> {
    pub fn new(kind: ExprKind<P>, span: Span, a: P::Expr) -> Self {
        Expr { kind, span, a }
    }
}

impl<P: Phase> Stmt<P> {
    pub fn new(kind: StmtKind<P>, span: Span, a: P::Stmt) -> Self {
        Stmt { kind, span, a }
    }
}

impl Expr<Untyped> {
    pub fn untyped(kind: ExprKind<Untyped>, span: Span) -> Self {
        Expr::new(kind, span, ())
    }
}

impl Stmt<Untyped> {
    pub fn untyped(kind: StmtKind<Untyped>, span: Span) -> Self {
        Stmt::new(kind, span, ())
    }
}

impl Expr<Typed> {
    pub fn ty(&self) -> Type {
        self.a
    }
}

impl Stmt<Typed> {
    pub fn flow(&self) -> Flow {
        self.a
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UnOp {
    Not,
    Neg,
}

impl UnOp {
    pub fn from_token(token: &str) -> Option<UnOp> {
        match token {
            "not" => Some(UnOp::Not),
            "-" => Some(UnOp::Neg),
            _ => None,
        }
    }
}

impl fmt::Display for UnOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnOp::Not => write!(f, "not"),
            UnOp::Neg => write!(f, "-"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Le,
    Ge,
    Lt,
    Gt,
    Is,
}

const BINOP_TOKENS: [(&str, BinOp); 12] = [
    ("+", BinOp::Add),
    ("-", BinOp::Sub),
    ("*", BinOp::Mul),
    ("//", BinOp::Div),
    ("%", BinOp::Rem),
    ("==", BinOp::Eq),
    ("!=", BinOp::Ne),
    ("<=", BinOp::Le),
    (">=", BinOp::Ge),
    ("<", BinOp::Lt),
    (">", BinOp::Gt),
    ("is", BinOp::Is),
];

impl BinOp {
    pub fn from_token(token: &str) -> Option<BinOp> {
        BINOP_TOKENS
            .iter()
            .find(|(text, _)| *text == token)
            .map(|(_, op)| *op)
    }

    pub fn token(&self) -> &'static str {
        BINOP_TOKENS
            .iter()
            .find(|(_, op)| op == self)
            .map(|(text, _)| *text)
            .unwrap_or("?")
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem
        )
    }

    pub fn is_relational(&self) -> bool {
        matches!(self, BinOp::Le | BinOp::Ge | BinOp::Lt | BinOp::Gt)
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
