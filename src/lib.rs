//! Ahead-of-time compiler from a statically typed Python subset to
//! WebAssembly text.
//!
//! The pipeline is source → concrete syntax tree → AST → typed AST → WAT.
//! [`compile`] runs all of it with the bundled front end; [`compile_tree`]
//! starts from any tree exposed through [`cst::TreeCursor`].

pub mod ast;
pub mod codegen;
pub mod cst;
pub mod error;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod typecheck;

pub use error::{CompileError, CompileResult, ErrorKind};

use cst::TreeCursor;

/// Compile one source string to a WAT module.
pub fn compile(src: &str) -> CompileResult<String> {
    let tokens = lexer::lex(src)?;
    let tree = grammar::parse_tree(src, &tokens)?;
    log::debug!("built syntax tree with {} nodes", tree.len());
    compile_tree(src, &mut tree.cursor())
}

/// Compile from a tree built by another grammar engine. The cursor must
/// start at the root `Script` node; spans index into `src`.
pub fn compile_tree<C: TreeCursor>(src: &str, cursor: &mut C) -> CompileResult<String> {
    let ast = parser::parse_program(src, cursor)?;
    let typed = typecheck::typecheck(&ast)?;
    codegen::generate(&typed)
}
