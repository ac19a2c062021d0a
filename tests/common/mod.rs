//! Shared helpers for the compiler integration tests.
//!
//! ```ignore
//! mod common;
//! use common::*;
//! ```

#[allow(unused_imports)]
pub use pywat::{compile, CompileError, ErrorKind};

use wasmi::{Caller, Engine, Linker, Module, Store};

#[ctor::ctor]
fn init() {
    env_logger::init();
}

/// Compile `src`, panicking with the rendered diagnostic on failure.
#[allow(dead_code)]
pub fn compile_ok(src: &str) -> String {
    compile(src).unwrap_or_else(|e| panic!("{}", e.display(src)))
}

/// Compile `src` and return the error, panicking if it compiled.
#[allow(dead_code)]
pub fn compile_err(src: &str) -> CompileError {
    match compile(src) {
        Ok(wat) => panic!("expected an error, got:\n{}", wat),
        Err(e) => e,
    }
}

/// The instructions of a module, one per line, without indentation.
#[allow(dead_code)]
pub fn instructions(wat: &str) -> Vec<&str> {
    wat.lines().map(str::trim).collect()
}

/// Whether `seq` occurs as consecutive instructions of `wat`.
#[allow(dead_code)]
pub fn contains_seq(wat: &str, seq: &[&str]) -> bool {
    instructions(wat).windows(seq.len()).any(|w| w == seq)
}

/// Assemble a WAT module into a binary, panicking if it is invalid text.
#[allow(dead_code)]
pub fn assemble(wat: &str) -> Vec<u8> {
    wat::parse_str(wat).unwrap_or_else(|e| panic!("{}\n{}", e, wat))
}

/// Compile `src`, run `_start` and return everything the program printed.
/// `print_bool` renders its argument the way Python would.
#[allow(dead_code)]
pub fn run(src: &str) -> Vec<String> {
    let wat = compile_ok(src);
    let binary = assemble(&wat);

    let engine = Engine::default();
    let module =
        Module::new(&engine, &binary[..]).unwrap_or_else(|e| panic!("{}\n{}", e, wat));
    let mut store = Store::new(&engine, Vec::<String>::new());
    let mut linker = <Linker<Vec<String>>>::new(&engine);
    linker
        .func_wrap(
            "imports",
            "print_int",
            |mut caller: Caller<'_, Vec<String>>, value: i32| {
                caller.data_mut().push(value.to_string());
            },
        )
        .unwrap();
    linker
        .func_wrap(
            "imports",
            "print_bool",
            |mut caller: Caller<'_, Vec<String>>, value: i32| {
                let text = if value != 0 { "True" } else { "False" };
                caller.data_mut().push(text.to_string());
            },
        )
        .unwrap();

    let pre = linker
        .instantiate(&mut store, &module)
        .unwrap_or_else(|e| panic!("{}\n{}", e, wat));
    let instance = pre
        .start(&mut store)
        .unwrap_or_else(|e| panic!("{}\n{}", e, wat));
    let start = instance
        .get_typed_func::<(), ()>(&store, "_start")
        .unwrap();
    start
        .call(&mut store, ())
        .unwrap_or_else(|e| panic!("{}\n{}", e, wat));
    store.into_data()
}
