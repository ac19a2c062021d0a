//! Property-based tests over generated programs.
//!
//! - Compilation is deterministic
//! - Every global lands in the module with its encoded initial value
//! - Declarations after a statement are rejected
//! - Reading a global in a function is legal, assigning it needs a local
//! - Each `while` gets its own loop label

mod common;

use common::*;
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

#[derive(Debug, Clone)]
enum Init {
    Int(i32),
    Bool(bool),
}

impl Init {
    fn source(&self) -> (String, &'static str) {
        match self {
            Init::Int(v) => (v.to_string(), "int"),
            Init::Bool(true) => ("True".to_string(), "bool"),
            Init::Bool(false) => ("False".to_string(), "bool"),
        }
    }

    fn encoded(&self) -> i32 {
        match self {
            Init::Int(v) => *v,
            Init::Bool(b) => i32::from(*b),
        }
    }
}

fn arb_init() -> impl Strategy<Value = Init> {
    prop_oneof![any::<i32>().prop_map(Init::Int), any::<bool>().prop_map(Init::Bool)]
}

/// Integer expressions over the int globals `n0..n{globals}`.
fn arb_int_expr(globals: usize) -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        (0i32..100).prop_map(|n| n.to_string()),
        (0..globals.max(1)).prop_map(|i| format!("n{}", i)),
    ];
    leaf.prop_recursive(3, 16, 2, |inner| {
        prop_oneof![
            (inner.clone(), prop::sample::select(vec!["+", "-", "*", "//", "%"]), inner.clone())
                .prop_map(|(l, op, r)| format!("{} {} {}", l, op, r)),
            inner.clone().prop_map(|e| format!("-({})", e)),
            inner.prop_map(|e| format!("({})", e)),
        ]
    })
}

fn declarations(inits: &[Init]) -> String {
    inits
        .iter()
        .enumerate()
        .map(|(i, init)| {
            let (value, ty) = init.source();
            format!("v{}: {} = {}\n", i, ty, value)
        })
        .collect()
}

fn int_globals(count: usize) -> String {
    (0..count)
        .map(|i| format!("n{}: int = {}\n", i, i))
        .collect()
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn compilation_is_deterministic(expr in arb_int_expr(3), loops in 0usize..4) {
        let mut src = int_globals(3);
        src.push_str(&format!("def f(a: int) -> int:\n  return a + {}\n", expr));
        for _ in 0..loops {
            src.push_str("while n0 < 3:\n  n0 = n0 + 1\n");
        }
        src.push_str(&format!("print_int(f({}))\n", expr));
        let first = compile_ok(&src);
        assemble(&first);
        prop_assert_eq!(first, compile_ok(&src));
    }

    #[test]
    fn globals_keep_their_values(inits in prop::collection::vec(arb_init(), 1..8)) {
        let wat = compile_ok(&declarations(&inits));
        for (i, init) in inits.iter().enumerate() {
            let expected = format!("(global $v{} (mut i32) (i32.const {}))", i, init.encoded());
            prop_assert!(wat.contains(&expected), "missing {}", expected);
        }
    }

    #[test]
    fn declaration_after_statement_is_rejected(
        before in prop::collection::vec(arb_init(), 0..4),
        stmts in 1usize..4,
        late in arb_init(),
    ) {
        let mut src = declarations(&before);
        for _ in 0..stmts {
            src.push_str("pass\n");
        }
        let (value, ty) = late.source();
        src.push_str(&format!("late: {} = {}\n", ty, value));
        let err = compile_err(&src);
        prop_assert_eq!(err.kind(), ErrorKind::Syntax);
    }

    #[test]
    fn globals_need_a_local_to_be_assigned(init in arb_init(), shadow in any::<bool>()) {
        let (value, ty) = init.source();
        let mut src = format!("g: {} = {}\ndef f():\n", ty, value);
        if shadow {
            src.push_str(&format!("  g: {} = {}\n", ty, value));
        }
        src.push_str(&format!("  g = {}\n", value));
        match compile(&src) {
            Ok(wat) => {
                prop_assert!(shadow);
                prop_assert!(wat.contains("local.set $g"));
            }
            Err(err) => {
                prop_assert!(!shadow);
                prop_assert_eq!(err.kind(), ErrorKind::Type);
            }
        }
    }

    #[test]
    fn each_loop_gets_a_fresh_label(loops in 1usize..6) {
        let mut src = String::from("i: int = 0\n");
        for _ in 0..loops {
            src.push_str("while i < 1:\n  i = i + 1\n");
        }
        let wat = compile_ok(&src);
        for n in 1..=loops {
            let label = format!("(loop $loop_{}", n);
            prop_assert_eq!(wat.matches(&label).count(), 1);
        }
        let next = format!("$loop_{}", loops + 1);
        prop_assert!(!wat.contains(&next));
    }
}
