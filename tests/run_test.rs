//! Compiled modules assemble, instantiate and print what the source says.

mod common;

use common::*;

#[test]
fn prints_a_global() {
    assert_eq!(run("x:int = 5\nprint_int(x)"), ["5"]);
}

#[test]
fn calls_a_function() {
    assert_eq!(
        run("def f(a:int, b:int)->int:\n  return a + b\nprint_int(f(2,3))"),
        ["5"]
    );
}

#[test]
fn takes_the_true_arm() {
    assert_eq!(
        run("x:bool = True\nif x:\n  print_bool(True)\nelse:\n  print_bool(False)"),
        ["True"]
    );
}

#[test]
fn counts_in_a_loop() {
    assert_eq!(
        run("i:int = 0\nwhile i < 3:\n  print_int(i)\n  i = i + 1"),
        ["0", "1", "2"]
    );
}

#[test]
fn loop_that_never_runs() {
    assert!(run("i: int = 5\nwhile i < 3:\n  print_int(i)\n").is_empty());
}

#[test]
fn tail_if_elif_else_produces_the_result() {
    let src = "\
def sign(x: int) -> int:
  if x < 0:
    return -1
  elif x == 0:
    return 0
  else:
    return 1
print_int(sign(-5))
print_int(sign(0))
print_int(sign(7))
";
    assert_eq!(run(src), ["-1", "0", "1"]);
}

#[test]
fn nested_tail_conditionals() {
    let src = "\
def pick(a: bool, b: bool) -> int:
  if a:
    if b:
      return 1
    else:
      return 2
  else:
    return 3
print_int(pick(True, True))
print_int(pick(True, False))
print_int(pick(False, True))
";
    assert_eq!(run(src), ["1", "2", "3"]);
}

#[test]
fn elif_chain_as_statement() {
    let src = "\
def classify(n: int):
  if n < 0:
    print_int(-1)
  elif n == 0:
    print_int(0)
  elif n < 10:
    print_int(1)
  else:
    print_int(2)
classify(-3)
classify(0)
classify(5)
classify(50)
";
    assert_eq!(run(src), ["-1", "0", "1", "2"]);
}

#[test]
fn return_from_inside_a_loop() {
    let src = "\
def first_square_over(limit: int) -> int:
  i: int = 0
  while i < 1000:
    if i * i > limit:
      return i
    i = i + 1
  return 0
print_int(first_square_over(50))
print_int(first_square_over(2000000))
";
    assert_eq!(run(src), ["8", "0"]);
}

#[test]
fn nested_loops() {
    let src = "\
i: int = 0
j: int = 0
total: int = 0
while i < 3:
  j = 0
  while j < i:
    total = total + 1
    j = j + 1
  i = i + 1
print_int(total)
";
    assert_eq!(run(src), ["3"]);
}

#[test]
fn none_call_compares_to_none() {
    let src = "\
def g():
  pass
def h():
  return None
print_bool(g() is None)
print_bool(h() is None)
";
    assert_eq!(run(src), ["True", "True"]);
}

#[test]
fn early_bare_return() {
    let src = "\
def h(x: int):
  if x > 0:
    print_int(x)
    return
  print_int(0 - x)
h(3)
h(-4)
1 + 2
";
    assert_eq!(run(src), ["3", "4"]);
}

#[test]
fn recursion() {
    let src = "\
def fact(n: int) -> int:
  if n <= 1:
    return 1
  else:
    return n * fact(n - 1)
def fib(n: int) -> int:
  if n < 2:
    return n
  return fib(n - 1) + fib(n - 2)
print_int(fact(5))
print_int(fib(10))
";
    assert_eq!(run(src), ["120", "55"]);
}

#[test]
fn locals_shadow_globals_at_runtime() {
    let src = "\
g: int = 1
def f() -> int:
  g: int = 10
  g = g + 1
  return g
print_int(f())
print_int(g)
g = g + 5
print_int(g)
";
    assert_eq!(run(src), ["11", "1", "6"]);
}

#[test]
fn arithmetic_and_logic() {
    let src = "\
print_int(7 // 2)
print_int(7 % 3)
print_int(-(3) * 4)
print_bool(not (1 == 2))
print_bool(3 != 3)
print_bool(2 >= 2)
";
    assert_eq!(run(src), ["3", "1", "-12", "True", "False", "True"]);
}

#[test]
fn smallest_int() {
    assert_eq!(
        run("m: int = -2147483648\nprint_int(m)\nprint_int(-2147483648)\n"),
        ["-2147483648", "-2147483648"]
    );
}
