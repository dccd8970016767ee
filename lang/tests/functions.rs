//! User-defined functions, overload resolution and the built-in library.

use assert_matches::assert_matches;

use mathlang::{ErrorKind, Session};

fn eval(session: &mut Session, source: &str) -> Vec<String> {
    let response = session.evaluate(source);
    assert!(
        response.errors.is_empty(),
        "unexpected errors for {source:?}: {:?}",
        response.errors
    );
    response.outputs
}

fn eval_one(session: &mut Session, source: &str) -> String {
    let mut outputs = eval(session, source);
    assert_eq!(outputs.len(), 1, "expected one output for {source:?}");
    outputs.pop().unwrap()
}

#[test]
fn definition_and_call() {
    let mut session = Session::new();
    // A definition prints nothing.
    assert_eq!(eval(&mut session, "f(x) => x*2"), Vec::<String>::new());
    assert_eq!(eval_one(&mut session, "f(3)"), "6");
    assert_eq!(eval_one(&mut session, "f(f(3))"), "12");
}

#[test]
fn equals_also_spells_a_definition() {
    let mut session = Session::new();
    eval(&mut session, "inc(x) = x+1");
    assert_eq!(eval_one(&mut session, "inc(41)"), "42");
}

#[test]
fn parameters_shadow_and_restore_variables() {
    let mut session = Session::new();
    eval(&mut session, "x = 100\nsquare(x) => x*x");
    assert_eq!(eval_one(&mut session, "square(3)"), "9");
    // The outer `x` is untouched by the call.
    assert_eq!(eval_one(&mut session, "x"), "100");
}

#[test]
fn parameters_do_not_leak_out_of_the_call() {
    let mut session = Session::new();
    eval(&mut session, "id(y) => y\nid(5)");
    let response = session.evaluate("y");
    assert_matches!(
        response.errors[0].kind(),
        ErrorKind::UndefinedSymbol(name) if name == "y"
    );
}

#[test]
fn bodies_reference_globals_at_call_time() {
    let mut session = Session::new();
    // `scale` is not defined yet when the body is captured.
    eval(&mut session, "scaled(x) => x*scale");
    eval(&mut session, "scale = 10");
    assert_eq!(eval_one(&mut session, "scaled(4)"), "40");
    eval(&mut session, "scale = 100");
    assert_eq!(eval_one(&mut session, "scaled(4)"), "400");
}

#[test]
fn multi_parameter_functions() {
    let mut session = Session::new();
    eval(&mut session, "hypot2(a, b) => a*a + b*b");
    assert_eq!(eval_one(&mut session, "hypot2(3, 4)"), "25");
}

#[test]
fn zero_parameter_functions() {
    let mut session = Session::new();
    eval(&mut session, "answer() => 42");
    assert_eq!(eval_one(&mut session, "answer()"), "42");
}

#[test]
fn definitions_with_the_same_name_add_overloads() {
    let mut session = Session::new();
    eval(&mut session, "g(x) => x+1\ng(x, y) => x+y");
    assert_eq!(eval_one(&mut session, "g(1)"), "2");
    assert_eq!(eval_one(&mut session, "g(1, 2)"), "3");
}

#[test]
fn first_matching_overload_wins() {
    let mut session = Session::new();
    eval(&mut session, "h(x) => x\nh(x) => x*100");
    // Both overloads match a single argument; the earlier one is chosen.
    assert_eq!(eval_one(&mut session, "h(7)"), "7");
}

#[test]
fn arity_mismatch_is_no_matching_overload() {
    let mut session = Session::new();
    eval(&mut session, "f(x) => x");
    let response = session.evaluate("f(1, 2)");
    assert_matches!(
        response.errors[0].kind(),
        ErrorKind::NoMatchingOverload(name) if name == "f"
    );
}

#[test]
fn functions_apply_to_tensors_too() {
    let mut session = Session::new();
    eval(&mut session, "double(m) => m*2");
    assert_eq!(eval_one(&mut session, "double((1 2 3))"), "(2 4 6)");
    assert_eq!(eval_one(&mut session, "double([1 2,3 4])"), "[2 4 , 6 8]");
}

#[test]
fn builtin_scalar_functions() {
    let mut session = Session::new();
    assert_eq!(eval_one(&mut session, "sqrt(16)"), "4.0");
    assert_eq!(eval_one(&mut session, "max(2, 3)"), "3.0");
    assert_eq!(eval_one(&mut session, "floor(2.7)"), "2.0");
}

#[test]
fn abs_keeps_integers_integral() {
    let mut session = Session::new();
    assert_eq!(eval_one(&mut session, "abs(-3)"), "3");
    assert_eq!(eval_one(&mut session, "abs(-1.5)"), "1.5");
}

#[test]
fn builtin_matrix_functions() {
    let mut session = Session::new();
    assert_eq!(
        eval_one(&mut session, "transpose([1 2 3,4 5 6])"),
        "[1 4 , 2 5 , 3 6]"
    );
    // The identity is its own inverse, exactly representable in floats.
    assert_eq!(
        eval_one(&mut session, "invert([1 0,0 1])"),
        "[1.0 0.0 , 0.0 1.0]"
    );
}

#[test]
fn invert_rejects_non_square_matrices() {
    let mut session = Session::new();
    let response = session.evaluate("invert([1 2 3,4 5 6])");
    assert_matches!(
        response.errors[0].kind(),
        ErrorKind::Semantic(message) if message.contains("square")
    );
}

#[test]
fn nested_definitions_are_rejected() {
    let mut session = Session::new();
    let response = session.evaluate("f(x) => g(y) => y");
    assert_matches!(response.errors[0].kind(), ErrorKind::Semantic(_));
    // `g` must not have been installed by the failed statement.
    let response = session.evaluate("g(1)");
    assert_matches!(
        response.errors[0].kind(),
        ErrorKind::UnknownFunction(name) if name == "g"
    );
}

#[test]
fn calls_captured_in_bodies_resolve_at_call_time() {
    let mut session = Session::new();
    // `helper` does not exist when `outer` is defined; only calling it fails.
    eval(&mut session, "outer(x) => helper(x)+1");
    let response = session.evaluate("outer(1)");
    assert_matches!(
        response.errors[0].kind(),
        ErrorKind::UnknownFunction(name) if name == "helper"
    );

    eval(&mut session, "helper(x) => x*10");
    assert_eq!(eval_one(&mut session, "outer(1)"), "11");
}

#[test]
fn error_inside_a_call_restores_parameter_bindings() {
    let mut session = Session::new();
    eval(&mut session, "x = 1\nbad(x) => x/0");
    let response = session.evaluate("bad(9)");
    assert_matches!(response.errors[0].kind(), ErrorKind::DivisionByZero);
    assert_eq!(eval_one(&mut session, "x"), "1");
}
