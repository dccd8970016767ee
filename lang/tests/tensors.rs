//! Vector and matrix sessions: literals, elementwise arithmetic, cross and
//! dot products, broadcasting and matrix powers.

use assert_matches::assert_matches;

use mathlang::{ErrorKind, Op, Session};

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

fn vector_session() -> Session {
    let mut session = Session::new();
    eval(&mut session, "a = 2\nu = (1 2 1)\nv = (2 2 3)");
    session
}

fn matrix_session() -> Session {
    let mut session = Session::new();
    eval(
        &mut session,
        "k = 2\na = [1 2 3,3 2 1,4 5 6]\nb = [3 2 1,1 0 1,1 2 3]",
    );
    session
}

#[test]
fn vector_literals_echo_their_elements() {
    let mut session = Session::new();
    assert_eq!(eval_one(&mut session, "(1 2 1)"), "(1 2 1)");
    assert_eq!(eval_one(&mut session, "(1.5 2.5)"), "(1.5 2.5)");
}

#[test]
fn literal_elements_coerce_to_the_first_element_kind() {
    let mut session = Session::new();
    // An integer first element truncates later fractional elements.
    assert_eq!(eval_one(&mut session, "(1 2.5 3)"), "(1 2 3)");
    assert_eq!(eval_one(&mut session, "[1 2.5, 3.9 4]"), "[1 2 , 3 4]");
    // A float first element widens later integer and decimal elements.
    assert_eq!(
        eval_one(&mut session, "(0.5 2 0.123456789)"),
        "(0.5 2.0 0.123456789)"
    );
}

#[test]
fn vector_scalar_broadcast() {
    let mut session = vector_session();
    assert_eq!(eval_one(&mut session, "a*u"), "(2 4 2)");
    assert_eq!(eval_one(&mut session, "u*a"), "(2 4 2)");
    // Integer elements divide with truncation.
    assert_eq!(eval_one(&mut session, "u/a"), "(0 1 0)");
}

#[test]
fn vector_negation_and_sums() {
    let mut session = vector_session();
    assert_eq!(eval_one(&mut session, "-u"), "(-1 -2 -1)");
    assert_eq!(eval_one(&mut session, "u+v"), "(3 4 4)");
    assert_eq!(eval_one(&mut session, "u-v"), "(-1 0 -2)");
}

#[test]
fn star_between_vectors_is_the_cross_product() {
    let mut session = vector_session();
    assert_eq!(eval_one(&mut session, "u*v"), "(4 -1 -2)");
}

#[test]
fn dot_between_vectors_is_the_scalar_product() {
    let mut session = vector_session();
    assert_eq!(eval_one(&mut session, "u.v"), "9");
}

#[test]
fn mismatched_vector_dimensions_are_rejected() {
    let mut session = vector_session();
    let response = session.evaluate("u + (1 2)");
    assert_matches!(
        response.errors[0].kind(),
        ErrorKind::DimensionMismatch {
            op: Op::Add,
            ..
        }
    );

    let response = session.evaluate("u * (1 2)");
    assert_matches!(
        response.errors[0].kind(),
        ErrorKind::DimensionMismatch { op: Op::Mul, .. }
    );
}

#[test]
fn vector_division_by_vector_is_a_type_error() {
    let mut session = vector_session();
    let response = session.evaluate("u/v");
    assert_matches!(
        response.errors[0].kind(),
        ErrorKind::TypeMismatch { op: Op::Div, .. }
    );
}

#[test]
fn vector_plus_scalar_is_a_type_error() {
    let mut session = vector_session();
    let response = session.evaluate("u + a");
    assert_matches!(
        response.errors[0].kind(),
        ErrorKind::TypeMismatch { op: Op::Add, .. }
    );
}

#[test]
fn matrix_scalar_broadcast() {
    let mut session = matrix_session();
    assert_eq!(
        eval_one(&mut session, "k*a"),
        "[2 4 6 , 6 4 2 , 8 10 12]"
    );
}

#[test]
fn matrix_sums() {
    let mut session = matrix_session();
    assert_eq!(eval_one(&mut session, "a+b"), "[4 4 4 , 4 2 2 , 5 7 9]");
    assert_eq!(eval_one(&mut session, "a-b"), "[-2 0 2 , 2 2 0 , 3 3 3]");
}

#[test]
fn star_between_matrices_is_elementwise() {
    let mut session = matrix_session();
    assert_eq!(eval_one(&mut session, "a*b"), "[3 4 3 , 3 0 1 , 4 10 18]");
}

#[test]
fn dot_between_matrices_is_the_matrix_product() {
    let mut session = matrix_session();
    assert_eq!(
        eval_one(&mut session, "a.b"),
        "[8 8 12 , 12 8 8 , 23 20 27]"
    );
}

#[test]
fn matrix_power_is_the_repeated_matrix_product() {
    let mut session = matrix_session();
    assert_eq!(
        eval_one(&mut session, "a^k"),
        "[19 21 23 , 13 15 17 , 43 48 53]"
    );
}

#[test]
fn incompatible_matrix_product_shapes_are_rejected() {
    let mut session = Session::new();
    eval(&mut session, "wide = [1 2 3,4 5 6]\nsquare = [1 0 0,0 1 0,0 0 1]");
    // 2x3 . 3x3 works.
    assert_eq!(
        eval_one(&mut session, "wide.square"),
        "[1 2 3 , 4 5 6]"
    );
    // 3x3 . 2x3 does not.
    let response = session.evaluate("square.wide");
    assert_matches!(
        response.errors[0].kind(),
        ErrorKind::DimensionMismatch { op: Op::Dot, .. }
    );
}

#[test]
fn mixed_element_kinds_promote_to_float() {
    let mut session = Session::new();
    assert_eq!(eval_one(&mut session, "(1 2) + (0.5 0.5)"), "(1.5 2.5)");
    assert_eq!(eval_one(&mut session, "(1 2 3) * 0.5"), "(0.5 1.0 1.5)");
}

#[test]
fn matrix_exponent_must_be_an_integer() {
    let mut session = matrix_session();
    let response = session.evaluate("a^0.5");
    assert_matches!(
        response.errors[0].kind(),
        ErrorKind::TypeMismatch { op: Op::Power, .. }
    );
}

#[test]
fn vector_exponent_is_a_type_error() {
    let mut session = vector_session();
    let response = session.evaluate("2^u");
    assert_matches!(
        response.errors[0].kind(),
        ErrorKind::TypeMismatch { op: Op::Power, .. }
    );

    let response = session.evaluate("u^2");
    assert_matches!(
        response.errors[0].kind(),
        ErrorKind::TypeMismatch { op: Op::Power, .. }
    );
}
