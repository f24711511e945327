//! Property tests for the expression compiler

use std::collections::HashMap;

use proptest::prelude::*;
use tabula_core::expr::{compile, Expression, Operator};
use tabula_core::Value;

fn mapping() -> HashMap<String, String> {
    ["a", "b", "c", "d"]
        .into_iter()
        .map(|k| (k.to_string(), format!("col_{}", k)))
        .collect()
}

fn key() -> impl Strategy<Value = String> {
    prop_oneof![Just("a"), Just("b"), Just("c"), Just("d")].prop_map(str::to_string)
}

fn constant() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::Integer),
        "[a-z?%']{0,6}".prop_map(Value::Text),
        any::<bool>().prop_map(Value::Boolean),
        Just(Value::Null),
    ]
}

fn comparison() -> impl Strategy<Value = Expression> {
    prop_oneof![
        (key(), constant()).prop_map(|(k, v)| Expression::eq(k, v)),
        (key(), any::<i64>()).prop_map(|(k, v)| Expression::compare(
            k,
            Operator::GreaterThan,
            Expression::constant(v)
        )),
        (key(), any::<i64>(), any::<i64>()).prop_map(|(k, lo, hi)| Expression::between(k, lo, hi)),
        (key(), prop::collection::vec(any::<i64>(), 1..6)).prop_map(|(k, vs)| Expression::is_in(k, vs)),
        (key(), "[a-z%_?]{0,5}").prop_map(|(k, s)| Expression::compare(
            k,
            Operator::Contains,
            Expression::constant(s)
        )),
    ]
}

fn predicate() -> impl Strategy<Value = Expression> {
    comparison().prop_recursive(4, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 2..4).prop_map(Expression::and),
            prop::collection::vec(inner.clone(), 2..4).prop_map(Expression::or),
            inner.prop_map(Expression::not),
        ]
    })
}

proptest! {
    #[test]
    fn placeholders_match_argument_count(expr in predicate()) {
        let compiled = compile(&expr, &mapping()).unwrap();
        prop_assert_eq!(compiled.placeholder_count(), compiled.args.len());
    }

    #[test]
    fn parentheses_are_balanced(expr in predicate()) {
        let compiled = compile(&expr, &mapping()).unwrap();
        let opens = compiled.clause.matches('(').count();
        let closes = compiled.clause.matches(')').count();
        prop_assert_eq!(opens, closes);
    }

    #[test]
    fn text_constants_never_reach_clause(s in "[a-z]{8,12}") {
        let compiled = compile(&Expression::eq("a", s.clone()), &mapping()).unwrap();
        prop_assert!(!compiled.clause.contains(&s));
    }
}
