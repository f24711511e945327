//! Expression-to-clause compiler
//!
//! Produces SQLite clause text with `?` placeholders and the matching
//! argument list. Constants never appear in the clause text. Arguments are
//! appended in the exact order their placeholders are written, which is the
//! whole contract of positional binding.

use crate::errors::{Result, TabulaError};
use crate::expr::expression::{Comparison, Compound, Connector, Expression, Operator};
use crate::expr::NameMapping;
use crate::model::Value;

/// Compiled clause and its positional arguments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledClause {
    pub clause: String,
    pub args: Vec<Value>,
}

impl CompiledClause {
    /// Number of `?` placeholders in the clause text
    pub fn placeholder_count(&self) -> usize {
        let mut count = 0;
        let mut in_string = false;
        let mut in_identifier = false;
        for c in self.clause.chars() {
            match c {
                '\'' if !in_identifier => in_string = !in_string,
                '"' if !in_string => in_identifier = !in_identifier,
                '?' if !in_string && !in_identifier => count += 1,
                _ => {}
            }
        }
        count
    }
}

/// One ORDER BY term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortDescriptor {
    pub key_path: String,
    pub ascending: bool,
}

impl SortDescriptor {
    pub fn ascending(key_path: impl Into<String>) -> Self {
        Self {
            key_path: key_path.into(),
            ascending: true,
        }
    }

    pub fn descending(key_path: impl Into<String>) -> Self {
        Self {
            key_path: key_path.into(),
            ascending: false,
        }
    }
}

/// Quote an SQL identifier, doubling embedded quotes
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Compile a predicate against a name mapping.
///
/// # Errors
///
/// `UnsupportedExpression` for node kinds or shapes with no SQL rendering,
/// `UnknownProperty` for key paths the mapping cannot resolve.
pub fn compile(expression: &Expression, mapping: &dyn NameMapping) -> Result<CompiledClause> {
    let mut out = CompiledClause::default();
    write_predicate(expression, mapping, &mut out)?;
    Ok(out)
}

/// Render `ORDER BY ...` for the sort list, or an empty string
pub fn compile_order_by(sorts: &[SortDescriptor], mapping: &dyn NameMapping) -> Result<String> {
    if sorts.is_empty() {
        return Ok(String::new());
    }
    let terms = sorts
        .iter()
        .map(|s| {
            let field = mapping.storage_field(&s.key_path)?;
            let direction = if s.ascending { "ASC" } else { "DESC" };
            Ok(format!("{} {}", quote_identifier(field), direction))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(format!("ORDER BY {}", terms.join(", ")))
}

fn write_predicate(
    expression: &Expression,
    mapping: &dyn NameMapping,
    out: &mut CompiledClause,
) -> Result<()> {
    match expression {
        Expression::Comparison(comparison) => write_comparison(comparison, mapping, out),
        Expression::Compound(compound) => write_compound(compound, mapping, out),
        Expression::KeyPath(_)
        | Expression::Constant(_)
        | Expression::Aggregate(_)
        | Expression::Variable(_)
        | Expression::Function { .. } => Err(TabulaError::unsupported(
            expression.node_kind(),
            "only comparisons and compounds are predicates",
        )),
    }
}

fn write_compound(compound: &Compound, mapping: &dyn NameMapping, out: &mut CompiledClause) -> Result<()> {
    let parts = &compound.subexpressions;
    match compound.connector {
        Connector::Not => {
            if parts.len() != 1 {
                return Err(TabulaError::unsupported(
                    "compound",
                    format!("NOT takes exactly one subexpression, got {}", parts.len()),
                ));
            }
            out.clause.push_str("NOT (");
            write_predicate(&parts[0], mapping, out)?;
            out.clause.push(')');
        }
        Connector::And | Connector::Or => {
            let keyword = if compound.connector == Connector::And {
                " AND "
            } else {
                " OR "
            };
            if parts.len() < 2 {
                return Err(TabulaError::unsupported(
                    "compound",
                    format!(
                        "{} requires at least two subexpressions, got {}",
                        keyword.trim(),
                        parts.len()
                    ),
                ));
            }
            out.clause.push('(');
            for (index, part) in parts.iter().enumerate() {
                if index > 0 {
                    out.clause.push_str(keyword);
                }
                write_predicate(part, mapping, out)?;
            }
            out.clause.push(')');
        }
    }
    Ok(())
}

fn write_comparison(
    comparison: &Comparison,
    mapping: &dyn NameMapping,
    out: &mut CompiledClause,
) -> Result<()> {
    let field = match comparison.left.as_ref() {
        Expression::KeyPath(path) => quote_identifier(mapping.storage_field(path)?),
        other => {
            return Err(TabulaError::unsupported(
                other.node_kind(),
                "left operand of a comparison must be a key path",
            ))
        }
    };
    let right = comparison.right.as_ref();

    match comparison.operator {
        Operator::Between => {
            let bounds = constant_list(right)?;
            if bounds.len() != 2 {
                return Err(TabulaError::unsupported(
                    "aggregate",
                    format!("BETWEEN needs exactly two bounds, got {}", bounds.len()),
                ));
            }
            out.clause.push_str(&format!("{} BETWEEN ? AND ?", field));
            out.args.extend(bounds);
        }
        Operator::In => {
            let members = constant_list(right)?;
            if members.is_empty() {
                return Err(TabulaError::unsupported(
                    "aggregate",
                    "IN over an empty sequence",
                ));
            }
            let placeholders = vec!["?"; members.len()].join(", ");
            out.clause
                .push_str(&format!("{} IN ({})", field, placeholders));
            out.args.extend(members);
        }
        Operator::Like => {
            let pattern = text_operand(right, "LIKE")?;
            out.clause.push_str(&format!("{} LIKE ?", field));
            out.args.push(Value::Text(pattern));
        }
        Operator::Contains | Operator::BeginsWith | Operator::EndsWith => {
            // GLOB is case-sensitive, unlike LIKE
            let needle = escape_glob(&text_operand(right, "substring match")?);
            let pattern = match comparison.operator {
                Operator::Contains => format!("*{}*", needle),
                Operator::BeginsWith => format!("{}*", needle),
                _ => format!("*{}", needle),
            };
            out.clause.push_str(&format!("{} GLOB ?", field));
            out.args.push(Value::Text(pattern));
        }
        Operator::Equal
        | Operator::NotEqual
        | Operator::LessThan
        | Operator::LessThanOrEqual
        | Operator::GreaterThan
        | Operator::GreaterThanOrEqual => {
            let symbol = scalar_symbol(comparison.operator);
            match right {
                Expression::Constant(Value::Null) => match comparison.operator {
                    Operator::Equal => out.clause.push_str(&format!("{} IS NULL", field)),
                    Operator::NotEqual => out.clause.push_str(&format!("{} IS NOT NULL", field)),
                    _ => {
                        return Err(TabulaError::unsupported(
                            "constant",
                            format!("NULL cannot be ordered with {}", symbol),
                        ))
                    }
                },
                Expression::Constant(value) => {
                    out.clause.push_str(&format!("{} {} ?", field, symbol));
                    out.args.push(value.clone());
                }
                Expression::KeyPath(path) => {
                    let other = quote_identifier(mapping.storage_field(path)?);
                    out.clause
                        .push_str(&format!("{} {} {}", field, symbol, other));
                }
                other => return Err(operand_error(other)),
            }
        }
    }
    Ok(())
}

fn scalar_symbol(operator: Operator) -> &'static str {
    match operator {
        Operator::Equal => "=",
        Operator::NotEqual => "!=",
        Operator::LessThan => "<",
        Operator::LessThanOrEqual => "<=",
        Operator::GreaterThan => ">",
        _ => ">=",
    }
}

fn operand_error(operand: &Expression) -> TabulaError {
    let reason = match operand {
        Expression::Variable(name) => format!("unbound variable ${}", name),
        Expression::Function { name, .. } => format!("function '{}' has no SQL rendering", name),
        other => format!("{} is not a valid right operand here", other.node_kind()),
    };
    TabulaError::unsupported(operand.node_kind(), reason)
}

fn constant_list(operand: &Expression) -> Result<Vec<Value>> {
    match operand {
        Expression::Aggregate(items) => items
            .iter()
            .map(|item| match item {
                Expression::Constant(value) => Ok(value.clone()),
                other => Err(operand_error(other)),
            })
            .collect(),
        other => Err(operand_error(other)),
    }
}

fn text_operand(operand: &Expression, context: &str) -> Result<String> {
    match operand {
        Expression::Constant(Value::Text(s)) => Ok(s.clone()),
        Expression::Constant(other) => Err(TabulaError::unsupported(
            "constant",
            format!("{} needs a text operand, got {}", context, other.type_label()),
        )),
        other => Err(operand_error(other)),
    }
}

/// Wrap GLOB metacharacters in single-member classes so they match literally
fn escape_glob(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '*' | '?' | '[' => {
                escaped.push('[');
                escaped.push(c);
                escaped.push(']');
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn mapping() -> HashMap<String, String> {
        [
            ("title", "title"),
            ("count", "item_count"),
            ("ratio", "ratio"),
            ("owner", "owner_id"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_simple_equality() {
        let compiled = compile(&Expression::eq("count", 4), &mapping()).unwrap();
        assert_eq!(compiled.clause, "\"item_count\" = ?");
        assert_eq!(compiled.args, vec![Value::Integer(4)]);
    }

    #[test]
    fn test_between_expands_two_placeholders() {
        let compiled = compile(&Expression::between("ratio", 0.5, 1.5), &mapping()).unwrap();
        assert_eq!(compiled.clause, "\"ratio\" BETWEEN ? AND ?");
        assert_eq!(compiled.args, vec![Value::Float(0.5), Value::Float(1.5)]);
        assert_eq!(compiled.placeholder_count(), 2);
    }

    #[test]
    fn test_in_expands_per_element() {
        let compiled = compile(&Expression::is_in("count", [1, 2, 3]), &mapping()).unwrap();
        assert_eq!(compiled.clause, "\"item_count\" IN (?, ?, ?)");
        assert_eq!(compiled.args.len(), 3);
    }

    #[test]
    fn test_empty_in_rejected() {
        let expr = Expression::compare("count", Operator::In, Expression::Aggregate(vec![]));
        assert!(matches!(
            compile(&expr, &mapping()),
            Err(TabulaError::UnsupportedExpression { .. })
        ));
    }

    #[test]
    fn test_compound_precedence_parenthesized() {
        let a = Expression::eq("title", "a");
        let b = Expression::eq("count", 1);
        let c = Expression::eq("owner", 2);

        let left_nested = compile(
            &Expression::and(vec![a.clone(), Expression::or(vec![b.clone(), c.clone()])]),
            &mapping(),
        )
        .unwrap();
        let right_nested = compile(
            &Expression::or(vec![Expression::and(vec![a, b]), c]),
            &mapping(),
        )
        .unwrap();

        assert_eq!(
            left_nested.clause,
            "(\"title\" = ? AND (\"item_count\" = ? OR \"owner_id\" = ?))"
        );
        assert_eq!(
            right_nested.clause,
            "((\"title\" = ? AND \"item_count\" = ?) OR \"owner_id\" = ?)"
        );
        assert_eq!(left_nested.args, right_nested.args);
    }

    #[test]
    fn test_not_wraps_subexpression() {
        let compiled = compile(&Expression::not(Expression::eq("count", 1)), &mapping()).unwrap();
        assert_eq!(compiled.clause, "NOT (\"item_count\" = ?)");
    }

    #[test]
    fn test_empty_and_single_compounds_rejected() {
        for expr in [
            Expression::and(vec![]),
            Expression::or(vec![Expression::eq("count", 1)]),
            Expression::Compound(Compound {
                connector: Connector::Not,
                subexpressions: vec![],
            }),
        ] {
            assert!(matches!(
                compile(&expr, &mapping()),
                Err(TabulaError::UnsupportedExpression { node_kind, .. }) if node_kind == "compound"
            ));
        }
    }

    #[test]
    fn test_null_comparisons_bind_nothing() {
        let is_null = compile(&Expression::eq("title", Value::Null), &mapping()).unwrap();
        assert_eq!(is_null.clause, "\"title\" IS NULL");
        assert!(is_null.args.is_empty());

        let not_null = compile(
            &Expression::compare("title", Operator::NotEqual, Expression::Constant(Value::Null)),
            &mapping(),
        )
        .unwrap();
        assert_eq!(not_null.clause, "\"title\" IS NOT NULL");
    }

    #[test]
    fn test_contains_escapes_wildcards() {
        let compiled = compile(
            &Expression::compare("title", Operator::Contains, Expression::constant("50%_*[a]?")),
            &mapping(),
        )
        .unwrap();
        assert_eq!(compiled.clause, "\"title\" GLOB ?");
        assert_eq!(compiled.args, vec![Value::Text("*50%_[*][[]a][?]*".to_string())]);
        assert_eq!(compiled.placeholder_count(), 1);
    }

    #[test]
    fn test_begins_and_ends_with() {
        let begins = compile(
            &Expression::compare("title", Operator::BeginsWith, Expression::constant("ab")),
            &mapping(),
        )
        .unwrap();
        assert_eq!(begins.args, vec![Value::Text("ab*".to_string())]);
        let ends = compile(
            &Expression::compare("title", Operator::EndsWith, Expression::constant("yz")),
            &mapping(),
        )
        .unwrap();
        assert_eq!(ends.args, vec![Value::Text("*yz".to_string())]);
    }

    #[test]
    fn test_constants_never_interpolated() {
        let hostile = "x'; DROP TABLE notes; --";
        let compiled = compile(&Expression::eq("title", hostile), &mapping()).unwrap();
        assert!(!compiled.clause.contains("DROP"));
        assert_eq!(compiled.args, vec![Value::Text(hostile.to_string())]);
    }

    #[test]
    fn test_unknown_key_path() {
        let err = compile(&Expression::eq("missing", 1), &mapping()).unwrap_err();
        assert!(matches!(err, TabulaError::UnknownProperty { name, .. } if name == "missing"));
    }

    #[test]
    fn test_function_and_bare_leaves_rejected() {
        let function = Expression::compare(
            "count",
            Operator::Equal,
            Expression::Function {
                name: "max".to_string(),
                arguments: vec![Expression::key("count")],
            },
        );
        assert!(matches!(
            compile(&function, &mapping()),
            Err(TabulaError::UnsupportedExpression { node_kind, .. }) if node_kind == "function"
        ));
        assert!(matches!(
            compile(&Expression::key("count"), &mapping()),
            Err(TabulaError::UnsupportedExpression { node_kind, .. }) if node_kind == "key_path"
        ));
    }

    #[test]
    fn test_key_path_on_right() {
        let expr = Expression::compare("count", Operator::LessThan, Expression::key("owner"));
        let compiled = compile(&expr, &mapping()).unwrap();
        assert_eq!(compiled.clause, "\"item_count\" < \"owner_id\"");
        assert!(compiled.args.is_empty());
    }

    #[test]
    fn test_order_by() {
        let sorts = vec![
            SortDescriptor::descending("count"),
            SortDescriptor::ascending("title"),
        ];
        assert_eq!(
            compile_order_by(&sorts, &mapping()).unwrap(),
            "ORDER BY \"item_count\" DESC, \"title\" ASC"
        );
        assert_eq!(compile_order_by(&[], &mapping()).unwrap(), "");
    }

    #[test]
    fn test_quote_identifier_doubles_quotes() {
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }
}
