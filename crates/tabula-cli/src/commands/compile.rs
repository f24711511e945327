//! Predicate compile command
//!
//! Usage: tabula compile '<PREDICATE_JSON>' --map title=title_col [--sort title:desc]

use std::collections::HashMap;

use clap::Args;
use tabula_core::expr::compile_order_by;
use tabula_core::{compile, Expression, SortDescriptor};

use super::{to_json, CommandResult};

#[derive(Debug, Args)]
pub struct CompileArgs {
    /// Predicate as JSON (serialized `Expression`)
    pub predicate: String,

    /// Property to storage field mapping, `property=field`
    #[arg(long = "map", value_name = "PROPERTY=FIELD")]
    pub mappings: Vec<String>,

    /// Sort key, `property` or `property:desc`
    #[arg(long = "sort", value_name = "PROPERTY[:desc]")]
    pub sorts: Vec<String>,
}

fn parse_mapping(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((property, field)) if !property.is_empty() && !field.is_empty() => {
            Ok((property.to_string(), field.to_string()))
        }
        _ => Err(format!("mapping '{}' is not of the form property=field", raw)),
    }
}

fn parse_sort(raw: &str) -> SortDescriptor {
    match raw.strip_suffix(":desc") {
        Some(property) => SortDescriptor::descending(property),
        None => SortDescriptor::ascending(raw.strip_suffix(":asc").unwrap_or(raw)),
    }
}

pub fn execute(args: CompileArgs) -> CommandResult {
    let predicate: Expression = serde_json::from_str(&args.predicate)?;
    let mapping = args
        .mappings
        .iter()
        .map(|m| parse_mapping(m))
        .collect::<Result<HashMap<_, _>, _>>()?;
    let sorts: Vec<SortDescriptor> = args.sorts.iter().map(|s| parse_sort(s)).collect();

    let compiled = compile(&predicate, &mapping)?;
    let order_by = compile_order_by(&sorts, &mapping)?;

    let output = serde_json::json!({
        "clause": compiled.clause,
        "args": compiled.args.iter().map(to_json).collect::<Vec<_>>(),
        "order_by": order_by,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mapping() {
        assert_eq!(
            parse_mapping("title=title_col").unwrap(),
            ("title".to_string(), "title_col".to_string())
        );
        assert!(parse_mapping("title").is_err());
        assert!(parse_mapping("=field").is_err());
    }

    #[test]
    fn test_parse_sort() {
        assert_eq!(parse_sort("title"), SortDescriptor::ascending("title"));
        assert_eq!(parse_sort("title:asc"), SortDescriptor::ascending("title"));
        assert_eq!(parse_sort("title:desc"), SortDescriptor::descending("title"));
    }
}
