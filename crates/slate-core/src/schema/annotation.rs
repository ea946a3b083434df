//! Field annotation grammar.
//!
//! An annotation is a `;`-separated list of `key:value` pairs, e.g.
//! `name:user_name;constraint:PRIMARY KEY`. Two keys are recognised:
//!
//! - `name` overrides the mapped column name
//! - `constraint` is raw SQL appended after the column type
//!
//! Unknown keys are ignored. A pair that does not split into exactly one key
//! and one value is an error.

use tracing::debug;

/// The recognised settings of one field annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    /// Column name override.
    pub name: Option<String>,
    /// Raw SQL constraint.
    pub constraint: Option<String>,
}

/// A pair that is not `key:value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedPair(pub String);

/// Parses an annotation string.
pub fn parse(text: &str) -> Result<Annotation, MalformedPair> {
    let mut annotation = Annotation::default();
    for pair in text.split(';') {
        if pair.trim().is_empty() {
            continue;
        }
        let parts: Vec<&str> = pair.split(':').collect();
        let [key, value] = parts.as_slice() else {
            return Err(MalformedPair(pair.to_string()));
        };
        let (key, value) = (key.trim(), value.trim());
        match key {
            "name" => annotation.name = Some(value.to_string()),
            "constraint" => annotation.constraint = Some(value.to_string()),
            other => debug!(key = other, "ignoring unknown annotation key"),
        }
    }
    Ok(annotation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_and_constraint() {
        let annotation = parse("name:user_name;constraint:PRIMARY KEY").unwrap();
        assert_eq!(annotation.name.as_deref(), Some("user_name"));
        assert_eq!(annotation.constraint.as_deref(), Some("PRIMARY KEY"));
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let annotation = parse(" name : user_name ; constraint : NOT NULL ").unwrap();
        assert_eq!(annotation.name.as_deref(), Some("user_name"));
        assert_eq!(annotation.constraint.as_deref(), Some("NOT NULL"));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let annotation = parse("index:true;constraint:UNIQUE").unwrap();
        assert_eq!(annotation.name, None);
        assert_eq!(annotation.constraint.as_deref(), Some("UNIQUE"));
    }

    #[test]
    fn test_trailing_separator_is_allowed() {
        assert_eq!(parse("name:id;").unwrap().name.as_deref(), Some("id"));
        assert_eq!(parse("").unwrap(), Annotation::default());
    }

    #[test]
    fn test_malformed_pairs_are_rejected() {
        assert_eq!(
            parse("name:id;PRIMARY KEY").unwrap_err(),
            MalformedPair("PRIMARY KEY".to_string())
        );
        assert_eq!(
            parse("constraint:CHECK(a:b)").unwrap_err(),
            MalformedPair("constraint:CHECK(a:b)".to_string())
        );
    }
}
