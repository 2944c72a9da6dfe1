//! Type tags as written in the schema, and the named-type registry they
//! resolve through.
//!
//! The grammar covers what call parameters actually use:
//! `Name`, `Name<A, B>`, `(A, B)`, `[T; N]`, and path-qualified names like
//! `T::Balance` (the path is dropped).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Parsed form of a type tag string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeTag {
    Named(String),
    Generic { name: String, args: Vec<TypeTag> },
    Tuple(Vec<TypeTag>),
    Array { elem: Box<TypeTag>, len: usize },
}

/// True when the tag textually names an `Option<..>` wrapper. This is a naming
/// convention of the schema encoding, not a resolved-type check.
pub fn is_optional_tag(type_tag: &str) -> bool {
    type_tag.trim_start().starts_with("Option<")
}

impl TypeTag {
    pub fn parse(input: &str) -> Result<TypeTag, String> {
        let mut parser = Parser {
            chars: input.chars().collect(),
            pos: 0,
        };
        let tag = parser.parse_tag()?;
        parser.skip_ws();
        if parser.pos < parser.chars.len() {
            return Err(format!("unexpected trailing input in type tag '{input}'"));
        }
        Ok(tag)
    }

    pub fn named(name: &str) -> TypeTag {
        TypeTag::Named(name.to_string())
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, items: &[TypeTag]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{item}")?;
            }
            Ok(())
        }
        match self {
            TypeTag::Named(name) => write!(f, "{name}"),
            TypeTag::Generic { name, args } => {
                write!(f, "{name}<")?;
                join(f, args)?;
                write!(f, ">")
            }
            TypeTag::Tuple(items) => {
                write!(f, "(")?;
                join(f, items)?;
                write!(f, ")")
            }
            TypeTag::Array { elem, len } => write!(f, "[{elem}; {len}]"),
        }
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, c: char) -> Result<(), String> {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += 1;
            Ok(())
        } else {
            Err(format!("expected '{c}' at position {}", self.pos))
        }
    }

    fn parse_tag(&mut self) -> Result<TypeTag, String> {
        self.skip_ws();
        match self.peek() {
            Some('(') => {
                self.pos += 1;
                let items = self.parse_list(')')?;
                Ok(TypeTag::Tuple(items))
            }
            Some('[') => {
                self.pos += 1;
                let elem = self.parse_tag()?;
                self.expect(';')?;
                self.skip_ws();
                let start = self.pos;
                while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '_') {
                    self.pos += 1;
                }
                let digits: String = self
                    .chars
                    .get(start..self.pos)
                    .unwrap_or_default()
                    .iter()
                    .filter(|c| **c != '_')
                    .collect();
                let len = digits
                    .parse::<usize>()
                    .map_err(|_| format!("invalid array length at position {start}"))?;
                self.expect(']')?;
                Ok(TypeTag::Array {
                    elem: Box::new(elem),
                    len,
                })
            }
            Some(c) if c.is_alphanumeric() || c == '_' => {
                let name = self.parse_path();
                self.skip_ws();
                if self.peek() == Some('<') {
                    self.pos += 1;
                    let args = self.parse_list('>')?;
                    Ok(TypeTag::Generic { name, args })
                } else {
                    Ok(TypeTag::Named(name))
                }
            }
            Some(c) => Err(format!("unexpected '{c}' at position {}", self.pos)),
            None => Err("empty type tag".to_string()),
        }
    }

    /// Reads `a::b::Name` and keeps only the last segment.
    fn parse_path(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == ':')
        {
            self.pos += 1;
        }
        let path: String = self.chars.get(start..self.pos).unwrap_or_default().iter().collect();
        path.rsplit("::").next().unwrap_or_default().to_string()
    }

    /// Comma-separated tags up to `close`. The opening bracket is already consumed.
    fn parse_list(&mut self, close: char) -> Result<Vec<TypeTag>, String> {
        let mut items = Vec::new();
        self.skip_ws();
        if self.peek() == Some(close) {
            self.pos += 1;
            return Ok(items);
        }
        loop {
            items.push(self.parse_tag()?);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                    // Trailing comma, as in `(u32,)`
                    self.skip_ws();
                    if self.peek() == Some(close) {
                        self.pos += 1;
                        return Ok(items);
                    }
                }
                Some(c) if c == close => {
                    self.pos += 1;
                    return Ok(items);
                }
                _ => return Err(format!("expected ',' or '{close}' at position {}", self.pos)),
            }
        }
    }
}

// ── Type registry entries ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantDef {
    pub name: String,
    /// Encoded discriminant. None = position in the variant list.
    #[serde(default)]
    pub index: Option<u8>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

/// A named type in the schema's registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeDef {
    /// Another type tag, e.g. `"Balance": "u128"`.
    Alias(String),
    Composite { fields: Vec<FieldDef> },
    Variant { variants: Vec<VariantDef> },
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_generics() {
        let tag = TypeTag::parse("Option<Vec<(u32, T::Balance)>>").unwrap();
        assert_eq!(
            tag,
            TypeTag::Generic {
                name: "Option".into(),
                args: vec![TypeTag::Generic {
                    name: "Vec".into(),
                    args: vec![TypeTag::Tuple(vec![
                        TypeTag::named("u32"),
                        TypeTag::named("Balance"),
                    ])],
                }],
            }
        );
    }

    #[test]
    fn parses_fixed_arrays() {
        let tag = TypeTag::parse("[u8; 32]").unwrap();
        assert_eq!(
            tag,
            TypeTag::Array {
                elem: Box::new(TypeTag::named("u8")),
                len: 32
            }
        );
        assert_eq!(tag.to_string(), "[u8; 32]");
    }

    #[test]
    fn rejects_malformed_tags() {
        assert!(TypeTag::parse("Vec<u8").is_err());
        assert!(TypeTag::parse("[u8; x]").is_err());
        assert!(TypeTag::parse("").is_err());
        assert!(TypeTag::parse("u8 u16").is_err());
    }

    #[test]
    fn optional_is_textual() {
        assert!(is_optional_tag("Option<Balance>"));
        assert!(!is_optional_tag("AccountId"));
        assert!(!is_optional_tag("MaybeOption<u8>"));
    }

    #[test]
    fn registry_entries_deserialize_by_shape() {
        let alias: TypeDef = serde_json::from_str(r#""u128""#).unwrap();
        assert_eq!(alias, TypeDef::Alias("u128".into()));

        let composite: TypeDef =
            serde_json::from_str(r#"{"fields": [{"name": "x", "type": "i32"}]}"#).unwrap();
        assert!(matches!(composite, TypeDef::Composite { ref fields } if fields.len() == 1));

        let variant: TypeDef =
            serde_json::from_str(r#"{"variants": [{"name": "None"}, {"name": "Some", "index": 3}]}"#)
                .unwrap();
        match variant {
            TypeDef::Variant { variants } => {
                assert_eq!(variants.len(), 2);
                assert_eq!(variants[1].index, Some(3));
            }
            other => panic!("expected variant, got {other:?}"),
        }
    }
}
