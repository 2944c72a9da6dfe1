//! Turns operator-entered text into the SCALE bytes of a declared type.
//!
//! Scalars are read straight from the text. Sequences, tuples, structs and
//! enums are read as JSON, and their leaves go through the same scalar rules.

use parity_scale_codec::Encode;
use serde_json::Value;

use crate::error::EncodeError;
use crate::schema::types::{FieldDef, TypeDef, TypeTag, VariantDef};
use crate::schema::SchemaSource;

use super::scale;

/// Alias chains and nesting deeper than this are rejected.
const MAX_TYPE_DEPTH: usize = 32;

/// Coerce one top-level argument. Failures carry the argument's index and tag.
pub fn coerce_argument<S: SchemaSource + ?Sized>(
    schema: &S,
    index: usize,
    type_tag: &str,
    raw: &str,
) -> Result<Vec<u8>, EncodeError> {
    let fail = |reason: String| EncodeError {
        index,
        type_tag: type_tag.to_string(),
        reason,
    };
    let tag = TypeTag::parse(type_tag).map_err(fail)?;
    let mut out = Vec::new();
    Coercer { schema }
        .encode_text(&tag, raw, 0, &mut out)
        .map_err(fail)?;
    Ok(out)
}

/// What a type tag means once aliases are followed.
enum Shape<'a> {
    Uint(u32),
    Int(u32),
    Bool,
    Str,
    Bytes,
    ByteArray(usize),
    Compact(TypeTag),
    Option(TypeTag),
    Vec(TypeTag),
    Array(TypeTag, usize),
    Tuple(Vec<TypeTag>),
    Composite(&'a [FieldDef]),
    Variant(&'a [VariantDef]),
}

impl Shape<'_> {
    /// Shapes whose text form is JSON.
    fn is_structured(&self) -> bool {
        matches!(
            self,
            Shape::Vec(_) | Shape::Array(..) | Shape::Tuple(_) | Shape::Composite(_) | Shape::Variant(_)
        )
    }
}

struct Coercer<'a, S: ?Sized> {
    schema: &'a S,
}

impl<'a, S: SchemaSource + ?Sized> Coercer<'a, S> {
    fn resolve(&self, tag: &TypeTag, depth: usize) -> Result<Shape<'a>, String> {
        if depth > MAX_TYPE_DEPTH {
            return Err(format!("type '{tag}' nests too deeply"));
        }
        match tag {
            TypeTag::Named(name) => self.resolve_named(name, depth),
            TypeTag::Generic { name, args } => {
                let first = args
                    .first()
                    .cloned()
                    .ok_or_else(|| format!("'{name}' needs a type argument"))?;
                match name.as_str() {
                    "Option" => Ok(Shape::Option(first)),
                    "Compact" => Ok(Shape::Compact(first)),
                    "Box" => self.resolve(&first, depth + 1),
                    "Vec" | "BoundedVec" | "WeakBoundedVec" => {
                        if first == TypeTag::named("u8") {
                            Ok(Shape::Bytes)
                        } else {
                            Ok(Shape::Vec(first))
                        }
                    }
                    // Type parameters of registry types don't change their layout.
                    _ => self.resolve_named(name, depth),
                }
            }
            TypeTag::Tuple(items) => Ok(Shape::Tuple(items.clone())),
            TypeTag::Array { elem, len } => {
                if **elem == TypeTag::named("u8") {
                    Ok(Shape::ByteArray(*len))
                } else {
                    Ok(Shape::Array((**elem).clone(), *len))
                }
            }
        }
    }

    fn resolve_named(&self, name: &str, depth: usize) -> Result<Shape<'a>, String> {
        let primitive = match name {
            "u8" => Some(Shape::Uint(8)),
            "u16" => Some(Shape::Uint(16)),
            "u32" => Some(Shape::Uint(32)),
            "u64" => Some(Shape::Uint(64)),
            "u128" => Some(Shape::Uint(128)),
            "i8" => Some(Shape::Int(8)),
            "i16" => Some(Shape::Int(16)),
            "i32" => Some(Shape::Int(32)),
            "i64" => Some(Shape::Int(64)),
            "i128" => Some(Shape::Int(128)),
            "bool" => Some(Shape::Bool),
            "String" | "Text" | "str" => Some(Shape::Str),
            "Bytes" => Some(Shape::Bytes),
            _ => None,
        };
        if let Some(shape) = primitive {
            return Ok(shape);
        }
        match self.schema.type_def(name) {
            Some(TypeDef::Alias(target)) => {
                let tag = TypeTag::parse(target)?;
                self.resolve(&tag, depth + 1)
            }
            Some(TypeDef::Composite { fields }) => Ok(Shape::Composite(fields)),
            Some(TypeDef::Variant { variants }) => Ok(Shape::Variant(variants)),
            None => Err(format!("unknown type '{name}'")),
        }
    }

    fn encode_text(&self, tag: &TypeTag, raw: &str, depth: usize, out: &mut Vec<u8>) -> Result<(), String> {
        let shape = self.resolve(tag, depth)?;
        match shape {
            Shape::Option(inner) => {
                if raw.trim().is_empty() {
                    out.push(0);
                    Ok(())
                } else {
                    self.encode_some(&inner, depth, out, |c, out| c.encode_text(&inner, raw, depth + 1, out))
                }
            }
            shape if shape.is_structured() => {
                let value = serde_json::from_str::<Value>(raw.trim()).map_err(|e| format!("expected JSON: {e}"))?;
                self.encode_shape_json(shape, &value, depth, out)
            }
            shape => self.encode_leaf(shape, raw, depth, out),
        }
    }

    fn encode_json(&self, tag: &TypeTag, value: &Value, depth: usize, out: &mut Vec<u8>) -> Result<(), String> {
        let shape = self.resolve(tag, depth)?;
        self.encode_shape_json(shape, value, depth, out)
    }

    fn encode_shape_json(&self, shape: Shape<'a>, value: &Value, depth: usize, out: &mut Vec<u8>) -> Result<(), String> {
        let next = depth + 1;
        match shape {
            Shape::Option(inner) => {
                if value.is_null() {
                    out.push(0);
                    Ok(())
                } else {
                    self.encode_some(&inner, depth, out, |c, out| c.encode_json(&inner, value, next, out))
                }
            }
            Shape::Vec(elem) => {
                let items = value.as_array().ok_or("expected a JSON array")?;
                scale::write_len(items.len(), out);
                items.iter().try_for_each(|item| self.encode_json(&elem, item, next, out))
            }
            Shape::Array(elem, len) => {
                let items = expect_len(value, len)?;
                items.iter().try_for_each(|item| self.encode_json(&elem, item, next, out))
            }
            Shape::Tuple(tags) => {
                let items = expect_len(value, tags.len())?;
                tags.iter()
                    .zip(items)
                    .try_for_each(|(t, item)| self.encode_json(t, item, next, out))
            }
            Shape::Composite(fields) => self.encode_fields(fields, value, next, out),
            Shape::Variant(variants) => self.encode_variant(variants, value, next, out),
            leaf => {
                let text = leaf_text(value)?;
                self.encode_leaf(leaf, &text, depth, out)
            }
        }
    }

    /// `Option<bool>` packs into one byte; every other `Some` is `0x01` + value.
    fn encode_some(
        &self,
        inner: &TypeTag,
        depth: usize,
        out: &mut Vec<u8>,
        encode_inner: impl FnOnce(&Self, &mut Vec<u8>) -> Result<(), String>,
    ) -> Result<(), String> {
        if matches!(self.resolve(inner, depth + 1)?, Shape::Bool) {
            let mut value = Vec::new();
            encode_inner(self, &mut value)?;
            out.push(if value.first() == Some(&1) { 1 } else { 2 });
            return Ok(());
        }
        out.push(1);
        encode_inner(self, out)
    }

    fn encode_fields(&self, fields: &[FieldDef], value: &Value, depth: usize, out: &mut Vec<u8>) -> Result<(), String> {
        match value {
            Value::Object(map) => fields.iter().try_for_each(|f| {
                let field_value = map.get(&f.name).cloned().unwrap_or(Value::Null);
                let tag = TypeTag::parse(&f.type_tag)?;
                self.encode_json(&tag, &field_value, depth, out)
                    .map_err(|e| format!("field '{}': {e}", f.name))
            }),
            Value::Array(items) if items.len() == fields.len() => {
                fields.iter().zip(items).try_for_each(|(f, item)| {
                    let tag = TypeTag::parse(&f.type_tag)?;
                    self.encode_json(&tag, item, depth, out)
                        .map_err(|e| format!("field '{}': {e}", f.name))
                })
            }
            // A lone field may be given without a wrapper.
            other if fields.len() == 1 => fields.first().map_or(Ok(()), |f| {
                let tag = TypeTag::parse(&f.type_tag)?;
                self.encode_json(&tag, other, depth, out)
            }),
            _ => Err(format!("expected an object with {} fields", fields.len())),
        }
    }

    fn encode_variant(&self, variants: &[VariantDef], value: &Value, depth: usize, out: &mut Vec<u8>) -> Result<(), String> {
        let (name, payload) = match value {
            Value::String(name) => (name.as_str(), None),
            Value::Object(map) if map.len() == 1 => match map.iter().next() {
                Some((name, payload)) => (name.as_str(), Some(payload)),
                None => return Err("expected a variant".to_string()),
            },
            _ => return Err("expected a variant name or {\"Variant\": value}".to_string()),
        };
        let (position, variant) = variants
            .iter()
            .enumerate()
            .find(|(_, v)| v.name == name)
            .ok_or_else(|| format!("unknown variant '{name}'"))?;
        let discriminant = match variant.index {
            Some(index) => index,
            None => u8::try_from(position).map_err(|_| "too many variants".to_string())?,
        };
        out.push(discriminant);
        match payload {
            None if variant.fields.is_empty() => Ok(()),
            None => Err(format!("variant '{name}' needs {} fields", variant.fields.len())),
            Some(payload) => self.encode_fields(&variant.fields, payload, depth, out),
        }
    }

    fn encode_leaf(&self, shape: Shape<'a>, raw: &str, depth: usize, out: &mut Vec<u8>) -> Result<(), String> {
        match shape {
            Shape::Uint(bits) => {
                scale::write_uint(parse_uint(raw)?, bits, out)
            }
            Shape::Int(bits) => {
                scale::write_int(parse_int(raw)?, bits, out)
            }
            Shape::Bool => {
                let value = match raw.trim().to_ascii_lowercase().as_str() {
                    "true" => true,
                    "false" => false,
                    other => return Err(format!("expected true or false, got '{other}'")),
                };
                value.encode_to(out);
                Ok(())
            }
            Shape::Str => {
                raw.encode_to(out);
                Ok(())
            }
            Shape::Bytes => {
                let bytes = match raw.trim().strip_prefix("0x") {
                    Some(hex_digits) => hex::decode(hex_digits).map_err(|e| format!("invalid hex: {e}"))?,
                    None => raw.as_bytes().to_vec(),
                };
                scale::write_bytes(&bytes, out);
                Ok(())
            }
            Shape::ByteArray(len) => {
                let hex_digits = raw
                    .trim()
                    .strip_prefix("0x")
                    .ok_or_else(|| format!("expected 0x-prefixed hex of {len} bytes"))?;
                let bytes = hex::decode(hex_digits).map_err(|e| format!("invalid hex: {e}"))?;
                if bytes.len() != len {
                    return Err(format!("expected {len} bytes, got {}", bytes.len()));
                }
                out.extend_from_slice(&bytes);
                Ok(())
            }
            Shape::Compact(inner) => {
                let bits = match self.resolve(&inner, depth + 1)? {
                    Shape::Uint(bits) => bits,
                    _ => return Err(format!("Compact<{inner}> must wrap an unsigned integer")),
                };
                scale::write_compact(parse_uint(raw)?, bits, out)
            }
            _ => Err("expected a scalar value".to_string()),
        }
    }
}

fn expect_len(value: &Value, len: usize) -> Result<&Vec<Value>, String> {
    let items = value.as_array().ok_or("expected a JSON array")?;
    if items.len() == len {
        Ok(items)
    } else {
        Err(format!("expected {len} elements, got {}", items.len()))
    }
}

/// Text of a JSON scalar, so JSON leaves share the plain-text rules.
fn leaf_text(value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => Err("expected a scalar value".to_string()),
    }
}

fn parse_uint(raw: &str) -> Result<u128, String> {
    let text = raw.trim();
    if text.is_empty() {
        return Err("value is required".to_string());
    }
    let value = match text.strip_prefix("0x") {
        Some(hex_digits) => u128::from_str_radix(hex_digits, 16),
        None => text.parse::<u128>(),
    }
    .map_err(|e| format!("invalid unsigned integer '{text}': {e}"));
    value
}

fn parse_int(raw: &str) -> Result<i128, String> {
    let text = raw.trim();
    if text.is_empty() {
        return Err("value is required".to_string());
    }
    text.parse::<i128>()
        .map_err(|e| format!("invalid integer '{text}': {e}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::schema::fixtures::sample_metadata;

    fn coerce(tag: &str, raw: &str) -> Result<Vec<u8>, EncodeError> {
        coerce_argument(&sample_metadata(), 0, tag, raw)
    }

    #[test]
    fn integers_are_fixed_width_little_endian() {
        assert_eq!(coerce("u32", "258").unwrap(), [0x02, 0x01, 0x00, 0x00]);
        assert_eq!(coerce("u16", "0xff").unwrap(), [0xff, 0x00]);
        assert_eq!(coerce("i8", "-2").unwrap(), [0xfe]);
        assert_eq!(coerce("Balance", "1").unwrap().len(), 16);
    }

    #[test]
    fn integer_range_and_syntax_are_checked() {
        assert!(coerce("u8", "256").is_err());
        assert!(coerce("u8", "-1").is_err());
        assert!(coerce("i8", "128").is_err());
        assert!(coerce("u64", "twelve").is_err());
        assert_eq!(coerce("u8", "256").unwrap_err().reason, "256 does not fit in u8");
        assert_eq!(coerce("Compact<u32>", "4294967296").unwrap_err().reason, "4294967296 does not fit in u32");
        let err = coerce("u32", "").unwrap_err();
        assert_eq!(err.index, 0);
        assert_eq!(err.type_tag, "u32");
        assert_eq!(err.reason, "value is required");
    }

    #[test]
    fn booleans() {
        assert_eq!(coerce("bool", "TRUE").unwrap(), [1]);
        assert_eq!(coerce("bool", "false").unwrap(), [0]);
        assert!(coerce("bool", "yes").is_err());
    }

    #[test]
    fn option_blank_is_none_and_text_is_some() {
        assert_eq!(coerce("Option<Balance>", "  ").unwrap(), [0]);
        let some = coerce("Option<u8>", "7").unwrap();
        assert_eq!(some, [1, 7]);
        assert_eq!(coerce("Option<bool>", "true").unwrap(), [1]);
        assert_eq!(coerce("Option<bool>", "false").unwrap(), [2]);
    }

    #[test]
    fn byte_sequences_accept_hex_or_text() {
        assert_eq!(coerce("Bytes", "0xdead").unwrap(), [0x08, 0xde, 0xad]);
        assert_eq!(coerce("Vec<u8>", "hi").unwrap(), [0x08, b'h', b'i']);
        assert!(coerce("Bytes", "0xzz").is_err());
    }

    #[test]
    fn fixed_byte_arrays_need_exact_length() {
        let account = format!("0x{}", "11".repeat(32));
        assert_eq!(coerce("AccountId", &account).unwrap(), vec![0x11; 32]);
        assert!(coerce("AccountId", "0x11").is_err());
        assert!(coerce("AccountId", "alice").is_err());
    }

    #[test]
    fn compact_wraps_unsigned_through_aliases() {
        assert_eq!(coerce("Compact<T::Balance>", "64").unwrap(), [0x01, 0x01]);
        assert!(coerce("Compact<bool>", "1").is_err());
    }

    #[test]
    fn nested_structures_read_json() {
        assert_eq!(coerce("Vec<u16>", "[1, 2]").unwrap(), [0x08, 1, 0, 2, 0]);
        assert_eq!(
            coerce("Point", r#"{"x": 1, "y": -1}"#).unwrap(),
            [1, 0, 0, 0, 0xff, 0xff, 0xff, 0xff]
        );
        assert_eq!(coerce("Point", "[2, 3]").unwrap(), [2, 0, 0, 0, 3, 0, 0, 0]);
        assert_eq!(coerce("(u8, bool)", r#"[5, "true"]"#).unwrap(), [5, 1]);
        assert_eq!(coerce("[u16; 2]", "[1, 2]").unwrap(), [1, 0, 2, 0]);
        assert!(coerce("[u16; 2]", "[1]").is_err());
        assert!(coerce("Vec<u16>", "1, 2").is_err());
    }

    #[test]
    fn variants_encode_discriminant_then_fields() {
        let account = format!("0x{}", "22".repeat(32));
        let encoded = coerce("MultiAddress", &format!(r#"{{"Id": "{account}"}}"#)).unwrap();
        assert_eq!(encoded[0], 0);
        assert_eq!(&encoded[1..], vec![0x22; 32].as_slice());

        assert_eq!(coerce("MultiAddress", r#"{"Index": 1}"#).unwrap(), [1, 0x04]);
        assert_eq!(coerce("MultiAddress", r#"{"Raw": "0x01"}"#).unwrap(), [2, 0x04, 0x01]);
        assert!(coerce("MultiAddress", "Id").is_err());
        assert!(coerce("MultiAddress", r#"{"Nope": 1}"#).is_err());
    }

    #[test]
    fn structured_values_must_be_json() {
        let err = coerce("MultiAddress", "Index").unwrap_err();
        assert!(err.reason.starts_with("expected JSON"));
        assert_eq!(coerce("(u8,)", "[5]").unwrap(), [5]);
        assert!(coerce("(u8,)", "5").is_err());
    }

    #[test]
    fn unknown_types_and_bad_tags_fail() {
        assert!(coerce("Mystery", "1").is_err());
        assert!(coerce("Vec<", "1").is_err());
    }

    #[test]
    fn alias_cycles_are_cut_off() {
        let mut metadata = sample_metadata();
        metadata.types.insert("Loop".into(), TypeDef::Alias("Loop".into()));
        let err = coerce_argument(&metadata, 3, "Loop", "1").unwrap_err();
        assert_eq!(err.index, 3);
        assert!(err.reason.contains("nests too deeply"));
    }
}
