pub mod coerce;
pub mod scale;

use serde::Serialize;

use crate::error::ExplorerError;
use crate::form::{ParameterValue, Selection};
use crate::schema::{resolve_operation, SchemaSource};

/// Extrinsic format version byte for unsigned transactions.
const EXTRINSIC_VERSION: u8 = 4;
/// High bit of the version byte marks a signed transaction.
const SIGNED_FLAG: u8 = 0b1000_0000;

/// Call data for one fully-bound operation, ready to estimate or sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Payload {
    group: String,
    operation: String,
    #[serde(serialize_with = "serialize_hex")]
    call: Vec<u8>,
}

fn serialize_hex<S: serde::Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
}

impl Payload {
    pub fn new(group: &str, operation: &str, call: Vec<u8>) -> Self {
        Self {
            group: group.to_string(),
            operation: operation.to_string(),
            call,
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn call_data(&self) -> &[u8] {
        &self.call
    }

    /// Length-prefixed unsigned extrinsic: compact(len) ++ version ++ call.
    pub fn unsigned_extrinsic(&self) -> Vec<u8> {
        let mut body = Vec::with_capacity(self.call.len() + 1);
        body.push(EXTRINSIC_VERSION);
        body.extend_from_slice(&self.call);
        length_prefixed(&body)
    }

    /// Bytes the signer signs: call ++ extra ++ additional.
    /// `extra` travels in the envelope; `additional` is only signed.
    pub fn signing_payload(&self, extra: &[u8], additional: &[u8]) -> Vec<u8> {
        let mut message = Vec::with_capacity(self.call.len() + extra.len() + additional.len());
        message.extend_from_slice(&self.call);
        message.extend_from_slice(extra);
        message.extend_from_slice(additional);
        message
    }

    /// Length-prefixed signed extrinsic:
    /// compact(len) ++ (version | signed) ++ address ++ signature ++ extra ++ call.
    pub fn signed_extrinsic(&self, address: &[u8], signature: &[u8], extra: &[u8]) -> Vec<u8> {
        let mut body = Vec::with_capacity(1 + address.len() + signature.len() + extra.len() + self.call.len());
        body.push(EXTRINSIC_VERSION | SIGNED_FLAG);
        body.extend_from_slice(address);
        body.extend_from_slice(signature);
        body.extend_from_slice(extra);
        body.extend_from_slice(&self.call);
        length_prefixed(&body)
    }

    /// Wire form sent to the fee estimation service.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.unsigned_extrinsic()))
    }
}

fn length_prefixed(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 5);
    scale::write_bytes(body, &mut out);
    out
}

/// Build the payload for `(group, operation)` from raw operator values.
///
/// The argument count must equal the declared parameter count; nothing is
/// coerced otherwise. Values are coerced against the schema's declared type
/// tags, and the first coercion failure fails the whole encode.
pub fn encode<S: SchemaSource + ?Sized>(
    schema: &S,
    group: &str,
    operation: &str,
    values: &[ParameterValue],
) -> Result<Payload, ExplorerError> {
    if group.is_empty() || operation.is_empty() {
        return Err(ExplorerError::IncompleteSelection);
    }
    let op = resolve_operation(schema, group, operation)?;
    if values.len() != op.params.len() {
        return Err(ExplorerError::ArityMismatch {
            expected: op.params.len(),
            actual: values.len(),
        });
    }
    let args = op
        .params
        .iter()
        .zip(values)
        .enumerate()
        .map(|(index, (param, value))| coerce::coerce_argument(schema, index, &param.type_tag, &value.value))
        .collect::<Result<Vec<_>, _>>()?;
    schema.bind(group, operation, &args)
}

/// Encode the current selection, or report why it can't be encoded yet.
pub fn encode_selection<S: SchemaSource + ?Sized>(
    schema: Option<&S>,
    selection: &Selection,
) -> Result<Payload, ExplorerError> {
    let schema = schema.ok_or(ExplorerError::SchemaUnavailable)?;
    encode(schema, &selection.group, &selection.operation, &selection.params)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;
    use crate::form::FormState;
    use crate::schema::fixtures::sample_metadata;
    use crate::schema::ChainMetadata;

    fn value(type_tag: &str, raw: &str) -> ParameterValue {
        ParameterValue {
            type_tag: type_tag.into(),
            value: raw.into(),
        }
    }

    #[test]
    fn encodes_transfer_with_absent_optional() {
        let metadata = sample_metadata();
        let dest = format!("0x{}", "ab".repeat(32));
        let payload = encode(
            &metadata,
            "balances",
            "transfer",
            &[value("AccountId", &dest), value("Option<Balance>", "")],
        )
        .unwrap();
        let call = payload.call_data();
        assert_eq!(call[..2], [5, 0]);
        assert_eq!(call[2..34], [0xab; 32]);
        assert_eq!(call[34..], [0]);
        assert_eq!(payload.group(), "balances");
        assert_eq!(payload.operation(), "transfer");
    }

    #[test]
    fn arity_mismatch_refuses_before_coercion() {
        let metadata = sample_metadata();
        // The lone value is not even valid, but the count check comes first.
        let err = encode(&metadata, "balances", "transfer", &[value("AccountId", "bogus")]).unwrap_err();
        assert_eq!(
            err,
            ExplorerError::ArityMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn one_bad_argument_fails_the_whole_encode() {
        let metadata = sample_metadata();
        let err = encode(
            &metadata,
            "geometry",
            "place",
            &[value("Point", "[1, 2]"), value("Vec<u16>", "[1]"), value("bool", "maybe")],
        )
        .unwrap_err();
        match err {
            ExplorerError::Coercion(e) => {
                assert_eq!(e.index, 2);
                assert_eq!(e.type_tag, "bool");
            }
            other => panic!("expected coercion error, got {other:?}"),
        }
    }

    #[test]
    fn schema_type_tags_win_over_stored_ones() {
        let metadata = sample_metadata();
        // Stored tag is stale; the declared `Perbill` (u32) is what counts.
        let payload = encode(&metadata, "system", "fill_block", &[value("u8", "300")]).unwrap();
        assert_eq!(payload.call_data(), &[0, 0, 0x2c, 0x01, 0, 0]);
    }

    #[test]
    fn encoding_is_deterministic() {
        let metadata = sample_metadata();
        let args = [value("Bytes", "0x0102")];
        let a = encode(&metadata, "system", "remark", &args).unwrap();
        let b = encode(&metadata, "system", "remark", &args).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_hex(), "0x18040001080102");
    }

    #[test]
    fn signed_extrinsic_layout() {
        let payload = Payload::new("system", "remark", vec![0, 1, 0]);
        let signed = payload.signed_extrinsic(&[0xaa], &[0xbb, 0xcc], &[0x00, 0x04]);
        assert_eq!(signed, [0x24, 0x84, 0xaa, 0xbb, 0xcc, 0x00, 0x04, 0, 1, 0]);
    }

    #[test]
    fn signing_payload_appends_extensions() {
        let payload = Payload::new("system", "remark", vec![0, 1, 0]);
        assert_eq!(payload.signing_payload(&[0x00, 0x04], &[7, 7]), [0, 1, 0, 0x00, 0x04, 7, 7]);
    }

    #[test]
    fn selection_needs_schema_and_ids() {
        let metadata = sample_metadata();
        let mut form = FormState::new();
        assert_eq!(
            encode_selection(None::<&ChainMetadata>, form.selection()).unwrap_err(),
            ExplorerError::SchemaUnavailable
        );
        assert_eq!(
            encode_selection(Some(&metadata), form.selection()).unwrap_err(),
            ExplorerError::IncompleteSelection
        );
        form.set_group("balances");
        form.set_operation("burn_all");
        let payload = encode_selection(Some(&metadata), form.selection()).unwrap();
        assert_eq!(payload.call_data(), &[5, 4]);
    }
}
