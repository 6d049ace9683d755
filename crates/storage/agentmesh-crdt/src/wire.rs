//! JSON codec for what peers exchange
//!
//! Framing and delivery belong to the transport; these helpers only turn
//! operation batches, state vectors and snapshots into bytes and back.

use crate::{clock::VectorClock, error::Result, operation::Operation, sync::StateSnapshot};
use bytes::{BufMut, Bytes, BytesMut};
use serde::{de::DeserializeOwned, Serialize};

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    let mut writer = BytesMut::new().writer();
    serde_json::to_writer(&mut writer, value)?;
    Ok(writer.into_inner().freeze())
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}

pub fn encode_batch(operations: &[Operation]) -> Result<Bytes> {
    encode(operations)
}

pub fn decode_batch(bytes: &[u8]) -> Result<Vec<Operation>> {
    decode(bytes)
}

pub fn encode_state_vector(state_vector: &VectorClock) -> Result<Bytes> {
    encode(state_vector)
}

pub fn decode_state_vector(bytes: &[u8]) -> Result<VectorClock> {
    decode(bytes)
}

pub fn encode_snapshot(snapshot: &StateSnapshot) -> Result<Bytes> {
    encode(snapshot)
}

pub fn decode_snapshot(bytes: &[u8]) -> Result<StateSnapshot> {
    decode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        crdt::CrdtType, error::CrdtError, operation::OperationKind, types::AgentId,
        types::Payload,
    };

    #[test]
    fn test_state_vector_is_a_plain_map() {
        let clock: VectorClock = [("a1", 2), ("a2", 1)].into_iter().collect();
        let bytes = encode_state_vector(&clock).unwrap();
        assert_eq!(&bytes[..], br#"{"a1":2,"a2":1}"#);
        assert_eq!(decode_state_vector(&bytes).unwrap(), clock);
    }

    #[test]
    fn test_batch_preserves_operation_identity() {
        let clock: VectorClock = [("a1", 1)].into_iter().collect();
        let op = Operation::new(
            OperationKind::Add,
            "tags",
            CrdtType::OrSet,
            clock,
            AgentId::new("a1"),
        )
        .with_value(Payload::from("x"));

        let decoded = decode_batch(&encode_batch(&[op.clone()]).unwrap()).unwrap();
        assert_eq!(decoded, vec![op.clone()]);
        assert_eq!(decoded[0].id(), op.id());
    }

    #[test]
    fn test_garbage_input_is_a_serialization_error() {
        assert!(matches!(
            decode_batch(b"not json"),
            Err(CrdtError::SerializationError(_))
        ));
        assert!(matches!(
            decode_state_vector(br#"{"a1":-1}"#),
            Err(CrdtError::SerializationError(_))
        ));
    }
}
