//! CBOR encoding and decoding for [`Frame`].
//!
//! The wire representation is a CBOR map from string keys to values,
//! containing only the fields that apply to the frame's type. `HELLO`,
//! `LOG`, `ERR` and `RELAY_NOTIFY` nest their extra fields under a `meta`
//! sub-map; every other frame type carries its fields at the top level.
//! Encoding always emits the string-keyed form; decoding additionally
//! accepts the historical integer-keyed layout (keys `0..10`) by
//! translating integer keys to their string names before decoding proceeds
//! through one common path.

use ciborium::value::{Integer, Value};

use crate::error::{CodecError, MalformedReason, WIRE_VERSION};
use crate::frame::{Frame, FrameType};
use crate::message_id::MessageId;

/// Legacy integer key -> canonical field name, per the historical layout.
const LEGACY_KEYS: [&str; 11] = [
    "version",
    "frame_type",
    "id",
    "seq",
    "content_type",
    "meta",
    "payload",
    "len",
    "offset",
    "eof",
    "cap",
];

pub fn encode(frame: &Frame) -> Result<Vec<u8>, CodecError> {
    let value = frame_to_value(frame);
    let mut buf = Vec::new();
    ciborium::ser::into_writer(&value, &mut buf).map_err(|e| CodecError::Cbor(e.to_string()))?;
    Ok(buf)
}

pub fn decode(bytes: &[u8]) -> Result<Frame, CodecError> {
    let value: Value =
        ciborium::de::from_reader(bytes).map_err(|e| CodecError::Cbor(e.to_string()))?;
    let map = normalize_map(value)?;
    value_to_frame(&map)
}

fn normalize_map(value: Value) -> Result<Vec<(String, Value)>, CodecError> {
    let Value::Map(entries) = value else {
        return Err(MalformedReason::NotAMap.into());
    };
    let mut out = Vec::with_capacity(entries.len());
    for (key, val) in entries {
        let name = match key {
            Value::Text(s) => s,
            Value::Integer(i) => {
                let idx: u64 = i.try_into().map_err(|_| CodecError::from(MalformedReason::NotAMap))?;
                LEGACY_KEYS
                    .get(idx as usize)
                    .map(|s| s.to_string())
                    .ok_or(MalformedReason::NotAMap)?
            }
            _ => return Err(MalformedReason::NotAMap.into()),
        };
        out.push((name, val));
    }
    Ok(out)
}

fn find<'a>(map: &'a [(String, Value)], key: &str) -> Option<&'a Value> {
    map.iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

fn as_u64(v: &Value) -> Option<u64> {
    match v {
        Value::Integer(i) => u64::try_from(*i).ok(),
        Value::Float(f) if f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64 => Some(*f as u64),
        _ => None,
    }
}

fn as_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        _ => None,
    }
}

fn as_str(v: &Value) -> Option<&str> {
    match v {
        Value::Text(s) => Some(s),
        _ => None,
    }
}

fn as_bytes(v: &Value) -> Option<&[u8]> {
    match v {
        Value::Bytes(b) => Some(b),
        _ => None,
    }
}

fn req_u64(map: &[(String, Value)], key: &'static str) -> Result<u64, CodecError> {
    find(map, key)
        .and_then(as_u64)
        .ok_or_else(|| MalformedReason::MissingField(key).into())
}

fn req_str(map: &[(String, Value)], key: &'static str) -> Result<String, CodecError> {
    find(map, key)
        .and_then(as_str)
        .map(str::to_string)
        .ok_or_else(|| MalformedReason::MissingField(key).into())
}

fn req_bytes(map: &[(String, Value)], key: &'static str) -> Result<Vec<u8>, CodecError> {
    find(map, key)
        .and_then(as_bytes)
        .map(<[u8]>::to_vec)
        .ok_or_else(|| MalformedReason::MissingField(key).into())
}

fn req_bool(map: &[(String, Value)], key: &'static str, default: bool) -> Result<bool, CodecError> {
    match find(map, key) {
        Some(v) => as_bool(v).ok_or_else(|| MalformedReason::WrongType(key).into()),
        None => Ok(default),
    }
}

fn nested_meta(map: &[(String, Value)]) -> Result<Vec<(String, Value)>, CodecError> {
    let meta = find(map, "meta").ok_or(MalformedReason::MissingField("meta"))?;
    match meta.clone() {
        Value::Map(_) => normalize_map(meta.clone()),
        _ => Err(MalformedReason::WrongType("meta").into()),
    }
}

fn decode_message_id(map: &[(String, Value)]) -> Result<MessageId, CodecError> {
    let v = find(map, "id").ok_or(MalformedReason::MissingField("id"))?;
    match v {
        Value::Bytes(b) if b.len() == 16 => {
            let mut bytes = [0u8; 16];
            bytes.copy_from_slice(b);
            Ok(MessageId::Uuid(uuid::Uuid::from_bytes(bytes)))
        }
        Value::Integer(_) | Value::Float(_) => {
            Ok(MessageId::Uint(as_u64(v).ok_or(MalformedReason::WrongType("id"))?))
        }
        _ => Err(MalformedReason::WrongType("id").into()),
    }
}

fn message_id_to_value(id: MessageId) -> Value {
    match id {
        MessageId::Uuid(u) => Value::Bytes(u.as_bytes().to_vec()),
        MessageId::Uint(n) => Value::Integer(Integer::from(n)),
    }
}

fn frame_to_value(frame: &Frame) -> Value {
    let mut top: Vec<(Value, Value)> = vec![
        (Value::Text("version".into()), Value::Integer(Integer::from(WIRE_VERSION))),
        (
            Value::Text("frame_type".into()),
            Value::Integer(Integer::from(u8::from(frame.frame_type()) as u64)),
        ),
        (Value::Text("id".into()), message_id_to_value(frame.id())),
        (Value::Text("seq".into()), Value::Integer(Integer::from(frame.seq()))),
    ];

    match frame {
        Frame::Hello { max_frame, max_chunk, version, manifest, .. } => {
            let mut meta = vec![
                (Value::Text("max_frame".into()), Value::Integer(Integer::from(*max_frame))),
                (Value::Text("max_chunk".into()), Value::Integer(Integer::from(*max_chunk))),
                (Value::Text("version".into()), Value::Integer(Integer::from(*version))),
            ];
            if let Some(m) = manifest {
                meta.push((Value::Text("manifest".into()), Value::Bytes(m.clone())));
            }
            top.push((Value::Text("meta".into()), Value::Map(meta)));
        }
        Frame::Req { cap, payload, content_type, .. } => {
            top.push((Value::Text("cap".into()), Value::Text(cap.clone())));
            top.push((Value::Text("payload".into()), Value::Bytes(payload.clone())));
            if let Some(ct) = content_type {
                top.push((Value::Text("content_type".into()), Value::Text(ct.clone())));
            }
        }
        Frame::Chunk { stream_id, payload, .. } => {
            top.push((Value::Text("stream_id".into()), Value::Text(stream_id.clone())));
            top.push((Value::Text("payload".into()), Value::Bytes(payload.clone())));
        }
        Frame::End { eof, payload, .. } => {
            top.push((Value::Text("eof".into()), Value::Bool(*eof)));
            if let Some(p) = payload {
                top.push((Value::Text("payload".into()), Value::Bytes(p.clone())));
            }
        }
        Frame::Log { level, message, .. } => {
            let meta = vec![
                (Value::Text("level".into()), Value::Text(level.clone())),
                (Value::Text("message".into()), Value::Text(message.clone())),
            ];
            top.push((Value::Text("meta".into()), Value::Map(meta)));
        }
        Frame::Err { code, message, .. } => {
            let meta = vec![
                (Value::Text("code".into()), Value::Text(code.clone())),
                (Value::Text("message".into()), Value::Text(message.clone())),
            ];
            top.push((Value::Text("meta".into()), Value::Map(meta)));
        }
        Frame::Heartbeat { .. } => {}
        Frame::StreamStart { stream_id, media_urn, .. } => {
            top.push((Value::Text("stream_id".into()), Value::Text(stream_id.clone())));
            top.push((Value::Text("media_urn".into()), Value::Text(media_urn.clone())));
        }
        Frame::StreamEnd { stream_id, .. } => {
            top.push((Value::Text("stream_id".into()), Value::Text(stream_id.clone())));
        }
        Frame::RelayNotify { manifest, max_frame, max_chunk, .. } => {
            let meta = vec![
                (Value::Text("manifest".into()), Value::Bytes(manifest.clone())),
                (Value::Text("max_frame".into()), Value::Integer(Integer::from(*max_frame))),
                (Value::Text("max_chunk".into()), Value::Integer(Integer::from(*max_chunk))),
            ];
            top.push((Value::Text("meta".into()), Value::Map(meta)));
        }
        Frame::RelayState { payload, .. } => {
            top.push((Value::Text("payload".into()), Value::Bytes(payload.clone())));
        }
    }

    Value::Map(top)
}

fn value_to_frame(map: &[(String, Value)]) -> Result<Frame, CodecError> {
    let version = req_u64(map, "version")?;
    if version != WIRE_VERSION {
        return Err(CodecError::VersionMismatch { found: version });
    }
    let frame_type_num = req_u64(map, "frame_type")?;
    let frame_type = FrameType::try_from(frame_type_num as u8)
        .map_err(|_| CodecError::from(MalformedReason::UnknownFrameType(frame_type_num)))?;
    let id = decode_message_id(map)?;
    let seq = req_u64(map, "seq").unwrap_or(0);

    let frame = match frame_type {
        FrameType::Hello => {
            let meta = nested_meta(map)?;
            Frame::Hello {
                id,
                seq,
                max_frame: req_u64(&meta, "max_frame")?,
                max_chunk: req_u64(&meta, "max_chunk")?,
                version: req_u64(&meta, "version")?,
                manifest: find(&meta, "manifest").and_then(as_bytes).map(<[u8]>::to_vec),
            }
        }
        FrameType::Req => Frame::Req {
            id,
            seq,
            cap: req_str(map, "cap")?,
            payload: req_bytes(map, "payload")?,
            content_type: find(map, "content_type").and_then(as_str).map(str::to_string),
        },
        FrameType::Chunk => Frame::Chunk {
            id,
            seq,
            stream_id: req_str(map, "stream_id")?,
            payload: req_bytes(map, "payload")?,
        },
        FrameType::End => Frame::End {
            id,
            seq,
            eof: req_bool(map, "eof", true)?,
            payload: find(map, "payload").and_then(as_bytes).map(<[u8]>::to_vec),
        },
        FrameType::Log => {
            let meta = nested_meta(map)?;
            Frame::Log { id, seq, level: req_str(&meta, "level")?, message: req_str(&meta, "message")? }
        }
        FrameType::Err => {
            let meta = nested_meta(map)?;
            Frame::Err { id, seq, code: req_str(&meta, "code")?, message: req_str(&meta, "message")? }
        }
        FrameType::Heartbeat => Frame::Heartbeat { id, seq },
        FrameType::StreamStart => Frame::StreamStart {
            id,
            seq,
            stream_id: req_str(map, "stream_id")?,
            media_urn: req_str(map, "media_urn")?,
        },
        FrameType::StreamEnd => Frame::StreamEnd { id, seq, stream_id: req_str(map, "stream_id")? },
        FrameType::RelayNotify => {
            let meta = nested_meta(map)?;
            Frame::RelayNotify {
                id,
                seq,
                manifest: req_bytes(&meta, "manifest")?,
                max_frame: req_u64(&meta, "max_frame")?,
                max_chunk: req_u64(&meta, "max_chunk")?,
            }
        }
        FrameType::RelayState => Frame::RelayState { id, seq, payload: req_bytes(map, "payload")? },
    };
    Ok(frame)
}
