use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use cpc_protocol::{codec, Frame, MessageId};

use crate::error::TransportError;
use crate::limits::{Limits, HARD_LIMIT};

/// The stream ID used when a terminal payload is chunked outside of an
/// explicit `STREAM_START`/`STREAM_END` pair (the "legacy" single-response
/// chunking path described in §4.4).
pub const DEFAULT_STREAM: &str = "__default__";

/// Read one length-prefixed frame from `reader`.
///
/// A clean EOF before any prefix byte is read returns `Ok(None)` (orderly
/// termination); EOF mid-prefix or mid-body is [`TransportError::Truncated`].
pub async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
    limits: &Limits,
) -> Result<Option<Frame>, TransportError> {
    let mut len_buf = [0u8; 4];
    match read_exact_or_eof(reader, &mut len_buf).await? {
        EofKind::CleanEof => return Ok(None),
        EofKind::Truncated => return Err(TransportError::Truncated),
        EofKind::Full => {}
    }
    let len = u32::from_be_bytes(len_buf) as u64;
    if len > HARD_LIMIT {
        return Err(TransportError::HardLimitExceeded { size: len });
    }
    if len > limits.max_frame {
        return Err(TransportError::FrameTooLarge { size: len, max_frame: limits.max_frame });
    }

    let mut body = vec![0u8; len as usize];
    reader.read_exact(&mut body).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            TransportError::Truncated
        } else {
            TransportError::Io(e)
        }
    })?;

    let frame = codec::decode(&body)?;
    Ok(Some(frame))
}

enum EofKind {
    Full,
    CleanEof,
    Truncated,
}

/// Like `read_exact`, but distinguishes a clean EOF at the very start of
/// the buffer from one that occurs partway through.
async fn read_exact_or_eof<R: AsyncRead + Unpin>(
    reader: &mut R,
    buf: &mut [u8],
) -> Result<EofKind, TransportError> {
    let mut read = 0;
    while read < buf.len() {
        let n = reader.read(&mut buf[read..]).await.map_err(TransportError::Io)?;
        if n == 0 {
            return Ok(if read == 0 { EofKind::CleanEof } else { EofKind::Truncated });
        }
        read += n;
    }
    Ok(EofKind::Full)
}

/// Encode and write one frame, length-prefixed. Rejects frames that would
/// exceed the negotiated or hard limit without writing anything.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    frame: &Frame,
    limits: &Limits,
) -> Result<(), TransportError> {
    let body = codec::encode(frame)?;
    let len = body.len() as u64;
    if len > HARD_LIMIT {
        return Err(TransportError::HardLimitExceeded { size: len });
    }
    if len > limits.max_frame {
        return Err(TransportError::FrameTooLarge { size: len, max_frame: limits.max_frame });
    }
    writer.write_all(&(len as u32).to_be_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

/// Split a terminal payload into `CHUNK`s plus a final `END`, per §4.4:
/// payloads that already fit in one `max_chunk` go out as a single `END`.
pub fn chunk_payload(id: MessageId, stream_id: &str, payload: &[u8], max_chunk: u64) -> Vec<Frame> {
    let max_chunk = max_chunk.max(1) as usize;
    if payload.len() <= max_chunk {
        return vec![Frame::End { id, seq: 0, eof: true, payload: Some(payload.to_vec()) }];
    }

    let mut frames = Vec::new();
    let mut seq = 0u64;
    let mut offset = 0;
    while payload.len() - offset > max_chunk {
        let end = offset + max_chunk;
        frames.push(Frame::Chunk {
            id,
            seq,
            stream_id: stream_id.to_string(),
            payload: payload[offset..end].to_vec(),
        });
        offset = end;
        seq += 1;
    }
    frames.push(Frame::End { id, seq: 0, eof: true, payload: Some(payload[offset..].to_vec()) });
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn limits() -> Limits {
        Limits { max_frame: 1000, max_chunk: 100 }
    }

    #[tokio::test]
    async fn round_trips_a_single_frame() {
        let frame = Frame::Heartbeat { id: MessageId::sentinel(), seq: 0 };
        let mut buf = Vec::new();
        write_frame(&mut buf, &frame, &limits()).await.unwrap();

        let mut cursor = Cursor::new(buf);
        let read_back = read_frame(&mut cursor, &limits()).await.unwrap();
        assert_eq!(read_back, Some(frame));
    }

    #[tokio::test]
    async fn clean_eof_at_start_is_orderly_termination() {
        let mut cursor = Cursor::new(Vec::<u8>::new());
        let result = read_frame(&mut cursor, &limits()).await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn eof_mid_prefix_is_truncated() {
        let mut cursor = Cursor::new(vec![0u8, 1]);
        let err = read_frame(&mut cursor, &limits()).await.unwrap_err();
        assert!(matches!(err, TransportError::Truncated));
    }

    #[tokio::test]
    async fn eof_mid_body_is_truncated() {
        let frame = Frame::Heartbeat { id: MessageId::sentinel(), seq: 0 };
        let mut buf = Vec::new();
        write_frame(&mut buf, &frame, &limits()).await.unwrap();
        buf.truncate(buf.len() - 1);

        let mut cursor = Cursor::new(buf);
        let err = read_frame(&mut cursor, &limits()).await.unwrap_err();
        assert!(matches!(err, TransportError::Truncated));
    }

    #[tokio::test]
    async fn frame_too_large_is_rejected_before_reading_body() {
        let mut cursor = Cursor::new((2000u32).to_be_bytes().to_vec());
        let err = read_frame(&mut cursor, &limits()).await.unwrap_err();
        assert!(matches!(err, TransportError::FrameTooLarge { .. }));
    }

    #[tokio::test]
    async fn writer_rejects_oversized_frame() {
        let frame = Frame::Req {
            id: MessageId::new_uuid(),
            seq: 0,
            cap: "cap:".into(),
            payload: vec![0; 5000],
            content_type: None,
        };
        let mut buf = Vec::new();
        let err = write_frame(&mut buf, &frame, &limits()).await.unwrap_err();
        assert!(matches!(err, TransportError::FrameTooLarge { .. }));
        assert!(buf.is_empty());
    }

    #[test]
    fn small_payload_emits_single_end() {
        let frames = chunk_payload(MessageId::sentinel(), DEFAULT_STREAM, &[1, 2, 3], 100);
        assert_eq!(frames.len(), 1);
        assert!(matches!(&frames[0], Frame::End { payload: Some(p), .. } if p == &[1, 2, 3]));
    }

    #[test]
    fn large_payload_is_chunked_with_increasing_seq_and_final_end() {
        let payload = vec![7u8; 250];
        let frames = chunk_payload(MessageId::sentinel(), DEFAULT_STREAM, &payload, 100);
        assert_eq!(frames.len(), 3);
        match &frames[0] {
            Frame::Chunk { seq, payload, stream_id, .. } => {
                assert_eq!(*seq, 0);
                assert_eq!(payload.len(), 100);
                assert_eq!(stream_id, DEFAULT_STREAM);
            }
            other => panic!("expected Chunk, got {other:?}"),
        }
        match &frames[1] {
            Frame::Chunk { seq, payload, .. } => {
                assert_eq!(*seq, 1);
                assert_eq!(payload.len(), 100);
            }
            other => panic!("expected Chunk, got {other:?}"),
        }
        match &frames[2] {
            Frame::End { payload: Some(p), .. } => assert_eq!(p.len(), 50),
            other => panic!("expected End, got {other:?}"),
        }

        let mut reassembled = Vec::new();
        for frame in &frames {
            match frame {
                Frame::Chunk { payload, .. } => reassembled.extend_from_slice(payload),
                Frame::End { payload: Some(p), .. } => reassembled.extend_from_slice(p),
                _ => {}
            }
        }
        assert_eq!(reassembled, payload);
    }
}
