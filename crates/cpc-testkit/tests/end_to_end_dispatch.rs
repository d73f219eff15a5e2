//! End-to-end: a full connection, over `tokio::io::duplex`, dispatching a
//! request through the registry and replying with a chunked payload —
//! the same path a real client/server pair would take, combining S2 and
//! S3 at the `cpc::Connection` layer instead of the bare transport layer.

use std::sync::Arc;

use tokio::io::duplex;

use cpc::registry::{Cap, CapabilityRegistry};
use cpc::transport::{chunk_payload, Limits, DEFAULT_STREAM};
use cpc::urn::CapUrn;
use cpc::{Connection, Event};
use cpc_protocol::{Frame, MessageId};

const PDF_THUMBNAIL: &str = r#"cap:in="media:pdf";op=generate_thumbnail;out="media:image;png;thumbnail""#;
const GENERIC_THUMBNAIL: &str = r#"cap:in="media:";op=generate_thumbnail;out="media:image;png;thumbnail""#;

fn cap(urn: &str, provider: &str) -> Cap {
    Cap {
        urn: CapUrn::parse(urn).unwrap(),
        title: format!("{provider} thumbnailer"),
        command: "thumbnail".into(),
        description: None,
        args: vec![],
        output: None,
        media_specs: vec![],
        registered_by: Some(provider.to_string()),
    }
}

#[tokio::test]
async fn request_is_routed_and_chunked_reply_reassembles() {
    let (client_io, server_io) = duplex(1 << 16);

    let server_registry = Arc::new(CapabilityRegistry::new());
    server_registry.register("generic-thumbnailer", vec![cap(GENERIC_THUMBNAIL, "generic-thumbnailer")]);
    server_registry.register("pdf-thumbnailer", vec![cap(PDF_THUMBNAIL, "pdf-thumbnailer")]);

    let client_task =
        tokio::spawn(async move { Connection::connect(client_io, Limits::default(), Arc::new(CapabilityRegistry::new())).await });
    let server_task =
        tokio::spawn(async move { Connection::accept(server_io, Limits::default(), None, server_registry).await });

    let client = client_task.await.unwrap().unwrap();
    let server = server_task.await.unwrap().unwrap();

    let id = MessageId::new_uuid();
    client
        .send_frame(&Frame::Req { id, seq: 0, cap: PDF_THUMBNAIL.into(), payload: vec![], content_type: None })
        .await
        .unwrap();

    let matched = match server.recv_event().await.unwrap().unwrap() {
        Event::Request { matched, .. } => matched,
        other => panic!("expected Event::Request, got {other:?}"),
    };
    assert_eq!(matched.provider, "pdf-thumbnailer");

    let reply_payload = vec![0xAAu8; 250];
    for frame in chunk_payload(id, DEFAULT_STREAM, &reply_payload, 100) {
        server.send_frame(&frame).await.unwrap();
    }

    let mut reassembled = Vec::new();
    loop {
        match client.recv_event().await.unwrap().unwrap() {
            Event::Frame(Frame::Chunk { payload, .. }) => reassembled.extend_from_slice(&payload),
            Event::Frame(Frame::End { payload: Some(payload), eof: true, .. }) => {
                reassembled.extend_from_slice(&payload);
                break;
            }
            other => panic!("unexpected event while reassembling reply: {other:?}"),
        }
    }
    assert_eq!(reassembled, reply_payload);
}
