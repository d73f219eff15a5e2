//! Smallest possible capability provider: registers `cap:op=echo`, which
//! returns its request payload unchanged, and drives one request/response
//! round trip over an in-process duplex connection.

use std::sync::Arc;

use tokio::io::duplex;
use tracing::info;

use cpc::registry::{Cap, CapabilityRegistry};
use cpc::transport::{chunk_payload, Limits, DEFAULT_STREAM};
use cpc::urn::CapUrn;
use cpc::{Connection, Event};
use cpc_protocol::{Frame, MessageId};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let registry = Arc::new(CapabilityRegistry::new());
    registry.register(
        "echo-plugin",
        vec![Cap {
            urn: CapUrn::parse("cap:op=echo").unwrap(),
            title: "Echo".into(),
            command: "echo".into(),
            description: Some("Returns the request payload unchanged".into()),
            args: vec![],
            output: None,
            media_specs: vec![],
            registered_by: Some("echo-plugin".into()),
        }],
    );

    let (host_io, plugin_io) = duplex(1 << 16);

    let plugin = tokio::spawn(async move {
        let conn = Connection::accept(plugin_io, Limits::default(), None, registry).await.unwrap();
        loop {
            match conn.recv_event().await.unwrap() {
                Some(Event::Request { id, payload, matched, .. }) => {
                    info!(provider = %matched.provider, "echoing {} bytes", payload.len());
                    for frame in chunk_payload(id, DEFAULT_STREAM, &payload, Limits::default().max_chunk) {
                        conn.send_frame(&frame).await.unwrap();
                    }
                }
                Some(Event::NoProvider { cap, .. }) => info!(%cap, "no provider"),
                Some(Event::Frame(_)) | None => break,
            }
        }
    });

    let host = Connection::connect(host_io, Limits::default(), Arc::new(CapabilityRegistry::new())).await.unwrap();
    let id = MessageId::new_uuid();
    host.send_frame(&Frame::Req { id, seq: 0, cap: "cap:op=echo".into(), payload: b"hello, plugin".to_vec(), content_type: None })
        .await
        .unwrap();

    let mut reply = Vec::new();
    loop {
        match host.recv_event().await.unwrap() {
            Some(Event::Frame(Frame::Chunk { payload, .. })) => reply.extend_from_slice(&payload),
            Some(Event::Frame(Frame::End { payload: Some(payload), eof: true, .. })) => {
                reply.extend_from_slice(&payload);
                break;
            }
            other => panic!("unexpected event while awaiting echo reply: {other:?}"),
        }
    }
    info!(reply = %String::from_utf8_lossy(&reply), "round trip complete");

    drop(host);
    plugin.await.unwrap();
}
