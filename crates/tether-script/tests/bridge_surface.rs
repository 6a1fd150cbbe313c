//! End-to-end coverage of the bridge surface: script source goes in, the
//! envelopes a destination runtime would see come out of an in-memory hub.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;

use tether_dispatch::{MessageHub, RuntimeLink};
use tether_script::{Port, ScriptContext, thread_runtime};
use tether_wire::{ChannelHandle, Envelope, HeapAlloc, OpKind, SharedStr, TypeDesc};

fn wired_context() -> (Arc<MessageHub>, UnboundedReceiver<Envelope>, ScriptContext) {
    let hub = Arc::new(MessageHub::new());
    let (channel, inbox) = hub.register_port();

    let runtime = thread_runtime(64 * 1024 * 1024);
    let mut ctx = runtime.create_context();
    ctx.set_message_channel(channel, TypeDesc::ENVELOPE, hub.clone(), Arc::new(HeapAlloc));

    (hub, inbox, ctx)
}

#[test]
fn connect_then_close_reuses_the_connect_id() {
    let (_hub, mut inbox, mut ctx) = wired_context();

    let id = ctx
        .eval(r#"let id = connect("host:1234"); close(id); id"#)
        .unwrap()
        .as_int()
        .unwrap();

    let connect = inbox.try_recv().unwrap();
    assert_eq!(connect.op, OpKind::Connect);
    assert_eq!(connect.payload.text(), "host:1234");
    assert_eq!(i64::from(connect.correlation_id), id);
    assert_eq!(connect.timeout_ms, 0);

    let close = inbox.try_recv().unwrap();
    assert_eq!(close.op, OpKind::Close);
    assert_eq!(close.payload.text(), "");
    assert_eq!(close.correlation_id, connect.correlation_id);
    assert_eq!(close.timeout_ms, 0);

    assert!(inbox.try_recv().is_err());
}

#[test]
fn send_and_recv_carry_the_caller_id() {
    let (_hub, mut inbox, mut ctx) = wired_context();

    ctx.eval(r#"send(7, "ping"); recv(7, "1024");"#).unwrap();

    let send = inbox.try_recv().unwrap();
    assert_eq!(send.op, OpKind::Send);
    assert_eq!(send.payload.text(), "ping");
    assert_eq!(send.correlation_id, 7);

    let recv = inbox.try_recv().unwrap();
    assert_eq!(recv.op, OpKind::Recv);
    assert_eq!(recv.payload.text(), "1024");
    assert_eq!(recv.correlation_id, 7);
}

#[test]
fn timeout_returns_a_fresh_id_and_carries_the_delay() {
    let (_hub, mut inbox, mut ctx) = wired_context();

    let id = ctx.eval("timeout(1500)").unwrap().as_int().unwrap();

    let time = inbox.try_recv().unwrap();
    assert_eq!(time.op, OpKind::Time);
    assert_eq!(time.payload.text(), "");
    assert_eq!(i64::from(time.correlation_id), id);
    assert_eq!(time.timeout_ms, 1500);
}

#[test]
fn exit_is_uncorrelated() {
    let (_hub, mut inbox, mut ctx) = wired_context();

    ctx.eval("exit();").unwrap();

    let exit = inbox.try_recv().unwrap();
    assert_eq!(exit.op, OpKind::Exit);
    assert_eq!(exit.correlation_id, 0);
    assert_eq!(exit.payload.text(), "");
}

#[test]
fn post_message_passes_the_op_tag_through() {
    let (_hub, mut inbox, mut ctx) = wired_context();

    ctx.eval(r#"post_message(6, "worker.scr"); post_message(7, "peer");"#).unwrap();

    let spawn = inbox.try_recv().unwrap();
    assert_eq!(spawn.op, OpKind::Spawn);
    assert_eq!(spawn.payload.text(), "worker.scr");
    assert_eq!(spawn.correlation_id, 0);

    let cast = inbox.try_recv().unwrap();
    assert_eq!(cast.op, OpKind::Cast);
    assert_eq!(cast.payload.text(), "peer");
    assert_eq!(cast.correlation_id, 0);
}

#[test]
fn post_message_rejects_unknown_op_tags() {
    let (_hub, mut inbox, mut ctx) = wired_context();

    let err = ctx.eval(r#"post_message(42, "x");"#).unwrap_err();
    assert!(err.to_string().contains("unknown operation"));

    // the failed call dispatched nothing; the only traffic is the error
    // route forwarding the uncaught error itself
    let stderr = inbox.try_recv().unwrap();
    assert_eq!(stderr.op, OpKind::Stderr);
    assert!(inbox.try_recv().is_err());
}

#[test]
fn uncaught_error_forwards_exactly_one_stderr() {
    let (_hub, mut inbox, mut ctx) = wired_context();

    assert!(ctx.eval(r#"throw "boom";"#).is_err());

    let stderr = inbox.try_recv().unwrap();
    assert_eq!(stderr.op, OpKind::Stderr);
    assert_eq!(stderr.payload.text(), "boom");
    assert_eq!(stderr.correlation_id, 0);
    assert_eq!(stderr.timeout_ms, 0);

    assert!(inbox.try_recv().is_err());
}

#[test]
fn caught_read_file_failure_dispatches_nothing() {
    let (_hub, mut inbox, mut ctx) = wired_context();

    ctx.eval(r#"try { read_file("/definitely/not/here"); } catch (e) { }"#).unwrap();

    assert!(inbox.try_recv().is_err());
}

#[test]
fn uncaught_read_file_failure_reaches_the_error_route() {
    let (_hub, mut inbox, mut ctx) = wired_context();

    assert!(ctx.eval(r#"read_file("/definitely/not/here")"#).is_err());

    let stderr = inbox.try_recv().unwrap();
    assert_eq!(stderr.op, OpKind::Stderr);
    assert!(stderr.payload.text().contains("can't open"));
}

#[test]
fn read_file_returns_file_text() {
    let (_hub, _inbox, mut ctx) = wired_context();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("greeting.txt");
    std::fs::write(&path, "hello from disk").unwrap();

    let script = format!(r#"read_file("{}")"#, path.display());
    let text = ctx.eval(&script).unwrap().into_string().unwrap();
    assert_eq!(text, "hello from disk");
}

#[test]
fn ports_open_on_construction_and_close_on_drop() {
    let (hub, _inbox, mut ctx) = wired_context();

    let port: Port = ctx.eval("Port()").unwrap().try_cast().unwrap();
    let id = port.id();

    // the receiver was parked by open_port and is claimable exactly once
    assert!(hub.take_receiver(id).is_some());

    drop(port);
    let dest = ChannelHandle::new(hub.task(), id);
    let probe = Envelope::new(OpKind::Cast, SharedStr::marshal(&HeapAlloc, "").unwrap(), 0, 0);
    assert!(hub.send(&TypeDesc::ENVELOPE, dest, probe).is_err());
}

#[test]
fn port_channel_is_not_implemented() {
    let (_hub, mut inbox, mut ctx) = wired_context();

    let err = ctx.eval("let p = Port(); p.channel()").unwrap_err();
    assert!(err.to_string().contains("not implemented"));

    // drain the forwarded error so the assertion above is the whole story
    assert_eq!(inbox.try_recv().unwrap().op, OpKind::Stderr);
}

#[test]
fn out_of_range_arguments_are_script_errors() {
    let (_hub, mut inbox, mut ctx) = wired_context();

    let err = ctx.eval("close(-1);").unwrap_err();
    assert!(err.to_string().contains("out of range"));
    assert_eq!(inbox.try_recv().unwrap().op, OpKind::Stderr);
    assert!(inbox.try_recv().is_err());

    let err = ctx.eval("timeout(4294967296);").unwrap_err();
    assert!(err.to_string().contains("out of range"));
    assert_eq!(inbox.try_recv().unwrap().op, OpKind::Stderr);
    assert!(inbox.try_recv().is_err());
}

#[test]
fn rewiring_the_channel_redirects_traffic() {
    let (hub, mut old_inbox, mut ctx) = wired_context();

    let (new_channel, mut new_inbox) = hub.register_port();
    ctx.set_message_channel(new_channel, TypeDesc::ENVELOPE, hub.clone(), Arc::new(HeapAlloc));

    ctx.eval(r#"connect("elsewhere:1");"#).unwrap();

    assert!(old_inbox.try_recv().is_err());
    assert_eq!(new_inbox.try_recv().unwrap().payload.text(), "elsewhere:1");
}

#[test]
fn correlation_ids_stay_distinct_across_worker_threads() {
    let handles: Vec<_> = (0..4)
        .map(|_| {
            std::thread::spawn(|| {
                let (_hub, mut inbox, mut ctx) = wired_context();
                let ids = ctx
                    .eval(
                        r#"
                        let ids = [];
                        for i in 0..25 {
                            ids.push(connect("peer"));
                        }
                        ids
                        "#,
                    )
                    .unwrap()
                    .into_array()
                    .unwrap();

                let ids: Vec<i64> = ids.into_iter().map(|v| v.as_int().unwrap()).collect();
                // per-thread resolution order is strictly increasing
                assert!(ids.windows(2).all(|w| w[0] < w[1]));

                // every envelope carries the id the script was handed back
                for id in &ids {
                    assert_eq!(i64::from(inbox.try_recv().unwrap().correlation_id), *id);
                }
                ids
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for id in handle.join().expect("worker thread panicked") {
            assert!(seen.insert(id), "correlation id {id} handed out twice");
        }
    }
    assert_eq!(seen.len(), 4 * 25);
}
