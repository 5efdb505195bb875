//! Integration tests for the outbound path: queued writes, direct writes and
//! their failure modes.

mod common;

use common::{Behavior, EventLog, Seen, harness};
use slirc_client::{Message, Plugin, Session, SessionState, WriteFailure};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tokio::time::timeout;

/// Longer than the close grace period, shorter than a hung test.
const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[test]
fn test_writes_arrive_in_order() {
    let (service, mut listener) = harness(Behavior::Accept, |b| b);
    let session = service.connect("irc.test", 6667, Vec::<Arc<dyn Plugin>>::new());

    let lines = service.block_on(async {
        let mut peer = listener.accept().await.unwrap();
        session.write("NICK slirc").unwrap();
        session.write(b"USER slirc 0 * :slirc client").unwrap();
        session.send(&Message::privmsg("#chan", "hello there")).unwrap();
        session.quit(Some("bye")).unwrap();
        let mut lines = Vec::new();
        for _ in 0..4 {
            lines.push(peer.recv().await.unwrap());
        }
        lines
    });

    assert_eq!(
        lines,
        [
            "NICK slirc",
            "USER slirc 0 * :slirc client",
            "PRIVMSG #chan :hello there",
            "QUIT :bye",
        ]
    );
}

#[test]
fn test_writes_before_connect_are_sent_once_connected() {
    let (service, mut listener) = harness(Behavior::Accept, |b| b);
    let session = service.connect("irc.test", 6667, Vec::<Arc<dyn Plugin>>::new());
    assert_eq!(session.state(), SessionState::Resolving);
    session.write("NICK early").unwrap();

    let line = service.block_on(async {
        let mut peer = listener.accept().await.unwrap();
        peer.recv().await.unwrap()
    });

    assert_eq!(line, "NICK early");
}

#[test]
fn test_write_is_cut_at_line_break() {
    let (service, mut listener) = harness(Behavior::Accept, |b| b);
    let session = service.connect("irc.test", 6667, Vec::<Arc<dyn Plugin>>::new());

    let lines = service.block_on(async {
        let mut peer = listener.accept().await.unwrap();
        session.write("PRIVMSG #chan :hi\r\nQUIT :injected").unwrap();
        session.write("").unwrap();
        session.write("PING :next").unwrap();
        [peer.recv().await.unwrap(), peer.recv().await.unwrap()]
    });

    assert_eq!(lines, ["PRIVMSG #chan :hi", "PING :next"]);
}

#[test]
fn test_concurrent_writers_never_interleave() {
    let (service, mut listener) = harness(Behavior::Accept, |b| b.worker_threads(2));
    let session = service.connect("irc.test", 6667, Vec::<Arc<dyn Plugin>>::new());
    let mut peer = service.block_on(async {
        let peer = listener.accept().await.unwrap();
        session.wait_for_state(SessionState::Connected).await;
        peer
    });

    let writers: Vec<_> = ["alpha", "beta"]
        .into_iter()
        .map(|name| {
            let session = Arc::clone(&session);
            std::thread::spawn(move || {
                for i in 0..100 {
                    session
                        .write(format!("PRIVMSG #{name} :{name} {i}"))
                        .unwrap();
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    let lines = service.block_on(async {
        let mut lines = Vec::new();
        for _ in 0..200 {
            lines.push(peer.recv().await.unwrap());
        }
        lines
    });

    let mut next: HashMap<String, u32> = HashMap::new();
    for line in lines {
        let message: Message = line.parse().expect("interleaved line");
        let text = message.text().unwrap();
        let (name, i) = text.split_once(' ').unwrap();
        assert_eq!(message.params, [format!("#{name}")]);
        let expected = next.entry(name.to_string()).or_default();
        assert_eq!(i.parse::<u32>().unwrap(), *expected);
        *expected += 1;
    }
    assert_eq!(next["alpha"], 100);
    assert_eq!(next["beta"], 100);
}

#[test]
fn test_disconnect_flushes_queued_lines() {
    let (service, mut listener) = harness(Behavior::Accept, |b| b);
    let session = service.connect("irc.test", 6667, Vec::<Arc<dyn Plugin>>::new());

    let lines = service.block_on(async {
        let mut peer = listener.accept().await.unwrap();
        session.wait_for_state(SessionState::Connected).await;
        for i in 0..3 {
            session.privmsg("#chan", &i.to_string()).unwrap();
        }
        session.disconnect();

        let mut lines = Vec::new();
        for _ in 0..3 {
            lines.push(peer.recv().await.unwrap());
        }
        peer.expect_eof().await.unwrap();
        lines
    });

    assert_eq!(
        lines,
        ["PRIVMSG #chan :0", "PRIVMSG #chan :1", "PRIVMSG #chan :2"]
    );
}

#[test]
fn test_disconnect_completes_when_peer_stops_reading() {
    let (service, mut listener) = harness(Behavior::Accept, |b| b.worker_threads(2));
    let log = EventLog::new();
    let session = service.connect("irc.test", 6667, [log.recorder("session") as Arc<dyn Plugin>]);

    // The peer stays open but never reads, so the transport fills up.
    let _peer = service.block_on(async {
        let peer = listener.accept().await.unwrap();
        session.wait_for_state(SessionState::Connected).await;
        peer
    });

    let text = "x".repeat(400);
    for _ in 0..1000 {
        session.privmsg("#chan", &text).unwrap();
    }
    session.disconnect();

    let state = service.block_on(async {
        timeout(
            TEARDOWN_TIMEOUT,
            session.wait_for_state(SessionState::Disconnected),
        )
        .await
    });
    assert_eq!(state.ok(), Some(SessionState::Disconnected));
    assert_eq!(log.seen_by("session"), vec![Seen::Connect, Seen::Disconnect]);
    assert_eq!(service.handle().session_count(), 0);
}

#[test]
fn test_blocked_write_sync_fails_on_disconnect() {
    let (service, mut listener) = harness(Behavior::Accept, |b| b.worker_threads(2));
    let session = service.connect("irc.test", 6667, Vec::<Arc<dyn Plugin>>::new());

    let _peer = service.block_on(async {
        let peer = listener.accept().await.unwrap();
        session.wait_for_state(SessionState::Connected).await;
        peer
    });

    // Four times the transport's buffer: the write cannot complete.
    let line = format!("PRIVMSG #chan :{}", "x".repeat(256 * 1024));
    let writer = thread::spawn({
        let session = Arc::clone(&session);
        move || session.write_sync(line)
    });

    thread::sleep(Duration::from_millis(200));
    session.disconnect();

    let outcome = writer.join().unwrap();
    assert!(matches!(outcome, Err(WriteFailure::Closed)));

    let state = service.block_on(async {
        timeout(
            TEARDOWN_TIMEOUT,
            session.wait_for_state(SessionState::Disconnected),
        )
        .await
    });
    assert_eq!(state.ok(), Some(SessionState::Disconnected));
}

#[test]
fn test_write_after_disconnect_is_closed() {
    let (service, mut listener) = harness(Behavior::Accept, |b| b);
    let session = service.connect("irc.test", 6667, Vec::<Arc<dyn Plugin>>::new());

    service.block_on(async {
        let _peer = listener.accept().await.unwrap();
        session.wait_for_state(SessionState::Connected).await;
        session.disconnect();
    });

    assert!(matches!(session.write("PING :x"), Err(WriteFailure::Closed)));
    assert!(matches!(session.notice("#chan", "x"), Err(WriteFailure::Closed)));
    assert!(matches!(session.write_sync("PING :x"), Err(WriteFailure::Closed)));

    service.block_on(session.wait_for_state(SessionState::Disconnected));
    assert!(matches!(session.pong("x"), Err(WriteFailure::Closed)));
}

#[test]
fn test_write_sync_from_outside_the_runtime() {
    let (service, mut listener) = harness(Behavior::Accept, |b| b.worker_threads(1));
    let session = service.connect("irc.test", 6667, Vec::<Arc<dyn Plugin>>::new());

    let mut peer = service.block_on(async {
        let peer = listener.accept().await.unwrap();
        session.wait_for_state(SessionState::Connected).await;
        peer
    });

    session.write_sync("PRIVMSG #chan :direct").unwrap();

    let line = service.block_on(peer.recv()).unwrap();
    assert_eq!(line, "PRIVMSG #chan :direct");
}

/// Tries a blocking write from inside a callback.
#[derive(Default)]
struct BlockingWriter {
    outcome: Mutex<Option<Result<(), WriteFailure>>>,
}

impl Plugin for BlockingWriter {
    fn on_connect(&self, session: &Session) {
        *self.outcome.lock().unwrap() = Some(session.write_sync("NICK blocked"));
    }
}

#[test]
fn test_write_sync_refused_on_runtime_thread() {
    let (service, mut listener) = harness(Behavior::Accept, |b| b);
    let plugin = Arc::new(BlockingWriter::default());
    let session = service.connect(
        "irc.test",
        6667,
        [Arc::clone(&plugin) as Arc<dyn Plugin>],
    );

    service.block_on(async {
        let _peer = listener.accept().await.unwrap();
        session.wait_for_state(SessionState::Connected).await;
        tokio::task::yield_now().await;
        assert!(matches!(
            session.write_sync("NICK inside"),
            Err(WriteFailure::BlockingInRuntime)
        ));
    });

    assert!(matches!(
        plugin.outcome.lock().unwrap().take(),
        Some(Err(WriteFailure::BlockingInRuntime))
    ));
}
