//! Fuzz target for IRC line parsing
//!
//! Feeds arbitrary bytes to the scanner and parser, and through the line
//! codec, ensuring nothing panics. Lines that parse must round-trip.

#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use slirc_proto::{parse, Line, LineCodec};
use tokio_util::codec::Decoder;

fuzz_target!(|data: &[u8]| {
    if data.len() > 8191 {
        return;
    }

    // Raw bytes straight into the grammar - should never panic
    if let Ok(msg) = parse(data) {
        let wire = msg.to_line();
        let reparsed = parse(wire.as_bytes()).expect("parsed message must re-parse");
        assert_eq!(reparsed, msg);
    }

    // Framing then parsing, as a session does
    let mut codec = LineCodec::with_max_len(64);
    let mut buf = BytesMut::from(data);
    while let Ok(Some(line)) = codec.decode_eof(&mut buf) {
        if let Line::Complete(line) = line {
            let _ = parse(&line);
        }
    }

    let _ = LineCodec::frame(data);
});
