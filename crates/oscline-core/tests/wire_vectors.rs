//! Wire-format vector tests: messages, bundles, and malformed datagrams.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use oscline_core::protocol::packet::{dispatch, Packet};
use oscline_core::{MessageParser, Result};

use vector_loader::load;

/// Decode every argument of a message into its display form.
fn render_args(mut m: MessageParser<'_>) -> Result<Vec<String>> {
    let mut out = Vec::new();
    while let Some(arg) = m.next_argument()? {
        out.push(arg.to_string());
    }
    Ok(out)
}

/// Classify, flatten, and fully decode a datagram.
fn decode_all(raw: &[u8]) -> Result<Vec<(String, String, Vec<String>)>> {
    let packet = Packet::new(raw)?;
    let mut messages = Vec::new();
    let mut arg_error = None;
    dispatch(packet, |m| {
        let address = String::from_utf8_lossy(m.address()).into_owned();
        let types = String::from_utf8_lossy(m.type_string()).into_owned();
        match render_args(m) {
            Ok(args) => messages.push((address, types, args)),
            Err(e) => arg_error = Some(e),
        }
    })?;
    match arg_error {
        Some(e) => Err(e),
        None => Ok(messages),
    }
}

#[test]
fn message_vectors() {
    let files = [
        "msg_synth_freq.json",
        "msg_mixed.json",
        "msg_array.json",
        "msg_no_type_string.json",
        "msg_address_unterminated.json",
        "msg_truncated_int.json",
        "packet_unknown_classifier.json",
    ];

    for f in files {
        let v = load(f);
        let res = decode_all(&v.frame.decode());

        if let Some(err) = v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(e.code().as_str(), err.code, "vector={}", v.description);
            continue;
        }

        let messages = res.expect("expected ok packet");
        let ex = v.expect.expect("missing expect block");
        assert_eq!(messages.len(), 1, "vector={}", v.description);

        let (address, types, args) = &messages[0];
        assert_eq!(address, ex["address"].as_str().unwrap(), "vector={}", v.description);
        assert_eq!(types, ex["types"].as_str().unwrap(), "vector={}", v.description);

        let want: Vec<&str> = ex["args"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a.as_str().unwrap())
            .collect();
        assert_eq!(args, &want, "vector={}", v.description);
    }
}

#[test]
fn bundle_vectors() {
    let files = [
        "bundle_empty.json",
        "bundle_nested.json",
        "bundle_bad_identifier.json",
        "bundle_element_overrun.json",
    ];

    for f in files {
        let v = load(f);
        let raw = v.frame.decode();
        let res = decode_all(&raw);

        if let Some(err) = v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(e.code().as_str(), err.code, "vector={}", v.description);
            continue;
        }

        let messages = res.expect("expected ok bundle");
        let ex = v.expect.expect("missing expect block");

        let bundle = Packet::new(&raw).unwrap().as_bundle().unwrap();
        assert_eq!(bundle.timestamp(), ex["timestamp"].as_u64().unwrap(), "vector={}", v.description);

        let got: Vec<&str> = messages.iter().map(|(a, _, _)| a.as_str()).collect();
        let want: Vec<&str> = ex["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a.as_str().unwrap())
            .collect();
        assert_eq!(got, want, "vector={}", v.description);
    }
}
