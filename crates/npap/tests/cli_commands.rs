#![cfg(feature = "cli")]

use std::net::UdpSocket;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::thread;
use std::time::Duration;

use bytes::BytesMut;
use npap::frame::{decode_frame, encode_alert, encode_response, FrameKind};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "npapcli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn npap(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_npap"))
        .args(["--log-level", "error", "--format", "json"])
        .args(args)
        .output()
        .expect("npap should run")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(stdout.trim()).expect("stdout should be json")
}

/// Job alert payload: id 77, 2000 ms, 3 pages, tagged annotation.
fn job_alert_payload() -> Vec<u8> {
    let group = |pid: u8, count: u16| {
        let mut out = vec![pid, 0];
        out.extend_from_slice(&count.to_be_bytes());
        out.extend_from_slice(&[0, 0]);
        out
    };
    let integer = |pid: u8, value: i32| {
        let mut out = vec![pid, 1, 0, 4];
        out.extend_from_slice(&value.to_be_bytes());
        out
    };

    let note = b"UR: alice HT: printsvc";
    let mut tree = group(1, 1);
    tree.extend(group(1, 2));
    tree.extend(group(1, 3));
    tree.extend(integer(2, 77));
    tree.extend([4, 2, 0, note.len() as u8]);
    tree.extend_from_slice(note);
    tree.extend(integer(7, 2000));
    // .1.1.2.1.1.2.2 = 3 pages
    tree.extend(group(2, 1));
    tree.extend(group(1, 1));
    tree.extend(group(1, 1));
    tree.extend(group(2, 1));
    tree.extend(integer(2, 3));

    let mut payload = vec![0xA5, 0x00, 0x00, 0x50, 0xE0, 0x73, 0x01];
    payload.extend([0, 1]);
    payload.extend([0u8; 10]);
    payload.extend([0x00, 0x01]);
    payload.extend([0u8; 34]);
    payload.extend(tree);
    payload
}

#[test]
fn decode_hex_payload_reports_job() {
    let dir = unique_temp_dir("decode-hex");
    let file = dir.join("alert.hex");
    std::fs::write(&file, hex::encode(job_alert_payload())).expect("capture should be writable");

    let output = npap(&["decode", file.to_str().unwrap(), "--hex"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let json = stdout_json(&output);
    assert_eq!(json["object"], "e0.73.01");
    assert_eq!(json["job_alert"], true);
    assert_eq!(json["parameters"][".1.1.1.7"], "2000");
    assert_eq!(json["job"]["job_id"], "77");
    assert_eq!(json["job"]["pages"], 3);
    assert_eq!(json["job"]["user"], "alice");
    assert_eq!(json["job"]["service"], "printsvc");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn decode_raw_datagram_strips_alert_header() {
    let dir = unique_temp_dir("decode-raw");
    let file = dir.join("alert.bin");
    let mut datagram = BytesMut::new();
    encode_alert(0x0031, 5, &job_alert_payload(), &mut datagram);
    std::fs::write(&file, &datagram).expect("capture should be writable");

    let output = npap(&["decode", file.to_str().unwrap(), "--datagram"]);
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["job"]["duration_ms"], 2000);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn decode_non_alert_datagram_returns_60() {
    let dir = unique_temp_dir("decode-ack");
    let file = dir.join("ack.hex");
    std::fs::write(&file, "01 03 00 31 00 01").expect("capture should be writable");

    let output = npap(&["decode", file.to_str().unwrap(), "--hex", "--datagram"]);
    assert_eq!(output.status.code(), Some(60));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn subscribe_against_silent_printer_returns_124() {
    let printer = UdpSocket::bind("127.0.0.1:0").expect("mock printer should bind");
    let port = printer.local_addr().unwrap().port().to_string();

    let output = npap(&["subscribe", "127.0.0.1", "--port", &port, "--timeout", "300ms"]);
    assert_eq!(output.status.code(), Some(124));
}

#[test]
fn subscribe_negotiates_with_printer() {
    let printer = UdpSocket::bind("127.0.0.1:0").expect("mock printer should bind");
    printer
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let port = printer.local_addr().unwrap().port().to_string();

    let mock = thread::spawn(move || {
        // Discovery with both feature bits, then generic-enable and the mask.
        let mut features = vec![0xA5, 0x00, 0x08, 0x50, 0xE0, 0x73, 0x04, 0x00, 0x00, 0x11, 0x00];
        let mut buf = [0u8; 512];
        for sequence in 1..=3u16 {
            let (len, from) = printer.recv_from(&mut buf).expect("command should arrive");
            let command = decode_frame(&buf[..len]).expect("command should decode");
            assert_eq!(command.kind, FrameKind::Command);

            let mut reply = BytesMut::new();
            encode_response(0x0100, sequence, command.packet_id.unwrap(), &features, &mut reply);
            printer.send_to(&reply, from).unwrap();
            features.clear();

            let (len, _) = printer.recv_from(&mut buf).expect("ack should arrive");
            assert_eq!(decode_frame(&buf[..len]).unwrap().kind, FrameKind::Ack);
        }
    });

    let output = npap(&["subscribe", "127.0.0.1", "--port", &port, "--timeout", "2s"]);
    mock.join().expect("mock printer should finish");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let json = stdout_json(&output);
    assert_eq!(json["event"], "subscribed");
    assert_eq!(json["feature_flag"], 0x11);
    assert_eq!(json["commands_sent"], 3);
    assert_eq!(json["commands_acknowledged"], 3);
}
