//! Trace loader tests: on-disk round trip and error reporting.

use std::io::Write;

use lsu_core::sim::trace::{TraceError, TraceKind, load_trace};
use tempfile::NamedTempFile;

#[test]
fn loads_a_trace_from_disk() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[
            {{ "kind": "load", "accesses": [ {{ "addr": 4096, "size": 8 }} ] }},
            {{ "kind": "store-barrier" }},
            {{ "kind": "fence", "latency": 2 }}
        ]"#
    )
    .unwrap();

    let ops = load_trace(file.path()).unwrap();
    assert_eq!(ops.len(), 3);
    assert_eq!(ops[0].kind, TraceKind::Load);
    assert_eq!(ops[0].accesses[0].addr, 4096);
    assert_eq!(ops[1].kind, TraceKind::StoreBarrier);
    assert!(ops[1].accesses.is_empty());
    assert_eq!(ops[2].latency, Some(2));
}

#[test]
fn malformed_trace_reports_parse_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"[ {{ "kind": "teleport" }} ]"#).unwrap();

    match load_trace(file.path()) {
        Err(TraceError::Parse(_)) => {}
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn missing_file_reports_io_error() {
    match load_trace("/nonexistent/trace.json") {
        Err(TraceError::Io(_)) => {}
        other => panic!("expected an I/O error, got {other:?}"),
    }
}
