// Integration tests for error types in taskpool_api::errors

use std::io;
use std::error::Error;

use taskpool_api::errors::*;

#[test]
fn test_sink_error_display() {
    let missing = io::Error::new(io::ErrorKind::NotFound, "no such directory");
    let err = SinkError::io("out/results.txt", missing);
    assert_eq!(err.to_string(), "Failed to append to out/results.txt: no such directory");
    assert_eq!(SinkError::Closed.to_string(), "Result sink is closed");
    let malformed = SinkError::MalformedLine {
        line: "a\nb".to_string(),
    };
    assert_eq!(
        malformed.to_string(),
        "Refusing to append a line containing a line break: \"a\\nb\""
    );
}

#[test]
fn test_sink_error_keeps_io_source() {
    let denied = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
    let err = SinkError::io("results.txt", denied);
    let source = err.source().expect("io source should be chained");
    assert_eq!(source.to_string(), "denied");
}

#[test]
fn test_process_error_display() {
    assert_eq!(ProcessError::Interrupted.to_string(), "Processing interrupted");
    assert_eq!(
        ProcessError::Failed("bad payload".to_string()).to_string(),
        "Processing failed: bad payload"
    );
}
