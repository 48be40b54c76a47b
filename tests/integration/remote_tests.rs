use memfs::loader::{LoadError, Loader, Origin};
use memfs::source::SourceReader;
use memfs::store::MemoryStore;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Serve one canned response on loopback. The handle yields the request line.
fn serve_once(status: &'static str, body: Vec<u8>) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();
        let mut header = String::new();
        while reader.read_line(&mut header).unwrap() > 2 {
            header.clear();
        }

        let head = format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        // The client may hang up early on an error status or oversized body
        let _ = stream.write_all(head.as_bytes());
        let _ = stream.write_all(&body);
        let _ = stream.flush();

        request_line.trim_end().to_string()
    });

    (base, handle)
}

fn reader() -> SourceReader {
    SourceReader::new(Duration::from_secs(5))
}

#[test]
fn test_remote_load_is_normalized_and_percent_encoded() {
    let (base, server) = serve_once("200 OK", b"<?php echo 1;".to_vec());
    let id = format!("{base}/my lib.php");

    let loader = Loader::new(MemoryStore::new()).with_reader(reader());
    let outcome = loader.load(&[&id], true).unwrap();

    assert_eq!(server.join().unwrap(), "GET /my%20lib.php HTTP/1.1");
    assert_eq!(outcome.resources[0].identifier, id);
    assert_eq!(outcome.resources[0].content, "<?php echo 1;\n?>\n");
    assert_eq!(outcome.resources[0].origin, Origin::Source);

    // Served from the pool; the server is gone
    let again = loader.load(&[&id], true).unwrap();
    assert_eq!(again.resources[0].origin, Origin::Cache);
}

#[test]
fn test_remote_error_status_is_unavailable() {
    let (base, server) = serve_once("404 Not Found", b"<?php missing();".to_vec());
    let id = format!("{base}/gone.php");

    let loader = Loader::new(MemoryStore::new()).with_reader(reader());
    match loader.load(&[&id], true) {
        Err(LoadError::ResourceUnavailable { identifier, reason }) => {
            assert_eq!(identifier, id);
            assert!(reason.contains("404"), "unexpected reason: {reason}");
        }
        other => panic!("Expected ResourceUnavailable, got {:?}", other),
    }
    server.join().unwrap();
    assert!(loader.store().is_empty().unwrap());
}

#[test]
fn test_remote_body_over_limit_is_unavailable() {
    let body = format!("<?php {}", "x".repeat(256)).into_bytes();
    let (base, server) = serve_once("200 OK", body);
    let id = format!("{base}/big.php");

    let loader = Loader::new(MemoryStore::new()).with_reader(reader().with_body_limit(64));
    let outcome = loader.load(&[&id], false).unwrap();
    server.join().unwrap();

    assert!(outcome.is_empty());
    assert_eq!(outcome.skipped[0].identifier, id);
    assert!(loader.store().is_empty().unwrap());
}
