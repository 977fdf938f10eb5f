//! Tests de integración para el servidor HTTP
//! tests/integration_test.rs
//!
//! Cada test levanta su propio servidor en `127.0.0.1:0` con una raíz
//! estática temporal y le habla HTTP/1.0 crudo.

use spade::clay::WorkerConnection;
use spade::handlers::module::adder_response;
use spade::handlers::ModuleCatalog;
use spade::router::Registry;
use spade::server::{Server, ServerContext};
use std::fs::{self, Permissions};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

/// Helper: levanta un servidor en un puerto efímero
fn start(context: ServerContext) -> SocketAddr {
    let server = Server::bind(context, "127.0.0.1:0").expect("bind");
    let addr = server.local_addr().unwrap();
    thread::spawn(move || {
        let _ = server.run();
    });
    addr
}

/// Helper: envía bytes crudos y retorna la response completa
fn send_raw(addr: SocketAddr, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).expect("connect");
    stream.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
    stream.set_write_timeout(Some(Duration::from_secs(5))).unwrap();

    stream.write_all(raw.as_bytes()).unwrap();
    stream.flush().unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

/// Helper: envía un GET
fn send_request(addr: SocketAddr, path: &str) -> String {
    send_raw(addr, &format!("GET {} HTTP/1.0\r\n\r\n", path))
}

/// Helper: extrae el body de una response HTTP
fn extract_body(response: &str) -> &str {
    match response.find("\r\n\r\n") {
        Some(pos) => &response[pos + 4..],
        None => "",
    }
}

fn document_root() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("hello.txt"), "hello world").unwrap();
    fs::write(dir.path().join("logo.gif"), [0x47u8, 0x49, 0x46, 0x38]).unwrap();
    fs::create_dir(dir.path().join("site")).unwrap();
    fs::write(dir.path().join("site/index.html"), "<h1>site</h1>").unwrap();
    fs::write(dir.path().join("locked.txt"), "secret").unwrap();
    fs::set_permissions(dir.path().join("locked.txt"), Permissions::from_mode(0o000)).unwrap();
    dir
}

fn context_with(root: &Path, registry: Registry) -> ServerContext {
    ServerContext::new("spade-test", 8080, root.to_path_buf(), registry)
}

#[test]
fn test_static_file() {
    let root = document_root();
    let addr = start(context_with(root.path(), Registry::new()));

    let response = send_request(addr, "/hello.txt");
    assert!(response.starts_with("HTTP/1.0 200 OK\r\n"), "got: {}", response);
    assert!(response.contains("Content-Type: text/plain\r\n"));
    assert!(response.contains("Content-Length: 11\r\n"));
    assert_eq!(extract_body(&response), "hello world");

    let response = send_request(addr, "/logo.gif");
    assert!(response.contains("Content-Type: image/gif\r\n"));
}

#[test]
fn test_directory_index() {
    let root = document_root();
    let addr = start(context_with(root.path(), Registry::new()));

    let response = send_request(addr, "/site");
    assert!(response.starts_with("HTTP/1.0 200 OK\r\n"));
    assert!(response.contains("Content-Type: text/html\r\n"));
    assert_eq!(extract_body(&response), "<h1>site</h1>");
}

#[test]
fn test_not_found_and_forbidden() {
    let root = document_root();
    let addr = start(context_with(root.path(), Registry::new()));

    let response = send_request(addr, "/missing.html");
    assert!(response.starts_with("HTTP/1.0 404 Not Found\r\n"), "got: {}", response);
    assert!(extract_body(&response).contains("Spade Error"));

    let response = send_request(addr, "/locked.txt");
    assert!(response.starts_with("HTTP/1.0 403 Forbidden\r\n"), "got: {}", response);
}

#[test]
fn test_query_on_static_path() {
    let root = document_root();
    let addr = start(context_with(root.path(), Registry::new()));

    let response = send_request(addr, "/hello.txt?value=1");
    assert!(response.starts_with("HTTP/1.0 200 OK\r\n"));
    assert_eq!(extract_body(&response), "hello world");
}

#[test]
fn test_post_is_not_implemented() {
    let root = document_root();
    let mut registry = Registry::new();
    registry
        .register_module("/dirt/add", "adder", &ModuleCatalog::builtin())
        .unwrap();
    let addr = start(context_with(root.path(), registry));

    for path in ["/dirt/add", "/hello.txt", "/missing"] {
        let response = send_raw(addr, &format!("POST {} HTTP/1.0\r\n\r\n", path));
        assert!(
            response.starts_with("HTTP/1.0 501 Not Implemented\r\n"),
            "got: {}",
            response
        );
    }
}

#[test]
fn test_invalid_request_gets_no_response() {
    let root = document_root();
    let addr = start(context_with(root.path(), Registry::new()));

    assert!(send_raw(addr, "BREW /pot HTTP/1.0\r\n\r\n").is_empty());
    assert!(send_raw(addr, "GET /hello.txt SPDY/3\r\n\r\n").is_empty());
}

#[test]
fn test_malformed_header_is_skipped() {
    let root = document_root();
    let addr = start(context_with(root.path(), Registry::new()));

    let response = send_raw(
        addr,
        "GET /hello.txt HTTP/1.0\r\nthis line has no colon\r\nHost: localhost\r\nAccept: */*\r\n\r\n",
    );
    assert!(response.starts_with("HTTP/1.0 200 OK\r\n"));
    assert_eq!(extract_body(&response), "hello world");
}

#[test]
fn test_module_handler() {
    let root = document_root();
    let mut registry = Registry::new();
    let catalog = ModuleCatalog::builtin();
    registry.register_module("/dirt/add", "adder", &catalog).unwrap();
    registry.register_module("/dirt/echo", "echo", &catalog).unwrap();
    let addr = start(context_with(root.path(), registry));

    let response = send_request(addr, "/dirt/add?value=2&value=3");
    assert!(response.starts_with("HTTP/1.0 200 OK\r\nServer: Spade/"));
    assert_eq!(extract_body(&response).trim(), "5");

    let response = send_request(addr, "/dirt/echo/deep/path?x=1");
    let body = extract_body(&response);
    assert!(body.contains("PATH_INFO=/deep/path\r\n"));
    assert!(body.contains("SCRIPT_NAME=/dirt/echo\r\n"));
    assert!(body.contains("SERVER_NAME=spade-test\r\n"));
    assert!(body.contains("QUERY_STRING=x=1\r\n"));
}

#[test]
fn test_clay_concurrent_requests() {
    const REQUESTS: usize = 50;

    let root = document_root();
    let endpoint = root.path().join("adder.sock");

    let mut registry = Registry::new();
    registry
        .register_clay("/async/add", &endpoint, Duration::from_secs(10))
        .unwrap();
    let bridge = registry.clay_handlers()[0].endpoint.clone();
    let addr = start(context_with(root.path(), registry));

    let mut worker = WorkerConnection::connect(&endpoint).unwrap();
    thread::spawn(move || {
        while let Ok(Some(request)) = worker.recv() {
            let response = adder_response(&request.variables.query_string);
            if worker.respond(request.connection_id, &response).is_err() {
                break;
            }
        }
    });

    let deadline = Instant::now() + Duration::from_secs(5);
    while !bridge.is_connected() {
        assert!(Instant::now() < deadline, "worker never connected");
        thread::sleep(Duration::from_millis(10));
    }

    let clients: Vec<_> = (0..REQUESTS)
        .map(|i| {
            thread::spawn(move || {
                let path = format!("/async/add?value={}&value=1000", i);
                (i, send_request(addr, &path))
            })
        })
        .collect();

    for client in clients {
        let (i, response) = client.join().unwrap();
        assert!(response.starts_with("HTTP/1.0 200 OK\r\n"), "got: {}", response);
        assert_eq!(extract_body(&response).trim(), (i + 1000).to_string());
    }

    assert_eq!(bridge.pending_count(), 0);
}

#[test]
fn test_clay_single_sum() {
    let root = document_root();
    let endpoint = root.path().join("sum.sock");

    let mut registry = Registry::new();
    registry
        .register_clay("/async/add", &endpoint, Duration::from_secs(10))
        .unwrap();
    let bridge = registry.clay_handlers()[0].endpoint.clone();
    let addr = start(context_with(root.path(), registry));

    let mut worker = WorkerConnection::connect(&endpoint).unwrap();
    thread::spawn(move || {
        while let Ok(Some(request)) = worker.recv() {
            let _ = worker.respond(
                request.connection_id,
                &adder_response(&request.variables.query_string),
            );
        }
    });

    let deadline = Instant::now() + Duration::from_secs(5);
    while !bridge.is_connected() {
        assert!(Instant::now() < deadline, "worker never connected");
        thread::sleep(Duration::from_millis(10));
    }

    let response = send_request(addr, "/async/add?value=1&value=2");
    assert_eq!(extract_body(&response).trim(), "3");
}

#[test]
fn test_clay_without_worker_closes_connection() {
    let root = document_root();
    let mut registry = Registry::new();
    registry
        .register_clay("/async/add", &root.path().join("idle.sock"), Duration::from_secs(10))
        .unwrap();
    let addr = start(context_with(root.path(), registry));

    // Sin worker la conexión se cierra sin escribir nada
    let response = send_request(addr, "/async/add?value=1&value=2");
    assert!(response.is_empty(), "got: {}", response);
}

#[test]
fn test_error_page_escapes_path() {
    let root = document_root();
    let addr = start(context_with(root.path(), Registry::new()));

    let response = send_request(addr, "/<script>alert(1)</script>");
    assert!(response.starts_with("HTTP/1.0 404 Not Found\r\n"), "got: {}", response);

    let body = extract_body(&response);
    assert!(!body.contains("<script>"), "got: {}", body);
    assert!(body.contains("/&lt;script&gt;alert(1)&lt;/script&gt;"));
}
