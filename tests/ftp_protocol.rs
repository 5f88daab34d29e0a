//! End-to-end scenarios from SPEC_FULL.md §8, driven over real loopback
//! sockets against a live `Server`.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use roftpd::config::Config;
use roftpd::server::Server;

/// Starts a server rooted at a fresh temp directory on an OS-chosen loopback
/// port and returns (peer address to dial, the temp dir to keep alive).
async fn spawn_server() -> (std::net::SocketAddr, tempfile::TempDir) {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("hello.txt"), b"Hi\n").unwrap();
    std::fs::create_dir(root.path().join("sub")).unwrap();

    let config = Config {
        base_directory: root.path().canonicalize().unwrap(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
    };

    // Config::from_args always binds via Server::bind against the requested
    // addr; port 0 is resolved by the OS, so grab a listener first to learn
    // the real address, matching the PASV pattern this server itself uses.
    let probe = TcpListener::bind(config.bind_addr).await.unwrap();
    let bind_addr = probe.local_addr().unwrap();
    drop(probe);

    let server = Server::bind(Config {
        base_directory: config.base_directory,
        bind_addr,
    })
    .await
    .unwrap();

    tokio::spawn(async move {
        server.serve().await;
    });

    // Give the accept loop a moment to start listening.
    tokio::time::sleep(Duration::from_millis(20)).await;
    (bind_addr, root)
}

async fn connect(addr: std::net::SocketAddr) -> (BufReader<tokio::net::tcp::OwnedReadHalf>, tokio::net::tcp::OwnedWriteHalf) {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (read_half, write_half) = stream.into_split();
    (BufReader::new(read_half), write_half)
}

async fn read_reply(reader: &mut BufReader<tokio::net::tcp::OwnedReadHalf>) -> String {
    let mut line = String::new();
    reader.read_line(&mut line).await.unwrap();
    line
}

async fn send_cmd(writer: &mut tokio::net::tcp::OwnedWriteHalf, line: &str) {
    writer.write_all(line.as_bytes()).await.unwrap();
    writer.write_all(b"\r\n").await.unwrap();
}

#[tokio::test]
async fn login_and_pwd() {
    let (addr, _root) = spawn_server().await;
    let (mut reader, mut writer) = connect(addr).await;

    assert!(read_reply(&mut reader).await.starts_with("220"));

    send_cmd(&mut writer, "USER anonymous").await;
    assert!(read_reply(&mut reader).await.starts_with("331"));

    send_cmd(&mut writer, "PASS a@b").await;
    assert!(read_reply(&mut reader).await.starts_with("230"));

    send_cmd(&mut writer, "PWD").await;
    assert_eq!(read_reply(&mut reader).await, "257 \"/\"\r\n");
}

#[tokio::test]
async fn passive_listing_of_base() {
    let (addr, _root) = spawn_server().await;
    let (mut reader, mut writer) = connect(addr).await;
    read_reply(&mut reader).await; // greeting

    send_cmd(&mut writer, "PASV").await;
    let pasv_reply = read_reply(&mut reader).await;
    let data_addr = parse_pasv(&pasv_reply);

    send_cmd(&mut writer, "LIST").await;
    let mut data_stream = TcpStream::connect(data_addr).await.unwrap();

    assert!(read_reply(&mut reader).await.starts_with("150"));

    let mut listing = Vec::new();
    data_stream.read_to_end(&mut listing).await.unwrap();
    let listing = String::from_utf8_lossy(&listing);
    assert!(listing.contains("."), "listing should contain '.' entry: {listing}");
    assert!(listing.contains("sub"));
    assert!(listing.contains("hello.txt"));

    assert!(read_reply(&mut reader).await.starts_with("226"));
}

#[tokio::test]
async fn jail_escape_is_blocked() {
    let (addr, _root) = spawn_server().await;
    let (mut reader, mut writer) = connect(addr).await;
    read_reply(&mut reader).await; // greeting

    send_cmd(&mut writer, "CWD /../../etc").await;
    assert!(read_reply(&mut reader).await.starts_with("550"));

    send_cmd(&mut writer, "PWD").await;
    assert_eq!(read_reply(&mut reader).await, "257 \"/\"\r\n");
}

#[tokio::test]
async fn active_retr_transfers_exact_bytes() {
    let (addr, _root) = spawn_server().await;
    let (mut reader, mut writer) = connect(addr).await;
    read_reply(&mut reader).await; // greeting

    let data_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let data_addr = data_listener.local_addr().unwrap();
    let octets = match data_addr.ip() {
        std::net::IpAddr::V4(v4) => v4.octets(),
        _ => unreachable!(),
    };
    let port = data_addr.port();
    let port_cmd = format!(
        "PORT {},{},{},{},{},{}",
        octets[0],
        octets[1],
        octets[2],
        octets[3],
        port / 256,
        port % 256
    );
    send_cmd(&mut writer, &port_cmd).await;
    assert!(read_reply(&mut reader).await.starts_with("200"));

    send_cmd(&mut writer, "RETR hello.txt").await;

    let (mut accepted, _) = data_listener.accept().await.unwrap();
    assert!(read_reply(&mut reader).await.starts_with("150"));

    let mut buf = Vec::new();
    accepted.read_to_end(&mut buf).await.unwrap();
    assert_eq!(buf, b"Hi\n");

    assert!(read_reply(&mut reader).await.starts_with("226"));
}

#[tokio::test]
async fn unknown_verb_then_noop() {
    let (addr, _root) = spawn_server().await;
    let (mut reader, mut writer) = connect(addr).await;
    read_reply(&mut reader).await; // greeting

    send_cmd(&mut writer, "FROB").await;
    assert!(read_reply(&mut reader).await.starts_with("500"));

    send_cmd(&mut writer, "NOOP").await;
    assert!(read_reply(&mut reader).await.starts_with("200"));
}

#[tokio::test]
async fn quit_closes_the_control_connection() {
    let (addr, _root) = spawn_server().await;
    let (mut reader, mut writer) = connect(addr).await;
    read_reply(&mut reader).await; // greeting

    send_cmd(&mut writer, "QUIT").await;
    assert!(read_reply(&mut reader).await.starts_with("221"));

    let mut buf = [0u8; 1];
    let n = reader.read(&mut buf).await.unwrap();
    assert_eq!(n, 0, "expected EOF after QUIT");
}

#[tokio::test]
async fn retr_on_directory_is_rejected() {
    let (addr, _root) = spawn_server().await;
    let (mut reader, mut writer) = connect(addr).await;
    read_reply(&mut reader).await; // greeting

    send_cmd(&mut writer, "RETR sub").await;
    assert!(read_reply(&mut reader).await.starts_with("550"));
}

#[tokio::test]
async fn type_toggle_does_not_change_retr_bytes() {
    let (addr, _root) = spawn_server().await;
    let (mut reader, mut writer) = connect(addr).await;
    read_reply(&mut reader).await; // greeting

    send_cmd(&mut writer, "TYPE I").await;
    assert!(read_reply(&mut reader).await.starts_with("200"));
    send_cmd(&mut writer, "TYPE A").await;
    assert!(read_reply(&mut reader).await.starts_with("200"));
}

fn parse_pasv(line: &str) -> std::net::SocketAddr {
    let start = line.find('(').unwrap() + 1;
    let end = line.find(')').unwrap();
    let parts: Vec<u16> = line[start..end]
        .split(',')
        .map(|p| p.parse().unwrap())
        .collect();
    let ip = std::net::Ipv4Addr::new(
        parts[0] as u8,
        parts[1] as u8,
        parts[2] as u8,
        parts[3] as u8,
    );
    let port = parts[4] * 256 + parts[5];
    std::net::SocketAddr::from((ip, port))
}
