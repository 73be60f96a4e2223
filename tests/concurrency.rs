#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Concurrent-connection tests: sessions are independent, and one
//! misbehaving client never disturbs the others.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinSet;
use tokio::time::timeout;

use craft_protocol::config::{ServerConfig, DEFAULT_MAX_FRAME_ACCUMULATION};
use craft_protocol::core::buffer::ByteBuffer;
use craft_protocol::core::codec::PacketFramer;
use craft_protocol::core::packet::Packet;
use craft_protocol::server::Server;

fn handshake_packet(next_state: i32) -> Packet {
    let mut body = ByteBuffer::new();
    body.write_var_int(767);
    body.write_string("127.0.0.1");
    body.write_u16(25565);
    body.write_var_int(next_state);
    Packet::new(0x00, body.into_inner())
}

async fn send_packet(stream: &mut TcpStream, packet: Packet) {
    stream.write_all(&packet.marshal()).await.unwrap();
}

async fn recv_packet(stream: &mut TcpStream, framer: &mut PacketFramer) -> Packet {
    timeout(Duration::from_secs(5), async {
        loop {
            let mut buf = [0u8; 4096];
            let n = stream.read(&mut buf).await.unwrap();
            assert!(n > 0, "unexpected end of stream");
            let mut packets = framer.feed(&buf[..n]).unwrap();
            if !packets.is_empty() {
                return packets.remove(0);
            }
        }
    })
    .await
    .expect("timed out waiting for a packet")
}

async fn ping_flow(addr: SocketAddr, challenge: i64) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let mut framer = PacketFramer::new(DEFAULT_MAX_FRAME_ACCUMULATION);

    send_packet(&mut stream, handshake_packet(1)).await;

    let mut ping = ByteBuffer::new();
    ping.write_i64(challenge);
    send_packet(&mut stream, Packet::new(0x01, ping.into_inner())).await;

    let pong = recv_packet(&mut stream, &mut framer).await;
    assert_eq!(pong.id, 0x01);
    assert_eq!(pong.body, challenge.to_be_bytes());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_clients_ping_concurrently() {
    let mut config = ServerConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.listener.port = 0;

    let server = Server::bind(config).await.unwrap();
    let addr = server.local_addr();
    let handle = server.handle();
    tokio::spawn(server.run());

    let mut tasks = JoinSet::new();
    for i in 0..16i64 {
        tasks.spawn(ping_flow(addr, 0x4000_0000_0000_0000 + i));
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap();
    }

    handle.close();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn bad_client_is_dropped_without_disturbing_others() {
    let mut config = ServerConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.listener.port = 0;

    let server = Server::bind(config).await.unwrap();
    let addr = server.local_addr();
    let handle = server.handle();
    tokio::spawn(server.run());

    // a client that sends an unknown packet id gets disconnected
    let bad = tokio::spawn(async move {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        send_packet(&mut stream, handshake_packet(1)).await;
        send_packet(&mut stream, Packet::new(0x7F, vec![1, 2, 3])).await;

        let mut buf = [0u8; 64];
        let n = timeout(Duration::from_secs(5), stream.read(&mut buf))
            .await
            .expect("server should close the connection")
            .unwrap();
        assert_eq!(n, 0, "expected EOF after a registry error");
    });

    // meanwhile a well-behaved client completes its flow
    ping_flow(addr, 99).await;
    bad.await.unwrap();

    handle.close();
}
