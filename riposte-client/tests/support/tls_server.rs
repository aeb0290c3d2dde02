//! One-shot TLS server that hangs up without a close_notify
//!
//! Uses the test CA under `tests/certs`, so clients must be built with
//! [`client_config`] rather than the system trust store.
#![allow(dead_code)]

use std::{fs::File, io::BufReader, net::SocketAddr, path::PathBuf, sync::Arc};

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt},
    net::TcpListener,
    task::JoinHandle,
};
use tokio_rustls::{
    TlsAcceptor,
    rustls::{ClientConfig, RootCertStore, ServerConfig},
};

fn cert_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/certs")
        .join(name)
}

/// A client config trusting only the test CA.
pub fn client_config() -> Arc<ClientConfig> {
    let mut reader = BufReader::new(File::open(cert_path("ca.pem")).unwrap());
    let mut roots = RootCertStore::empty();
    for cert in rustls_pemfile::certs(&mut reader) {
        roots.add(cert.unwrap()).unwrap();
    }

    Arc::new(
        ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth(),
    )
}

fn acceptor() -> TlsAcceptor {
    let mut reader = BufReader::new(File::open(cert_path("server.pem")).unwrap());
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    let mut reader = BufReader::new(File::open(cert_path("server.key")).unwrap());
    let key = rustls_pemfile::private_key(&mut reader).unwrap().unwrap();

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .unwrap();

    TlsAcceptor::from(Arc::new(config))
}

/// Accepts one connection, sends `greeting`, answers the first line with
/// `reply` and then drops the TCP stream without shutting down TLS.
pub async fn serve_once(
    greeting: &'static str,
    reply: &'static str,
) -> (SocketAddr, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let acceptor = acceptor();

    let handle = tokio::spawn(async move {
        let (stream, _peer) = listener.accept().await.unwrap();
        let mut tls = acceptor.accept(stream).await.unwrap();

        tls.write_all(greeting.as_bytes()).await.unwrap();
        tls.flush().await.unwrap();

        let mut line = String::new();
        tokio::io::BufReader::new(&mut tls)
            .read_line(&mut line)
            .await
            .unwrap();

        tls.write_all(reply.as_bytes()).await.unwrap();
        tls.flush().await.unwrap();

        let (tcp, _session) = tls.into_inner();
        drop(tcp);

        line.trim_end().to_string()
    });

    (addr, handle)
}
