pub mod mock_server;
pub mod tls_server;
