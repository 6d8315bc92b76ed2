//! Plugin process entry point: go-plugin handshake and the gRPC listener

use crate::error::{Result, TfplugError};
use crate::grpc::GrpcProviderServer;
use crate::proto::ProviderServer;
use crate::provider::Provider;
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use tonic::transport::{Identity, Server, ServerTlsConfig};

/// Set by Terraform when it launches a plugin
pub const MAGIC_COOKIE_KEY: &str = "TF_PLUGIN_MAGIC_COOKIE";
pub const MAGIC_COOKIE_VALUE: &str =
    "d602bf8f470bc67ca7faa0386276bbdd4330efaf76d1a219cb4d6991ca9872b2";

const PROTOCOL_VERSION: u32 = 6;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub cert_path: Option<PathBuf>,
    pub key_path: Option<PathBuf>,
    pub max_message_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            cert_path: None,
            key_path: None,
            max_message_size: 256 << 20, // 256MB
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve over TLS with a PEM certificate and key
    pub fn with_tls(mut self, cert_path: PathBuf, key_path: PathBuf) -> Self {
        self.cert_path = Some(cert_path);
        self.key_path = Some(key_path);
        self
    }

    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Reads TFPLUG_TLS_CERT and TFPLUG_TLS_KEY
    pub fn from_env() -> Self {
        Self {
            cert_path: std::env::var_os("TFPLUG_TLS_CERT").map(PathBuf::from),
            key_path: std::env::var_os("TFPLUG_TLS_KEY").map(PathBuf::from),
            ..Self::default()
        }
    }
}

/// The line go-plugin reads from stdout to find the server
pub fn handshake_line(addr: SocketAddr) -> String {
    format!("1|{}|tcp|{}|grpc", PROTOCOL_VERSION, addr)
}

/// Refuses to start unless launched by Terraform
pub fn check_magic_cookie() -> Result<()> {
    match std::env::var(MAGIC_COOKIE_KEY) {
        Ok(value) if value == MAGIC_COOKIE_VALUE => Ok(()),
        _ => Err(TfplugError::HandshakeError(
            "this binary is a Terraform plugin and must be run by Terraform".to_string(),
        )),
    }
}

async fn load_tls(config: &ServerConfig) -> Result<Option<ServerTlsConfig>> {
    let (cert_path, key_path) = match (&config.cert_path, &config.key_path) {
        (Some(cert), Some(key)) => (cert, key),
        (None, None) => return Ok(None),
        _ => {
            return Err(TfplugError::TlsError(
                "certificate and key must be given together".to_string(),
            ))
        }
    };

    // Fails only when another provider is already installed
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cert = tokio::fs::read(cert_path)
        .await
        .map_err(|e| TfplugError::TlsError(format!("Failed to read certificate: {}", e)))?;
    let key = tokio::fs::read(key_path)
        .await
        .map_err(|e| TfplugError::TlsError(format!("Failed to read key: {}", e)))?;

    Ok(Some(
        ServerTlsConfig::new().identity(Identity::from_pem(cert, key)),
    ))
}

/// Runs the provider until Terraform closes the connection
pub async fn serve<P: Provider + 'static>(provider: P, config: ServerConfig) -> Result<()> {
    check_magic_cookie()?;

    let provider_service = ProviderServer::new(GrpcProviderServer::new(provider))
        .max_decoding_message_size(config.max_message_size)
        .max_encoding_message_size(config.max_message_size);

    let mut builder = Server::builder();
    if let Some(tls_config) = load_tls(&config).await? {
        builder = builder.tls_config(tls_config)?;
    }

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tracing::info!("Serving provider on {}", addr);

    let mut stdout = std::io::stdout();
    writeln!(stdout, "{}", handshake_line(addr))?;
    stdout.flush()?;

    let incoming = tokio_stream::wrappers::TcpListenerStream::new(listener);
    builder
        .add_service(provider_service)
        .serve_with_incoming(incoming)
        .await?;

    Ok(())
}
