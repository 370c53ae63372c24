//! SMTP client for Gmail
//!
//! Async SMTP implementation using tokio and tokio-native-tls. Gmail
//! requires an app password; the account password will not work.

use base64::Engine;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_native_tls::TlsConnector;
use tracing::{debug, error, instrument, trace};

/// SMTP client errors
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// Connection or TLS setup failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The server rejected the credentials
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// SMTP protocol error
    #[error("SMTP error: {0}")]
    SmtpError(String),
}

/// SMTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    /// SMTP host (default: smtp.gmail.com)
    #[serde(default = "default_host")]
    pub host: String,

    /// SMTP port, 587 for STARTTLS or 465 for implicit TLS
    #[serde(default = "default_port")]
    pub port: u16,

    /// Account address, also used as the From header
    pub user: String,

    /// App password, injected from the environment rather than the file
    #[serde(skip, default = "empty_secret")]
    pub password: SecretString,
}

fn default_host() -> String {
    "smtp.gmail.com".to_string()
}

fn empty_secret() -> SecretString {
    String::new().into()
}

const fn default_port() -> u16 {
    587
}

/// Async SMTP client
#[derive(Debug, Clone)]
pub struct SmtpClient {
    config: SmtpConfig,
}

impl SmtpClient {
    pub const fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    /// Send a plain-text email
    ///
    /// Returns the generated message id.
    ///
    /// # Errors
    ///
    /// Fails on connection problems, rejected credentials or protocol
    /// errors.
    #[instrument(skip(self, body))]
    pub async fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<String, EmailError> {
        debug!(to, subject, "Sending email");

        let message_id = format!(
            "<{}.{}@{}>",
            chrono::Utc::now().timestamp_millis(),
            uuid::Uuid::new_v4(),
            Self::extract_domain(&self.config.user)
        );

        let content = self.build_content(to, subject, body, &message_id);
        self.send_smtp(to, &content).await?;

        debug!(message_id = %message_id, "Email sent successfully");
        Ok(message_id)
    }

    /// Check whether the SMTP server is reachable
    #[instrument(skip(self))]
    pub async fn check_connection(&self) -> bool {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        TcpStream::connect(&addr).await.is_ok()
    }

    /// Build the message in RFC 5322 format
    fn build_content(&self, to: &str, subject: &str, body: &str, message_id: &str) -> String {
        let date = chrono::Utc::now().format("%a, %d %b %Y %H:%M:%S +0000");

        format!(
            "From: {}\r\n\
             To: {}\r\n\
             Subject: {}\r\n\
             Date: {}\r\n\
             Message-ID: {}\r\n\
             MIME-Version: 1.0\r\n\
             Content-Type: text/plain; charset=utf-8\r\n\
             Content-Transfer-Encoding: 8bit\r\n\
             \r\n{}",
            self.config.user,
            to,
            encode_subject(subject),
            date,
            message_id,
            body
        )
    }

    fn build_tls_connector() -> Result<TlsConnector, EmailError> {
        let native_connector = native_tls::TlsConnector::builder()
            .min_protocol_version(Some(native_tls::Protocol::Tlsv12))
            .build()
            .map_err(|e| EmailError::ConnectionFailed(format!("TLS builder failed: {e}")))?;
        Ok(TlsConnector::from(native_connector))
    }

    async fn send_smtp(&self, to: &str, content: &str) -> Result<(), EmailError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        let stream = TcpStream::connect(&addr).await.map_err(|e| {
            error!(error = %e, "Failed to connect to SMTP server");
            EmailError::ConnectionFailed(format!("SMTP connection failed: {e}"))
        })?;

        // Port 465 uses implicit TLS, everything else STARTTLS
        if self.config.port == 465 {
            let tls = Self::build_tls_connector()?;
            let tls_stream = tls
                .connect(&self.config.host, stream)
                .await
                .map_err(|e| EmailError::ConnectionFailed(format!("TLS handshake failed: {e}")))?;
            self.smtp_session(tls_stream, to, content).await
        } else {
            self.smtp_starttls_session(stream, to, content).await
        }
    }

    async fn smtp_starttls_session(
        &self,
        stream: TcpStream,
        to: &str,
        content: &str,
    ) -> Result<(), EmailError> {
        let (reader, mut writer) = tokio::io::split(stream);
        let mut reader = BufReader::new(reader);

        // Greeting
        Self::read_response(&mut reader).await?;

        Self::send_command(&mut writer, &format!("EHLO {}", local_hostname())).await?;
        Self::read_response(&mut reader).await?;

        Self::send_command(&mut writer, "STARTTLS").await?;
        Self::read_response(&mut reader).await?;

        let stream = reader.into_inner().unsplit(writer);
        let tls = Self::build_tls_connector()?;
        let tls_stream = tls
            .connect(&self.config.host, stream)
            .await
            .map_err(|e| EmailError::ConnectionFailed(format!("STARTTLS upgrade failed: {e}")))?;

        self.smtp_session_after_tls(tls_stream, to, content).await
    }

    async fn smtp_session<S>(&self, stream: S, to: &str, content: &str) -> Result<(), EmailError>
    where
        S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
    {
        let (reader, mut writer) = tokio::io::split(stream);
        let mut reader = BufReader::new(reader);

        // Greeting arrives first on implicit TLS
        Self::read_response(&mut reader).await?;
        self.authenticated_exchange(&mut reader, &mut writer, to, content)
            .await
    }

    async fn smtp_session_after_tls<S>(
        &self,
        stream: S,
        to: &str,
        content: &str,
    ) -> Result<(), EmailError>
    where
        S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
    {
        let (reader, mut writer) = tokio::io::split(stream);
        let mut reader = BufReader::new(reader);
        self.authenticated_exchange(&mut reader, &mut writer, to, content)
            .await
    }

    async fn authenticated_exchange<R, W>(
        &self,
        reader: &mut BufReader<R>,
        writer: &mut W,
        to: &str,
        content: &str,
    ) -> Result<(), EmailError>
    where
        R: tokio::io::AsyncRead + Unpin,
        W: tokio::io::AsyncWrite + Unpin,
    {
        Self::send_command(writer, &format!("EHLO {}", local_hostname())).await?;
        Self::read_response(reader).await?;

        let auth_string = format!(
            "\0{}\0{}",
            self.config.user,
            self.config.password.expose_secret()
        );
        let auth_b64 = base64::engine::general_purpose::STANDARD.encode(auth_string);

        Self::send_command(writer, &format!("AUTH PLAIN {auth_b64}")).await?;
        let auth_response = Self::read_response(reader).await?;
        if !auth_response.starts_with("235") {
            return Err(EmailError::AuthenticationFailed);
        }

        Self::send_command(writer, &format!("MAIL FROM:<{}>", self.config.user)).await?;
        Self::expect_response(reader, "250").await?;

        Self::send_command(writer, &format!("RCPT TO:<{to}>")).await?;
        Self::expect_response(reader, "250").await?;

        Self::send_command(writer, "DATA").await?;
        Self::expect_response(reader, "354").await?;

        // Escape dots at start of lines
        let escaped_content = content.replace("\r\n.", "\r\n..");
        writer
            .write_all(escaped_content.as_bytes())
            .await
            .map_err(|e| EmailError::SmtpError(format!("Failed to send content: {e}")))?;

        writer
            .write_all(b"\r\n.\r\n")
            .await
            .map_err(|e| EmailError::SmtpError(format!("Failed to end DATA: {e}")))?;
        writer.flush().await.ok();

        Self::expect_response(reader, "250").await?;

        Self::send_command(writer, "QUIT").await?;
        // Server may close the connection without answering QUIT

        Ok(())
    }

    async fn send_command<W>(writer: &mut W, command: &str) -> Result<(), EmailError>
    where
        W: tokio::io::AsyncWrite + Unpin,
    {
        trace!(command = %command.split(' ').next().unwrap_or(command), "Sending SMTP command");
        writer
            .write_all(format!("{command}\r\n").as_bytes())
            .await
            .map_err(|e| EmailError::SmtpError(format!("Failed to send command: {e}")))?;
        writer.flush().await.ok();
        Ok(())
    }

    async fn read_response<R>(reader: &mut BufReader<R>) -> Result<String, EmailError>
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        let mut response = String::new();
        loop {
            let mut line = String::new();
            reader
                .read_line(&mut line)
                .await
                .map_err(|e| EmailError::SmtpError(format!("Failed to read response: {e}")))?;

            trace!(line = %line.trim(), "SMTP response");
            response.push_str(&line);

            // Last line of a multi-line reply has no hyphen after the code
            if line.len() >= 4 && line.chars().nth(3) != Some('-') {
                break;
            }
        }
        Ok(response)
    }

    async fn expect_response<R>(
        reader: &mut BufReader<R>,
        expected_code: &str,
    ) -> Result<(), EmailError>
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        let response = Self::read_response(reader).await?;
        if !response.starts_with(expected_code) {
            return Err(EmailError::SmtpError(format!(
                "Expected {expected_code}, got: {response}"
            )));
        }
        Ok(())
    }

    fn extract_domain(email: &str) -> String {
        email.split('@').nth(1).unwrap_or("gr20.local").to_string()
    }
}

fn local_hostname() -> String {
    hostname::get().map_or_else(
        |_| "localhost".to_string(),
        |h| h.to_string_lossy().to_string(),
    )
}

/// RFC 2047 encode the subject when it carries non-ASCII characters
fn encode_subject(subject: &str) -> String {
    if subject.is_ascii() {
        return subject.to_string();
    }
    format!(
        "=?utf-8?B?{}?=",
        base64::engine::general_purpose::STANDARD.encode(subject)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SmtpConfig {
        SmtpConfig {
            host: "127.0.0.1".to_string(),
            port: 1025,
            user: "watch@gmail.com".to_string(),
            password: "app-password".to_string().into(),
        }
    }

    #[test]
    fn config_defaults_from_empty_yaml_like_json() {
        let config: SmtpConfig =
            serde_json::from_str(r#"{"user": "watch@gmail.com"}"#).expect("should deserialize");
        assert_eq!(config.host, "smtp.gmail.com");
        assert_eq!(config.port, 587);
    }

    #[test]
    fn extract_domain_from_address() {
        assert_eq!(SmtpClient::extract_domain("user@gmail.com"), "gmail.com");
        assert_eq!(SmtpClient::extract_domain("invalid"), "gr20.local");
    }

    #[test]
    fn build_content_contains_headers_and_body() {
        let client = SmtpClient::new(test_config());
        let content = client.build_content(
            "hiker@example.com",
            "GR20 Wetter Conca: (morning)",
            "Conca | Gew. -",
            "<123@gr20.local>",
        );

        assert!(content.contains("From: watch@gmail.com"));
        assert!(content.contains("To: hiker@example.com"));
        assert!(content.contains("Subject: GR20 Wetter Conca: (morning)"));
        assert!(content.contains("Message-ID: <123@gr20.local>"));
        assert!(content.ends_with("Conca | Gew. -"));
    }

    #[test]
    fn non_ascii_subject_is_rfc2047_encoded() {
        let encoded = encode_subject("GR20 Wetter: Gewitterwarnung für Corté");
        assert!(encoded.starts_with("=?utf-8?B?"));
        assert!(encoded.ends_with("?="));
    }

    #[test]
    fn ascii_subject_is_untouched() {
        assert_eq!(encode_subject("GR20 Wetter"), "GR20 Wetter");
    }

    #[tokio::test]
    async fn check_connection_fails_for_unavailable_server() {
        let config = SmtpConfig {
            port: 19999,
            ..test_config()
        };
        let client = SmtpClient::new(config);
        assert!(!client.check_connection().await);
    }

    #[test]
    fn smtp_client_has_debug_and_clone() {
        let client = SmtpClient::new(test_config());
        #[allow(clippy::redundant_clone)]
        let cloned = client.clone();
        assert!(format!("{cloned:?}").contains("SmtpClient"));
    }
}
