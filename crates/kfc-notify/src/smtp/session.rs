//! A single SMTP client session.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, ReadBuf,
};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tracing::debug;

use super::data::encode_data;
use super::reply::{Extensions, Reply};
use crate::auth::{AuthMechanism, SmtpAuth, TlsConfig};
use crate::config::has_line_break;
use crate::error::{NotifyError, Result};

/// Upper bound on the number of lines accepted in one reply.
const MAX_REPLY_LINES: usize = 128;

/// Upper bound on the length of one reply line, CRLF included.
const MAX_LINE_LEN: u64 = 1000;

/// Upper bound on SASL challenge rounds.
const MAX_AUTH_ROUNDS: usize = 4;

enum Stream {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl AsyncRead for Stream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(s) => Pin::new(s).poll_read(cx, buf),
            Self::Tls(s) => Pin::new(s).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Stream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Plain(s) => Pin::new(s).poll_write(cx, buf),
            Self::Tls(s) => Pin::new(s).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(s) => Pin::new(s).poll_flush(cx),
            Self::Tls(s) => Pin::new(s).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(s) => Pin::new(s).poll_shutdown(cx),
            Self::Tls(s) => Pin::new(s).poll_shutdown(cx),
        }
    }
}

/// An SMTP client session with one server.
///
/// The session owns its connection; dropping it closes the socket.
pub struct SmtpSession {
    stream: BufReader<Stream>,
    server_name: String,
    extensions: Extensions,
}

impl SmtpSession {
    /// Connects in plaintext to `addr` and reads the greeting.
    ///
    /// `server_name` is the bare host name used for PLAIN host checks.
    pub async fn connect(addr: &str, server_name: &str) -> Result<Self> {
        let tcp = dial(addr).await?;
        Self::greet(Stream::Plain(tcp), server_name).await
    }

    /// Connects to `addr`, performs a TLS handshake immediately and reads
    /// the greeting.
    pub async fn connect_tls(addr: &str, tls: &TlsConfig) -> Result<Self> {
        let tcp = dial(addr).await?;
        let stream = TlsConnector::from(tls.client_config())
            .connect(tls.rustls_server_name(), tcp)
            .await
            .map_err(|source| NotifyError::Connect {
                addr: addr.to_string(),
                source,
            })?;
        Self::greet(Stream::Tls(Box::new(stream)), tls.server_name()).await
    }

    async fn greet(stream: Stream, server_name: &str) -> Result<Self> {
        let mut session = Self {
            stream: BufReader::new(stream),
            server_name: server_name.to_string(),
            extensions: Extensions::default(),
        };
        let greeting = session.read_reply().await?;
        if greeting.code() != 220 {
            return Err(NotifyError::Reply {
                command: "greeting",
                reply: greeting,
            });
        }
        debug!(server = %session.server_name, "connected to SMTP server");
        Ok(session)
    }

    /// Returns true once the connection is wrapped in TLS.
    #[must_use]
    pub fn is_encrypted(&self) -> bool {
        matches!(self.stream.get_ref(), Stream::Tls(_))
    }

    /// Returns the extensions from the last EHLO.
    #[must_use]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Returns the parameters of an advertised extension.
    #[must_use]
    pub fn extension(&self, keyword: &str) -> Option<&str> {
        self.extensions.get(keyword)
    }

    /// Sends EHLO, falling back to HELO if the server rejects it.
    pub async fn hello(&mut self, name: &str) -> Result<()> {
        let reply = self.command(&format!("EHLO {name}")).await?;
        if reply.is_positive() {
            self.extensions = Extensions::from_ehlo(&reply);
            return Ok(());
        }

        debug!(reply = %reply, "EHLO rejected, falling back to HELO");
        let reply = self.command(&format!("HELO {name}")).await?;
        if !reply.is_positive() {
            return Err(NotifyError::Reply {
                command: "HELO",
                reply,
            });
        }
        self.extensions = Extensions::default();
        Ok(())
    }

    /// Upgrades the connection with STARTTLS.
    ///
    /// Extensions are cleared; callers must say hello again.
    pub async fn starttls(self, tls: &TlsConfig) -> Result<Self> {
        self.upgrade(tls)
            .await
            .map_err(|e| match e {
                NotifyError::StartTls { .. } => e,
                other => NotifyError::StartTls {
                    reason: other.to_string(),
                },
            })
    }

    async fn upgrade(mut self, tls: &TlsConfig) -> Result<Self> {
        if self.is_encrypted() {
            return Err(NotifyError::StartTls {
                reason: "connection is already encrypted".to_string(),
            });
        }

        let reply = self.command("STARTTLS").await?;
        if reply.code() != 220 {
            return Err(NotifyError::StartTls {
                reason: reply.to_string(),
            });
        }
        if !self.stream.buffer().is_empty() {
            return Err(NotifyError::StartTls {
                reason: "server sent data before TLS handshake".to_string(),
            });
        }

        let Stream::Plain(tcp) = self.stream.into_inner() else {
            return Err(NotifyError::StartTls {
                reason: "connection is already encrypted".to_string(),
            });
        };
        let stream = TlsConnector::from(tls.client_config())
            .connect(tls.rustls_server_name(), tcp)
            .await?;

        debug!(server_name = tls.server_name(), "STARTTLS complete");
        Ok(Self {
            stream: BufReader::new(Stream::Tls(Box::new(stream))),
            server_name: self.server_name,
            extensions: Extensions::default(),
        })
    }

    /// Runs the SASL exchange for `auth`.
    pub async fn auth(&mut self, auth: &SmtpAuth) -> Result<()> {
        let mechanism = auth.mechanism();
        self.sasl(auth, mechanism).await.map_err(|e| match e {
            NotifyError::Auth { .. } => e,
            other => NotifyError::Auth {
                mechanism,
                reason: other.to_string(),
            },
        })
    }

    async fn sasl(&mut self, auth: &SmtpAuth, mechanism: AuthMechanism) -> Result<()> {
        auth.check_transport(self.is_encrypted(), &self.server_name)?;

        let mut reply = match auth.initial_response() {
            Some(initial) => self.command(&format!("AUTH {mechanism} {initial}")).await?,
            None => self.command(&format!("AUTH {mechanism}")).await?,
        };

        for _ in 0..MAX_AUTH_ROUNDS {
            match reply.code() {
                235 => {
                    debug!(%mechanism, "authenticated");
                    return Ok(());
                }
                334 => {
                    let response = match auth.respond(reply.first_line()) {
                        Ok(response) => response,
                        Err(e) => {
                            // Abort the exchange so the session stays usable.
                            let _ = self.command("*").await;
                            return Err(e);
                        }
                    };
                    reply = self.command(&response).await?;
                }
                _ => {
                    return Err(NotifyError::Auth {
                        mechanism,
                        reason: reply.to_string(),
                    });
                }
            }
        }

        Err(NotifyError::Auth {
            mechanism,
            reason: "too many challenge rounds".to_string(),
        })
    }

    /// Sets the envelope sender.
    pub async fn mail(&mut self, from: &str) -> Result<()> {
        check_address(from)?;
        self.expect_positive("MAIL", &format!("MAIL FROM:<{from}>"))
            .await
    }

    /// Adds an envelope recipient.
    pub async fn rcpt(&mut self, to: &str) -> Result<()> {
        check_address(to)?;
        self.expect_positive("RCPT", &format!("RCPT TO:<{to}>")).await
    }

    /// Sends `body` as the message content and waits for acceptance.
    ///
    /// A failure while streaming the body is reported as
    /// `NotifyError::Render`; the server may have received part of it.
    pub async fn data(&mut self, body: &[u8]) -> Result<()> {
        let reply = self.command("DATA").await?;
        if reply.code() != 354 {
            return Err(NotifyError::Reply {
                command: "DATA",
                reply,
            });
        }

        let encoded = encode_data(body);
        self.stream
            .write_all(&encoded)
            .await
            .map_err(NotifyError::Render)?;
        self.stream.flush().await.map_err(NotifyError::Render)?;

        let reply = self.read_reply().await?;
        if !reply.is_positive() {
            return Err(NotifyError::Reply {
                command: "DATA",
                reply,
            });
        }
        debug!(bytes = encoded.len(), "message accepted");
        Ok(())
    }

    /// Sends QUIT and closes the connection.
    pub async fn quit(mut self) -> Result<()> {
        let reply = self.command("QUIT").await?;
        let _ = self.stream.shutdown().await;
        if reply.code() != 221 {
            return Err(NotifyError::Reply {
                command: "QUIT",
                reply,
            });
        }
        Ok(())
    }

    async fn expect_positive(&mut self, verb: &'static str, line: &str) -> Result<()> {
        let reply = self.command(line).await?;
        if reply.is_positive() {
            Ok(())
        } else {
            Err(NotifyError::Reply {
                command: verb,
                reply,
            })
        }
    }

    async fn command(&mut self, line: &str) -> Result<Reply> {
        self.stream.write_all(line.as_bytes()).await?;
        self.stream.write_all(b"\r\n").await?;
        self.stream.flush().await?;
        self.read_reply().await
    }

    async fn read_reply(&mut self) -> Result<Reply> {
        let mut code = None;
        let mut lines = Vec::new();
        let mut buf = String::new();

        loop {
            buf.clear();
            let read = (&mut self.stream)
                .take(MAX_LINE_LEN)
                .read_line(&mut buf)
                .await?;
            if read == 0 {
                return Err(NotifyError::Protocol {
                    reason: "connection closed by server".to_string(),
                });
            }
            if !buf.ends_with('\n') && read as u64 >= MAX_LINE_LEN {
                return Err(NotifyError::Protocol {
                    reason: format!("reply line longer than {MAX_LINE_LEN} bytes"),
                });
            }
            let line = buf.trim_end_matches(['\r', '\n']);
            let parsed = Reply::parse_line(line)?;

            match code {
                None => code = Some(parsed.code),
                Some(c) if c != parsed.code => {
                    return Err(NotifyError::Protocol {
                        reason: format!("reply code changed from {c} to {}", parsed.code),
                    });
                }
                Some(_) => {}
            }
            lines.push(parsed.text.to_string());

            if !parsed.more {
                return Ok(Reply::new(parsed.code, lines));
            }
            if lines.len() >= MAX_REPLY_LINES {
                return Err(NotifyError::Protocol {
                    reason: "reply has too many lines".to_string(),
                });
            }
        }
    }
}

async fn dial(addr: &str) -> Result<TcpStream> {
    TcpStream::connect(addr)
        .await
        .map_err(|source| NotifyError::Connect {
            addr: addr.to_string(),
            source,
        })
}

fn check_address(addr: &str) -> Result<()> {
    if has_line_break(addr) || addr.contains(['<', '>']) {
        return Err(NotifyError::InvalidAddress {
            reason: format!("{addr:?} is not a valid mailbox"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// Accepts one connection, writes `greeting` and waits for the client
    /// to hang up.
    async fn serve_once(greeting: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let _ = socket.write_all(&greeting).await;
            let mut sink = Vec::new();
            let _ = socket.read_to_end(&mut sink).await;
        });
        addr
    }

    #[tokio::test]
    async fn overlong_reply_line_is_rejected() {
        let mut greeting = b"220 ".to_vec();
        greeting.extend(vec![b'x'; 64 * 1024]);
        let addr = serve_once(greeting).await;

        let err = SmtpSession::connect(&addr, "127.0.0.1").await.err().unwrap();
        assert!(matches!(
            err,
            NotifyError::Protocol { ref reason } if reason.contains("longer than 1000 bytes")
        ));
    }

    #[tokio::test]
    async fn long_line_within_limit_is_accepted() {
        let mut greeting = b"220 ".to_vec();
        greeting.extend(vec![b'x'; 900]);
        greeting.extend_from_slice(b"\r\n");
        let addr = serve_once(greeting).await;

        let session = SmtpSession::connect(&addr, "127.0.0.1").await.unwrap();
        assert!(!session.is_encrypted());
        assert!(session.extensions().is_empty());
    }

    #[tokio::test]
    async fn code_change_mid_reply_is_rejected() {
        let addr = serve_once(b"220-mail.example.com\r\n250 ready\r\n".to_vec()).await;

        let err = SmtpSession::connect(&addr, "127.0.0.1").await.err().unwrap();
        assert!(matches!(err, NotifyError::Protocol { .. }));
    }

    #[tokio::test]
    async fn non_220_greeting_is_rejected() {
        let addr = serve_once(b"554 no service\r\n".to_vec()).await;

        let err = SmtpSession::connect(&addr, "127.0.0.1").await.err().unwrap();
        assert_eq!(err.to_string(), "greeting rejected: 554 no service");
    }
}
