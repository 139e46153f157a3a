//! Blocking client for the RabbitMQ management HTTP API.

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Deserialize;
use tracing::debug;

use crate::config::{Config, Credentials};

/// Characters that cannot travel raw inside one path segment of a
/// management API URL. The default vhost "/" in particular must be sent
/// as "%2F".
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Per-request upper bound; one unresponsive broker must not hang the
/// whole invocation past the scheduler's own timeout window.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub type Result<T> = std::result::Result<T, BrokerError>;

/// Failure to observe a single queue.
#[derive(Debug, thiserror::Error)]
#[error("{queue}: {kind}")]
pub struct BrokerError {
    pub queue: String,
    pub kind: BrokerErrorKind,
}

#[derive(Debug, thiserror::Error)]
pub enum BrokerErrorKind {
    #[error("cannot communicate with RabbitMQ: {0}")]
    Network(#[source] reqwest::Error),
    #[error("request timed out")]
    Timeout,
    #[error("unauthorized")]
    Auth,
    #[error("queue not found")]
    NotFound,
    #[error("unexpected HTTP status {0}")]
    UnexpectedStatus(reqwest::StatusCode),
    #[error("malformed response: {0}")]
    Parse(#[source] serde_json::Error),
}

/// The slice of `GET /api/queues/{vhost}/{name}` this check cares about.
/// `messages_ready` counts messages enqueued and not yet consumed.
#[derive(Debug, Deserialize)]
struct QueueInfo {
    messages_ready: u64,
}

/// Anything that can report the current depth of a named queue.
///
/// [`BrokerClient`] is the production implementation; tests substitute a
/// recording fake.
pub trait FetchQueueDepth {
    fn fetch_depth(&self, queue: &str) -> Result<u64>;
}

/// Issues one blocking GET per queue against the management API, with
/// basic auth and a bounded per-request timeout. No batching, caching or
/// retries.
pub struct BrokerClient {
    http: reqwest::blocking::Client,
    host: String,
    port: u16,
    vhost: String,
    credentials: Credentials,
}

impl BrokerClient {
    pub fn new(config: &Config) -> std::result::Result<Self, reqwest::Error> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            host: config.host.clone(),
            port: config.port,
            vhost: config.vhost.clone(),
            credentials: config.credentials.clone(),
        })
    }

    fn queue_url(&self, queue: &str) -> String {
        queue_url(&self.host, self.port, &self.vhost, queue)
    }
}

/// Builds the metadata URL for one queue, percent-encoding the vhost and
/// queue name path segments.
pub fn queue_url(host: &str, port: u16, vhost: &str, queue: &str) -> String {
    format!(
        "http://{}:{}/api/queues/{}/{}",
        host,
        port,
        utf8_percent_encode(vhost, PATH_SEGMENT),
        utf8_percent_encode(queue, PATH_SEGMENT),
    )
}

impl FetchQueueDepth for BrokerClient {
    fn fetch_depth(&self, queue: &str) -> Result<u64> {
        let url = self.queue_url(queue);
        debug!(%url, queue, "querying queue depth");

        let err = |kind| BrokerError {
            queue: queue.to_owned(),
            kind,
        };

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .send()
            .map_err(|e| {
                err(if e.is_timeout() {
                    BrokerErrorKind::Timeout
                } else {
                    BrokerErrorKind::Network(e)
                })
            })?;

        let status = response.status();
        match status.as_u16() {
            200..=299 => {}
            401 => return Err(err(BrokerErrorKind::Auth)),
            404 => return Err(err(BrokerErrorKind::NotFound)),
            _ => return Err(err(BrokerErrorKind::UnexpectedStatus(status))),
        }

        let body = response.text().map_err(|e| {
            err(if e.is_timeout() {
                BrokerErrorKind::Timeout
            } else {
                BrokerErrorKind::Network(e)
            })
        })?;
        let info: QueueInfo =
            serde_json::from_str(&body).map_err(|e| err(BrokerErrorKind::Parse(e)))?;

        debug!(queue, depth = info.messages_ready, "queue depth observed");
        Ok(info.messages_ready)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use indexmap::IndexMap;

    use super::*;
    use crate::config::Threshold;

    #[test]
    fn test_queue_url_encodes_default_vhost() {
        let url = queue_url("localhost", 15672, "/", "incoming");
        assert_eq!(url, "http://localhost:15672/api/queues/%2F/incoming");
    }

    #[test]
    fn test_queue_url_encodes_reserved_characters() {
        let url = queue_url("rabbit.example.org", 15671, "staging", "my queue#1");
        assert_eq!(
            url,
            "http://rabbit.example.org:15671/api/queues/staging/my%20queue%231"
        );
    }

    fn test_config(port: u16) -> Config {
        let mut queues = IndexMap::new();
        queues.insert(
            "incoming".to_owned(),
            Threshold {
                warning: 1,
                critical: 2,
            },
        );
        Config {
            host: "127.0.0.1".to_owned(),
            port,
            vhost: "/".to_owned(),
            credentials: Credentials {
                username: "guest".to_owned(),
                password: "guest".to_owned(),
            },
            queues,
        }
    }

    /// Serves one canned HTTP response on a local port and hands back the
    /// raw request that was received.
    fn serve_once(status: &str, body: &str) -> (u16, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
        let port = listener.local_addr().expect("local addr").port();
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut buf = [0u8; 4096];
            let n = stream.read(&mut buf).expect("read request");
            stream.write_all(response.as_bytes()).expect("write response");
            String::from_utf8_lossy(&buf[..n]).into_owned()
        });

        (port, handle)
    }

    #[test]
    fn test_fetch_depth_ok() {
        let (port, handle) = serve_once("200 OK", r#"{"messages_ready": 42, "messages": 45}"#);
        let client = BrokerClient::new(&test_config(port)).unwrap();

        let depth = client.fetch_depth("incoming").unwrap();
        assert_eq!(depth, 42);

        let request = handle.join().unwrap();
        assert!(request.starts_with("GET /api/queues/%2F/incoming HTTP/1.1"));
        // guest:guest in basic auth
        assert!(request.contains("Z3Vlc3Q6Z3Vlc3Q="));
    }

    #[test]
    fn test_fetch_depth_unauthorized() {
        let (port, _handle) = serve_once("401 Unauthorized", "{}");
        let client = BrokerClient::new(&test_config(port)).unwrap();

        let error = client.fetch_depth("incoming").unwrap_err();
        assert_eq!(error.queue, "incoming");
        assert!(matches!(error.kind, BrokerErrorKind::Auth));
    }

    #[test]
    fn test_fetch_depth_not_found() {
        let (port, _handle) = serve_once("404 Object Not Found", r#"{"error": "not_found"}"#);
        let client = BrokerClient::new(&test_config(port)).unwrap();

        let error = client.fetch_depth("missing").unwrap_err();
        assert_eq!(error.queue, "missing");
        assert!(matches!(error.kind, BrokerErrorKind::NotFound));
    }

    #[test]
    fn test_fetch_depth_unexpected_status() {
        let (port, _handle) = serve_once("500 Internal Server Error", "{}");
        let client = BrokerClient::new(&test_config(port)).unwrap();

        let error = client.fetch_depth("incoming").unwrap_err();
        assert!(matches!(
            error.kind,
            BrokerErrorKind::UnexpectedStatus(status) if status.as_u16() == 500
        ));
    }

    #[test]
    fn test_fetch_depth_malformed_body() {
        let (port, _handle) = serve_once("200 OK", "not json at all");
        let client = BrokerClient::new(&test_config(port)).unwrap();

        let error = client.fetch_depth("incoming").unwrap_err();
        assert!(matches!(error.kind, BrokerErrorKind::Parse(_)));
    }

    #[test]
    fn test_fetch_depth_connection_refused() {
        // Grab a free port, then close the listener again so nothing is
        // listening when the client connects.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
            listener.local_addr().expect("local addr").port()
        };
        let client = BrokerClient::new(&test_config(port)).unwrap();

        let error = client.fetch_depth("incoming").unwrap_err();
        assert_eq!(error.queue, "incoming");
        assert!(matches!(error.kind, BrokerErrorKind::Network(_)));
    }
}
