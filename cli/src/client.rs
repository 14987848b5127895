//! # Node Client
//!
//! Submits signed transactions to a node's explorer API. Nodes configured
//! with `ssl` are reached over `https` through rustls.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use exonum_launcher::config::NodeConfig;

/// Upper bound on one submission, connect to last body byte.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct SubmitBody<'a> {
    tx_body: &'a str,
}

/// Response of the node to a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResponse {
    pub status: u16,
    pub body: String,
}

/// HTTP client bound to one node's transaction endpoint.
#[derive(Debug, Clone)]
pub struct NodeClient {
    http: reqwest::Client,
    url: reqwest::Url,
}

impl NodeClient {
    /// Client for the explorer endpoint of `node`.
    pub fn new(node: &NodeConfig) -> Result<Self> {
        Self::with_url(&node.transactions_url())
    }

    pub fn with_url(url: &str) -> Result<Self> {
        let url = reqwest::Url::parse(url).with_context(|| format!("invalid node URL {}", url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("unsupported scheme in node URL {}", url);
        }
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http, url })
    }

    pub fn url(&self) -> &reqwest::Url {
        &self.url
    }

    /// POSTs `{"tx_body": <hex>}` and returns the node's response.
    ///
    /// Non-2xx statuses are returned as errors carrying the response body.
    pub async fn submit(&self, tx_hex: &str) -> Result<SubmitResponse> {
        let response = self
            .http
            .post(self.url.clone())
            .json(&SubmitBody { tx_body: tx_hex })
            .send()
            .await
            .with_context(|| format!("failed to reach {}", self.url))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("failed to read node response")?;

        if !status.is_success() {
            bail!(
                "node rejected transaction (HTTP {}): {}",
                status.as_u16(),
                body
            );
        }
        Ok(SubmitResponse {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    #[test]
    fn ssl_node_gets_https_endpoint() {
        let node = NodeConfig {
            hostname: "node.example".to_string(),
            public_api_port: 443,
            ssl: true,
        };
        let client = NodeClient::new(&node).unwrap();
        assert_eq!(client.url().scheme(), "https");
        assert_eq!(client.url().path(), "/api/explorer/v1/transactions");
    }

    #[test]
    fn rejects_unusable_urls() {
        assert!(NodeClient::with_url("not a url").is_err());
        assert!(NodeClient::with_url("ftp://node.example/").is_err());
    }

    /// Reads one request, headers plus a `Content-Length` body.
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut received = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            received.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&received);
            if let Some((head, body)) = text.split_once("\r\n\r\n") {
                let length = head
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if body.len() >= length {
                    break;
                }
            }
        }
        String::from_utf8(received).unwrap()
    }

    /// Accepts one connection, answers with `response`, and yields the
    /// request that was received.
    async fn serve_once(response: &'static [u8]) -> (u16, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            socket.write_all(response).await.unwrap();
            socket.shutdown().await.unwrap();
            request
        });
        (port, server)
    }

    fn local_client(port: u16) -> NodeClient {
        NodeClient::new(&NodeConfig {
            hostname: "127.0.0.1".to_string(),
            public_api_port: port,
            ssl: false,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn submits_tx_body_as_json() {
        let (port, server) = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 8\r\nConnection: close\r\n\r\n\"0a0b0c\"",
        )
        .await;

        let resp = local_client(port).submit("0a0b0c").await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, "\"0a0b0c\"");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/explorer/v1/transactions HTTP/1.1\r\n"));
        assert!(request
            .to_ascii_lowercase()
            .contains("content-type: application/json"));
        assert!(request.ends_with(r#"{"tx_body":"0a0b0c"}"#));
    }

    #[tokio::test]
    async fn chunked_response_is_read_whole() {
        let (port, _server) = serve_once(
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n4\r\n\"0a0\r\n4\r\nb0c\"\r\n0\r\n\r\n",
        )
        .await;

        let resp = local_client(port).submit("0a0b0c").await.unwrap();
        assert_eq!(resp.body, "\"0a0b0c\"");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let (port, _server) = serve_once(
            b"HTTP/1.1 400 Bad Request\r\nContent-Length: 13\r\nConnection: close\r\n\r\nbad signature",
        )
        .await;

        let err = local_client(port).submit("00").await.unwrap_err();
        assert!(err.to_string().contains("bad signature"));
    }
}
