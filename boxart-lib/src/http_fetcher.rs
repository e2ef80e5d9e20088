use crate::asset_fetcher::AssetFetcher;
use crate::config::Config;
use crate::error::FetchError;
use crate::model::{Application, Host};
use anyhow::{Context, Result};
use futures_util::StreamExt;
use reqwest::Client;
use url::Url;

/// Fetches box art with the host's `appasset` request.
#[derive(Debug, Clone)]
pub struct HttpAssetFetcher {
    client: Client,
    client_id: String,
    max_asset_bytes: u64,
}

impl HttpAssetFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("boxart/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            client_id: config.client_id.clone(),
            max_asset_bytes: config.max_asset_bytes,
        })
    }

    pub fn asset_url(&self, host: &Host, app: &Application) -> Result<Url, FetchError> {
        let base = format!("http://{}:{}/appasset", host.address, host.http_port);
        Url::parse_with_params(
            &base,
            &[
                ("uniqueid", self.client_id.as_str()),
                ("appid", app.id.as_str()),
                ("AssetRole", "0"),
                ("AssetType", "2"),
                ("AssetIdx", "0"),
            ],
        )
        .map_err(|e| FetchError::Other(format!("Invalid asset URL {base}: {e}")))
    }
}

impl AssetFetcher for HttpAssetFetcher {
    async fn fetch(&self, host: &Host, app: &Application) -> Result<Vec<u8>, FetchError> {
        let url = self.asset_url(host, app)?;
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let limit = self.max_asset_bytes;
        if response.content_length().is_some_and(|len| len > limit) {
            return Err(FetchError::TooLarge { limit });
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if (bytes.len() + chunk.len()) as u64 > limit {
                return Err(FetchError::TooLarge { limit });
            }
            bytes.extend_from_slice(&chunk);
        }

        if bytes.is_empty() {
            return Err(FetchError::Empty);
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answers a single HTTP request with `response` and returns the request line.
    async fn serve_once(response: &'static str) -> anyhow::Result<(u16, tokio::task::JoinHandle<String>)> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.expect("read request");
            socket
                .write_all(response.as_bytes())
                .await
                .expect("write response");
            socket.shutdown().await.ok();
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            request.lines().next().unwrap_or_default().to_string()
        });
        Ok((port, handle))
    }

    fn local_host(port: u16) -> Host {
        Host {
            http_port: port,
            ..Host::new("uuid-1", "127.0.0.1", vec![])
        }
    }

    fn fetcher() -> anyhow::Result<HttpAssetFetcher> {
        let tmp_dir = TempDir::new()?;
        HttpAssetFetcher::new(&Config::new_for_path(tmp_dir.path()))
    }

    fn fetcher_with_limit(max_asset_bytes: u64) -> anyhow::Result<HttpAssetFetcher> {
        let tmp_dir = TempDir::new()?;
        let config = Config {
            max_asset_bytes,
            ..Config::new_for_path(tmp_dir.path())
        };
        HttpAssetFetcher::new(&config)
    }

    #[test]
    fn test_asset_url() -> anyhow::Result<()> {
        let fetcher = fetcher()?;
        let url = fetcher.asset_url(&local_host(47989), &Application::new("id 1", "Desktop"))?;

        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:47989/appasset?uniqueid=0123456789ABCDEF&appid=id+1&AssetRole=0&AssetType=2&AssetIdx=0"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_returns_body() -> anyhow::Result<()> {
        let (port, server) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: 4\r\nConnection: close\r\n\r\nPNG!",
        )
        .await?;

        let bytes = fetcher()?
            .fetch(&local_host(port), &Application::new("881448767", "Desktop"))
            .await?;

        assert_eq!(bytes, b"PNG!");
        let request_line = server.await?;
        assert!(request_line.starts_with("GET /appasset?"));
        assert!(request_line.contains("appid=881448767"));
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_maps_error_status() -> anyhow::Result<()> {
        let (port, _server) = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await?;

        let result = fetcher()?
            .fetch(&local_host(port), &Application::new("1", "Missing"))
            .await;

        assert!(matches!(result, Err(FetchError::Status(404))));
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_rejects_empty_body() -> anyhow::Result<()> {
        let (port, _server) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await?;

        let result = fetcher()?
            .fetch(&local_host(port), &Application::new("1", "Blank"))
            .await;

        assert!(matches!(result, Err(FetchError::Empty)));
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_rejects_oversized_content_length() -> anyhow::Result<()> {
        let (port, _server) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: 10\r\nConnection: close\r\n\r\n0123456789",
        )
        .await?;

        let result = fetcher_with_limit(4)?
            .fetch(&local_host(port), &Application::new("1", "Huge"))
            .await;

        assert!(matches!(result, Err(FetchError::TooLarge { limit: 4 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_rejects_oversized_streamed_body() -> anyhow::Result<()> {
        // No Content-Length: the body runs until the connection closes.
        let (port, _server) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nConnection: close\r\n\r\n0123456789",
        )
        .await?;

        let result = fetcher_with_limit(4)?
            .fetch(&local_host(port), &Application::new("1", "Huge"))
            .await;

        assert!(matches!(result, Err(FetchError::TooLarge { limit: 4 })));
        Ok(())
    }
}
