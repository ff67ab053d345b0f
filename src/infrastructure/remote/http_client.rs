use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// 下载进度回调 (已下载, 总大小)
pub type ProgressFn = dyn Fn(u64, u64) + Send + Sync;

/// HTTP GET 能力
#[async_trait]
pub trait Transport: Send + Sync {
    /// 将 url 的响应体流式写入 sink，返回写入的字节数
    async fn download(
        &self,
        url: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
        progress: &ProgressFn,
    ) -> Result<u64, TransportError>;

    /// GET 请求并返回文本
    async fn get_text(&self, url: &str) -> Result<String, TransportError>;
}

/// 基于 reqwest 的 HTTP 客户端，单次请求，不做重试
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// 创建新的 HTTP 客户端
    pub fn new(user_agent: &str) -> Result<Self, TransportError> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, TransportError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::from_status(status));
        }
        Ok(response)
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn download(
        &self,
        url: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
        progress: &ProgressFn,
    ) -> Result<u64, TransportError> {
        let response = self.get(url).await?;
        let total_size = response.content_length().unwrap_or(0);
        let mut downloaded = 0u64;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            sink.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
            progress(downloaded, total_size);
        }

        sink.flush().await?;

        // 服务器声明了长度时，连接提前断开视为失败
        if total_size > 0 && downloaded != total_size {
            return Err(TransportError::Truncated {
                expected: total_size,
                actual: downloaded,
            });
        }

        Ok(downloaded)
    }

    async fn get_text(&self, url: &str) -> Result<String, TransportError> {
        let response = self.get(url).await?;
        Ok(response.text().await?)
    }
}

/// 网络错误类型
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found")]
    NotFound,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Incomplete body: expected {expected} bytes, got {actual}")]
    Truncated { expected: u64, actual: u64 },

    #[error("Write failed: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// 从 HTTP 状态码创建错误
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        match status {
            reqwest::StatusCode::NOT_FOUND => Self::NotFound,
            _ => Self::ServerError(format!("HTTP error: {}", status)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status() {
        assert!(matches!(
            TransportError::from_status(reqwest::StatusCode::NOT_FOUND),
            TransportError::NotFound
        ));
        let err = TransportError::from_status(reqwest::StatusCode::BAD_GATEWAY);
        assert!(err.to_string().contains("502"));
    }
}
