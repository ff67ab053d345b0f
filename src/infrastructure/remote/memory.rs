//! 测试用的内存传输层

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::http_client::{ProgressFn, Transport, TransportError};

/// 按 URL 返回固定内容，并记录所有请求
#[derive(Default)]
pub struct MemoryTransport {
    responses: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
    offline: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 所有请求都以网络错误失败
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub fn with_response(mut self, url: &str, body: &[u8]) -> Self {
        self.responses.insert(url.to_string(), body.to_vec());
        self
    }

    /// 已发出的请求
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// 指定 URL 被请求的次数
    pub fn request_count(&self, url: &str) -> usize {
        self.requests().iter().filter(|r| r.as_str() == url).count()
    }

    fn lookup(&self, url: &str) -> Result<&Vec<u8>, TransportError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }
        if self.offline {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "network unreachable",
            )));
        }
        self.responses.get(url).ok_or(TransportError::NotFound)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn download(
        &self,
        url: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
        progress: &ProgressFn,
    ) -> Result<u64, TransportError> {
        let body = self.lookup(url)?;
        sink.write_all(body).await?;
        sink.flush().await?;
        progress(body.len() as u64, body.len() as u64);
        Ok(body.len() as u64)
    }

    async fn get_text(&self, url: &str) -> Result<String, TransportError> {
        let body = self.lookup(url)?;
        Ok(String::from_utf8_lossy(body).into_owned())
    }
}
