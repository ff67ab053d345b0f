use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use super::http_client::{ProgressFn, Transport};
use crate::core::constants::download::{BUFFER_SIZE, TEMP_SUFFIX};
use crate::core::report::ChecksumStatus;
use crate::core::request::ChecksumAlgorithm;
use crate::error::{PatchError, PatchResult};

/// 下载器：先写入 `<dest>.tmp`，完整写入后再重命名到 `<dest>`
///
/// 重命名是原子边界，`dest` 要么不存在，要么是完整文件。
pub struct Downloader {
    transport: Arc<dyn Transport>,
}

impl Downloader {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// 下载 url 到 dest，可选地校验仓库提供的摘要
    ///
    /// 校验只是提示性的：不匹配或取不到摘要时记录警告，不视为失败。
    pub async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        verify: Option<ChecksumAlgorithm>,
        progress: &ProgressFn,
    ) -> PatchResult<ChecksumStatus> {
        let temp_path = temp_path_for(dest);
        info!(url, dest = %dest.display(), "downloading artifact");

        let written = match self.write_temp(url, &temp_path, progress).await {
            Ok(written) => written,
            Err(e) => {
                remove_quietly(&temp_path).await;
                return Err(e);
            }
        };

        if let Err(e) = tokio::fs::rename(&temp_path, dest).await {
            remove_quietly(&temp_path).await;
            return Err(PatchError::fetch_failed(
                url,
                format!("rename {} failed: {}", temp_path.display(), e),
            ));
        }
        debug!(url, bytes = written, "download complete");

        match verify {
            None => Ok(ChecksumStatus::NotRequested),
            Some(algorithm) => Ok(self.verify_checksum(url, dest, algorithm).await),
        }
    }

    async fn write_temp(
        &self,
        url: &str,
        temp_path: &Path,
        progress: &ProgressFn,
    ) -> PatchResult<u64> {
        let mut file = tokio::fs::File::create(temp_path).await.map_err(|e| {
            PatchError::fetch_failed(url, format!("create {} failed: {}", temp_path.display(), e))
        })?;

        let written = self
            .transport
            .download(url, &mut file, progress)
            .await
            .map_err(|e| PatchError::fetch_failed(url, e.to_string()))?;

        file.sync_all()
            .await
            .map_err(|e| PatchError::fetch_failed(url, format!("sync failed: {e}")))?;
        Ok(written)
    }

    async fn verify_checksum(
        &self,
        url: &str,
        path: &Path,
        algorithm: ChecksumAlgorithm,
    ) -> ChecksumStatus {
        let checksum_url = format!("{}.{}", url, algorithm.extension());
        let unavailable = |reason: String| {
            warn!(url = %checksum_url, %reason, "checksum unavailable, continuing without verification");
            ChecksumStatus::Unavailable {
                algorithm: algorithm.to_string(),
                reason,
            }
        };

        let content = match self.transport.get_text(&checksum_url).await {
            Ok(content) => content,
            Err(e) => return unavailable(e.to_string()),
        };

        let expected = match parse_checksum_file(&content, algorithm) {
            Some(expected) => expected,
            None => return unavailable("malformed checksum file".to_string()),
        };

        let actual = match file_digest(path, algorithm).await {
            Ok(actual) => actual,
            Err(e) => return unavailable(format!("digest failed: {e}")),
        };

        if actual.eq_ignore_ascii_case(&expected) {
            info!(%algorithm, digest = %actual, "checksum verified");
            ChecksumStatus::Verified {
                algorithm: algorithm.to_string(),
                digest: actual,
            }
        } else {
            warn!(%algorithm, %expected, %actual, "checksum mismatch, continuing");
            ChecksumStatus::Mismatch {
                algorithm: algorithm.to_string(),
                expected,
                actual,
            }
        }
    }
}

/// `<dest>.tmp`
pub fn temp_path_for(dest: &Path) -> PathBuf {
    let mut name: OsString = dest.file_name().map(OsString::from).unwrap_or_default();
    name.push(TEMP_SUFFIX);
    dest.with_file_name(name)
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "failed to remove temporary file");
        }
    }
}

/// 校验文件内容可能是 `<hex>` 或 `<hex>  <filename>`
fn parse_checksum_file(content: &str, algorithm: ChecksumAlgorithm) -> Option<String> {
    let token = content.split_whitespace().next()?;
    let expected_len = match algorithm {
        ChecksumAlgorithm::Sha1 => 40,
        ChecksumAlgorithm::Sha256 => 64,
    };
    if token.len() == expected_len && token.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(token.to_ascii_lowercase())
    } else {
        None
    }
}

/// 计算文件摘要（小写十六进制）
pub async fn file_digest(path: &Path, algorithm: ChecksumAlgorithm) -> io::Result<String> {
    match algorithm {
        ChecksumAlgorithm::Sha1 => hash_file::<Sha1>(path).await,
        ChecksumAlgorithm::Sha256 => hash_file::<Sha256>(path).await,
    }
}

async fn hash_file<D: Digest>(path: &Path) -> io::Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = D::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let n = file.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}
