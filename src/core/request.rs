use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::coordinate::ArtifactCoordinate;
use crate::error::{PatchError, PatchResult};
use crate::infrastructure::config::default_backup_dir;
use crate::utils::validation::ValidationUtils;

/// 校验和算法
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl ChecksumAlgorithm {
    /// 仓库中校验文件的扩展名
    pub fn extension(&self) -> &'static str {
        match self {
            ChecksumAlgorithm::Sha1 => "sha1",
            ChecksumAlgorithm::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// 运行选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PatchOptions {
    pub dry_run: bool,
    pub verbose: bool,
    pub force: bool,
    pub backup: bool,
    pub verify_checksum: bool,
}

/// 一次补丁请求
///
/// 在入口处构造一次，之后只读地传给各个组件。
#[derive(Debug, Clone)]
pub struct PatchRequest {
    old: ArtifactCoordinate,
    new: ArtifactCoordinate,
    search_dirs: Vec<PathBuf>,
    repository_url: String,
    backup_dir: PathBuf,
    checksum_algorithm: ChecksumAlgorithm,
    options: PatchOptions,
}

impl PatchRequest {
    /// 创建请求，新旧坐标只允许版本不同
    pub fn new(
        old: ArtifactCoordinate,
        new_version: &str,
        search_dirs: Vec<PathBuf>,
        repository_url: &str,
        options: PatchOptions,
    ) -> PatchResult<Self> {
        let new = old.with_version(new_version)?;
        if new.version() == old.version() {
            return Err(PatchError::invalid_coordinate(
                "version",
                "old and new versions are identical",
            ));
        }

        let repository_url = ValidationUtils::validate_repository_url(repository_url)
            .map_err(|reason| PatchError::invalid_repository(repository_url, reason))?;

        Ok(Self {
            old,
            new,
            search_dirs,
            repository_url,
            backup_dir: default_backup_dir(),
            checksum_algorithm: ChecksumAlgorithm::default(),
            options,
        })
    }

    /// 设置备份目录
    pub fn with_backup_dir(mut self, backup_dir: PathBuf) -> Self {
        self.backup_dir = backup_dir;
        self
    }

    /// 设置校验和算法
    pub fn with_checksum_algorithm(mut self, algorithm: ChecksumAlgorithm) -> Self {
        self.checksum_algorithm = algorithm;
        self
    }

    pub fn old(&self) -> &ArtifactCoordinate {
        &self.old
    }

    pub fn new_coordinate(&self) -> &ArtifactCoordinate {
        &self.new
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    pub fn repository_url(&self) -> &str {
        &self.repository_url
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    pub fn checksum_algorithm(&self) -> ChecksumAlgorithm {
        self.checksum_algorithm
    }

    pub fn options(&self) -> &PatchOptions {
        &self.options
    }
}
