use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::core::constants::backup::{BACKUP_MARKER, TIMESTAMP_FORMAT};
use crate::error::PatchResult;

/// 备份管理器
///
/// 备份是尽力而为的安全网，失败由调用方记录警告后继续。
pub struct BackupManager {
    backup_dir: PathBuf,
    enabled: bool,
}

impl BackupManager {
    pub fn new(backup_dir: &Path, enabled: bool) -> Self {
        Self {
            backup_dir: backup_dir.to_path_buf(),
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// 复制文件到 `<backup_dir>/<basename>.backup.<timestamp>`
    ///
    /// 未启用时直接返回 `Ok(None)`。
    pub fn backup(&self, file: &Path) -> PatchResult<Option<PathBuf>> {
        if !self.enabled {
            return Ok(None);
        }

        if !file.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("File not found: {}", file.display()),
            )
            .into());
        }

        fs::create_dir_all(&self.backup_dir)?;
        let backup_path = self.generate_backup_path(file)?;
        fs::copy(file, &backup_path)?;

        info!(
            source = %file.display(),
            backup = %backup_path.display(),
            "backup created"
        );
        Ok(Some(backup_path))
    }

    /// 生成不与已有备份冲突的路径
    fn generate_backup_path(&self, file: &Path) -> io::Result<PathBuf> {
        let file_name = file
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Invalid file name"))?;
        let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT);
        let base_name = format!("{}.{}.{}", file_name.to_string_lossy(), BACKUP_MARKER, timestamp);

        let mut candidate = self.backup_dir.join(&base_name);
        let mut counter = 1u32;
        // 不同目录下的同名文件可能在同一秒内备份
        while candidate.exists() {
            candidate = self.backup_dir.join(format!("{base_name}.{counter}"));
            counter += 1;
        }

        Ok(candidate)
    }
}
