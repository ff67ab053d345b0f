use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::PatchError;

/// 磁盘上匹配到的旧版本文件
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MatchedFile {
    pub path: PathBuf,
    pub containing_dir: PathBuf,
}

impl MatchedFile {
    pub fn new(path: PathBuf) -> Self {
        let containing_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            path,
            containing_dir,
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// 单个文件替换失败的类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    FileInUse,
    CopyFailed,
    DeleteFailed,
}

impl FailureKind {
    /// 从错误中提取失败类别，非单文件错误返回 None
    pub fn from_error(error: &PatchError) -> Option<Self> {
        match error {
            PatchError::FileInUse { .. } => Some(FailureKind::FileInUse),
            PatchError::CopyFailed { .. } => Some(FailureKind::CopyFailed),
            PatchError::DeleteFailed { .. } => Some(FailureKind::DeleteFailed),
            _ => None,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::FileInUse => "FileInUse",
            FailureKind::CopyFailed => "CopyFailed",
            FailureKind::DeleteFailed => "DeleteFailed",
        };
        f.write_str(name)
    }
}

/// 替换失败的文件
#[derive(Debug, Clone, Serialize)]
pub struct FailedFile {
    pub file: MatchedFile,
    pub kind: FailureKind,
    pub reason: String,
}

/// 下载制品的校验结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChecksumStatus {
    NotRequested,
    Verified { algorithm: String, digest: String },
    Mismatch { algorithm: String, expected: String, actual: String },
    Unavailable { algorithm: String, reason: String },
}

/// 备份记录
#[derive(Debug, Clone, Serialize)]
pub struct BackupRecord {
    pub source: PathBuf,
    pub backup: PathBuf,
}

/// 一次运行的汇总报告
#[derive(Debug, Clone, Serialize)]
pub struct OperationReport {
    pub old: String,
    pub new: String,
    pub dry_run: bool,
    pub download_url: Option<String>,
    pub checksum: ChecksumStatus,
    pub matched: Vec<MatchedFile>,
    pub replaced: Vec<MatchedFile>,
    pub failed: Vec<FailedFile>,
    pub backups: Vec<BackupRecord>,
    pub planned: Vec<MatchedFile>,
}

impl OperationReport {
    pub fn new(old: String, new: String, dry_run: bool) -> Self {
        Self {
            old,
            new,
            dry_run,
            download_url: None,
            checksum: ChecksumStatus::NotRequested,
            matched: Vec::new(),
            replaced: Vec::new(),
            failed: Vec::new(),
            backups: Vec::new(),
            planned: Vec::new(),
        }
    }

    /// 记录成功替换；同一文件不会同时出现在 replaced 和 failed 中
    pub fn record_replaced(&mut self, file: MatchedFile) {
        self.failed.retain(|failed| failed.file != file);
        if !self.replaced.contains(&file) {
            self.replaced.push(file);
        }
    }

    /// 记录替换失败
    pub fn record_failed(&mut self, file: MatchedFile, kind: FailureKind, reason: String) {
        self.replaced.retain(|replaced| *replaced != file);
        self.failed.push(FailedFile { file, kind, reason });
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// 进程退出码：有失败文件时为 1
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}
