use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 补丁流程的错误类型
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("无效的坐标: {field} - {reason}")]
    InvalidCoordinate { field: String, reason: String },

    #[error("无效的仓库地址: {url} - {reason}")]
    InvalidRepository { url: String, reason: String },

    #[error("缺少依赖: {name} ({reason})")]
    MissingDependency { name: String, reason: String },

    #[error("下载失败: {url} - {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("文件正在被使用: {} (进程: {})", path.display(), format_pids(pids))]
    FileInUse { path: PathBuf, pids: Vec<u32> },

    #[error("复制失败: {} - {reason}", path.display())]
    CopyFailed { path: PathBuf, reason: String },

    #[error("删除失败: {} - {reason}", path.display())]
    DeleteFailed { path: PathBuf, reason: String },

    #[error("配置错误: {message}")]
    Config { message: String },

    #[error("IO 错误: {0}")]
    Io(#[from] io::Error),
}

fn format_pids(pids: &[u32]) -> String {
    if pids.is_empty() {
        return "unknown".to_string();
    }
    pids.iter()
        .map(|pid| pid.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// 应用程序 Result 类型
pub type PatchResult<T> = Result<T, PatchError>;

/// 便捷的错误创建函数
impl PatchError {
    pub fn invalid_coordinate(field: &str, reason: &str) -> Self {
        Self::InvalidCoordinate {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_repository(url: &str, reason: impl Into<String>) -> Self {
        Self::InvalidRepository {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub fn missing_dependency(name: &str, reason: &str) -> Self {
        Self::MissingDependency {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn fetch_failed(url: &str, reason: impl Into<String>) -> Self {
        Self::FetchFailed {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub fn copy_failed(path: &Path, reason: impl ToString) -> Self {
        Self::CopyFailed {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn delete_failed(path: &Path, reason: impl ToString) -> Self {
        Self::DeleteFailed {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 面向用户的处理建议
    pub fn suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::InvalidCoordinate { .. } => {
                vec!["检查 group/artifact/version 参数，例如: net.minidev json-smart 2.4.3 2.5.2"]
            }
            Self::InvalidRepository { .. } => {
                vec!["--repository 需要 http:// 或 https:// 开头的完整地址"]
            }
            Self::MissingDependency { .. } => vec![
                "安装 lsof 或在支持 /proc 的系统上运行",
                "使用 --force 跳过占用检测",
            ],
            Self::FetchFailed { .. } => vec![
                "检查网络连接和仓库地址",
                "确认目标版本在仓库中存在",
            ],
            Self::FileInUse { .. } => vec![
                "停止正在使用该文件的进程后重试",
                "或使用 --force 跳过占用检测",
            ],
            Self::CopyFailed { .. } | Self::DeleteFailed { .. } => {
                vec!["检查目标目录的写权限"]
            }
            Self::Config { .. } => vec!["检查配置文件格式，或使用 --config 指定其他文件"],
            Self::Io(_) => Vec::new(),
        }
    }

    /// 获取用户友好的错误消息
    pub fn user_message(&self) -> String {
        let mut msg = format!("❌ {self}\n");
        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            msg.push_str("💡 建议:\n");
            for suggestion in suggestions {
                msg.push_str(&format!("  • {suggestion}\n"));
            }
        }
        msg
    }
}
