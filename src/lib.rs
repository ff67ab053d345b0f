// 核心模块
pub mod artifacts;
pub mod cli;
pub mod core;
pub mod error;
pub mod infrastructure;
pub mod utils;

// 重新导出常用类型
pub use artifacts::{BackupManager, Locator, ReplaceOutcome, Replacer};
pub use cli::{Cli, CommandHandler};
pub use error::*;
pub use utils::ValidationUtils;
// 使用命名空间导入常量，避免冲突
pub use core::constants as app_constants;
pub use core::{
    ArtifactCoordinate, ChecksumAlgorithm, ChecksumStatus, FailureKind, MatchedFile,
    OperationReport, Orchestrator, PatchOptions, PatchRequest,
};

pub use infrastructure::config::Config;
pub use infrastructure::process::{detect_probe, InUseProbe, ProbeKind};
pub use infrastructure::remote::{Downloader, HttpClient, Transport, TransportError};
