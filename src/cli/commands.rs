use clap::Parser;
use std::path::PathBuf;

/// patch-artifact CLI 应用程序
#[derive(Parser, Debug)]
#[command(name = "patch-artifact")]
#[command(about = "Replace vulnerable jar versions in an installed application tree", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Group ID，例如 net.minidev
    pub group: String,

    /// Artifact ID，例如 json-smart
    pub artifact: String,

    /// 需要替换的旧版本
    pub old_version: String,

    /// 替换后的新版本
    pub new_version: String,

    /// 搜索目录，单个参数内可用空格分隔多个目录
    pub target_dirs: Vec<String>,

    /// 仓库地址（默认 Maven Central）
    #[arg(long)]
    pub repository: Option<String>,

    /// 只显示将要执行的操作，不修改文件
    #[arg(long)]
    pub dry_run: bool,

    /// 输出调试日志
    #[arg(short, long)]
    pub verbose: bool,

    /// 跳过文件占用检测
    #[arg(short, long)]
    pub force: bool,

    /// 替换前备份旧文件
    #[arg(short, long)]
    pub backup: bool,

    /// 校验下载文件的摘要（仅警告）
    #[arg(long)]
    pub checksum: bool,

    /// 备份目录
    #[arg(long)]
    pub backup_dir: Option<PathBuf>,

    /// 配置文件路径
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// JSON 格式输出报告
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// 将目录参数按空白拆分
    pub fn search_dirs(&self) -> Vec<PathBuf> {
        self.target_dirs
            .iter()
            .flat_map(|arg| arg.split_whitespace())
            .map(PathBuf::from)
            .collect()
    }
}
