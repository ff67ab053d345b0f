use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::constants::{defaults, download, repository};
use crate::core::request::ChecksumAlgorithm;
use crate::error::{PatchError, PatchResult};
use crate::infrastructure::process::ProbeKind;

/// 配置文件结构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// 制品仓库地址
    #[serde(default = "default_repository")]
    pub repository: String,
    /// 命令行未给出目录时使用的搜索目录
    #[serde(default = "default_search_dirs")]
    pub search_dirs: Vec<PathBuf>,
    /// 备份目录
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,
    #[serde(default)]
    pub checksum_algorithm: ChecksumAlgorithm,
    #[serde(default)]
    pub in_use_probe: ProbeKind,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_repository() -> String {
    repository::MAVEN_CENTRAL_URL.to_string()
}

fn default_search_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from(defaults::DEFAULT_SEARCH_DIR)]
}

fn default_user_agent() -> String {
    download::USER_AGENT.to_string()
}

/// 默认备份目录 `~/.patch-artifact/backups`
pub fn default_backup_dir() -> PathBuf {
    match get_config_dir() {
        Ok(dir) => dir.join(defaults::BACKUP_DIR_NAME),
        Err(_) => PathBuf::from(defaults::DEFAULT_CONFIG_DIR).join(defaults::BACKUP_DIR_NAME),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// 创建默认配置
    pub fn new() -> Self {
        Config {
            repository: default_repository(),
            search_dirs: default_search_dirs(),
            backup_dir: default_backup_dir(),
            checksum_algorithm: ChecksumAlgorithm::default(),
            in_use_probe: ProbeKind::default(),
            user_agent: default_user_agent(),
        }
    }

    /// 加载配置
    ///
    /// 显式指定的文件必须存在；默认位置的文件不存在时使用默认配置。
    /// 加载过程从不写盘。
    pub fn load(explicit: Option<&Path>) -> PatchResult<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => {
                let path = get_config_path()?;
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    Ok(Self::new())
                }
            }
        }
    }

    /// 从文件加载配置
    pub fn load_from(path: &Path) -> PatchResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PatchError::config(format!("无法读取配置文件 {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
            .map_err(|e| PatchError::config(format!("解析配置文件 {} 失败: {}", path.display(), e)))
    }

    /// 解析 TOML 内容
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// 获取配置文件路径
pub fn get_config_path() -> PatchResult<PathBuf> {
    Ok(get_config_dir()?.join(defaults::CONFIG_FILE_NAME))
}

/// 获取配置目录
pub fn get_config_dir() -> PatchResult<PathBuf> {
    let home_dir = dirs::home_dir().ok_or_else(|| PatchError::config("无法获取用户主目录"))?;
    Ok(home_dir.join(defaults::DEFAULT_CONFIG_DIR))
}
