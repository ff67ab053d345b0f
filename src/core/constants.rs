//! 应用程序常量定义
//!
//! 本模块包含全局使用的常量，避免魔数并提供统一的配置值。

/// 仓库相关常量
pub mod repository {
    /// Maven Central 默认地址
    pub const MAVEN_CENTRAL_URL: &str = "https://repo1.maven.org/maven2";
    /// 制品文件扩展名
    pub const JAR_EXTENSION: &str = "jar";
    /// 需要额外匹配的限定符变体
    pub const QUALIFIERS: &[&str] = &["all", "sources", "javadoc"];
}

/// 下载相关常量
pub mod download {
    /// 下载中的临时文件后缀
    pub const TEMP_SUFFIX: &str = ".tmp";
    /// 下载缓冲区大小（字节）
    pub const BUFFER_SIZE: usize = 8192;
    /// HTTP User-Agent
    pub const USER_AGENT: &str = concat!("patch-artifact/", env!("CARGO_PKG_VERSION"));
}

/// 备份相关常量
pub mod backup {
    /// 备份文件名中的标记
    pub const BACKUP_MARKER: &str = "backup";
    /// 备份时间戳格式
    pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
}

/// 替换相关常量
pub mod replace {
    /// 复制新制品时使用的临时文件前缀
    pub const STAGING_PREFIX: &str = ".patch-artifact-";
}

/// 默认配置值
pub mod defaults {
    /// 默认配置目录（相对用户主目录）
    pub const DEFAULT_CONFIG_DIR: &str = ".patch-artifact";
    /// 默认配置文件名
    pub const CONFIG_FILE_NAME: &str = "config.toml";
    /// 默认备份目录名
    pub const BACKUP_DIR_NAME: &str = "backups";
    /// 未指定目录时的默认搜索目录
    pub const DEFAULT_SEARCH_DIR: &str = ".";
}

