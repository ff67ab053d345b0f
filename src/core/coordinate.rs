use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::constants::repository::{JAR_EXTENSION, QUALIFIERS};
use crate::error::{PatchError, PatchResult};
use crate::utils::validation::ValidationUtils;

/// Maven 风格的制品坐标 (group, artifact, version)
///
/// 构造后不可变；相等性是三个字段的字符串相等，不做语义化版本比较。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactCoordinate {
    group: String,
    artifact: String,
    version: String,
}

impl ArtifactCoordinate {
    /// 创建并验证坐标
    pub fn new(group: &str, artifact: &str, version: &str) -> PatchResult<Self> {
        ValidationUtils::validate_group(group)
            .map_err(|reason| PatchError::invalid_coordinate("group", &reason))?;
        ValidationUtils::validate_coordinate_part("artifact", artifact)
            .map_err(|reason| PatchError::invalid_coordinate("artifact", &reason))?;
        ValidationUtils::validate_coordinate_part("version", version)
            .map_err(|reason| PatchError::invalid_coordinate("version", &reason))?;

        Ok(Self {
            group: group.to_string(),
            artifact: artifact.to_string(),
            version: version.to_string(),
        })
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// 同一 group/artifact 的另一个版本
    pub fn with_version(&self, version: &str) -> PatchResult<Self> {
        Self::new(&self.group, &self.artifact, version)
    }

    /// 规范文件名: `<artifact>-<version>.jar`
    pub fn file_name(&self) -> String {
        format!("{}-{}.{}", self.artifact, self.version, JAR_EXTENSION)
    }

    /// 精确匹配的文件名，包括 -all / -sources / -javadoc 变体
    pub fn qualified_file_names(&self) -> Vec<String> {
        let mut names = vec![self.file_name()];
        names.extend(QUALIFIERS.iter().map(|qualifier| {
            format!(
                "{}-{}-{}.{}",
                self.artifact, self.version, qualifier, JAR_EXTENSION
            )
        }));
        names
    }

    /// 仓库中的相对路径: `net/minidev/json-smart/2.4.3/json-smart-2.4.3.jar`
    pub fn repository_path(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.group.replace('.', "/"),
            self.artifact,
            self.version,
            self.file_name()
        )
    }

    /// 将坐标解析为可下载的 URL
    pub fn resolve(&self, repository_base_url: &str) -> PatchResult<String> {
        let base = ValidationUtils::validate_repository_url(repository_base_url)
            .map_err(|reason| PatchError::invalid_repository(repository_base_url, reason))?;
        Ok(format!("{}/{}", base, self.repository_path()))
    }
}

impl fmt::Display for ArtifactCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)
    }
}
