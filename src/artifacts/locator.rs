use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::core::constants::repository::JAR_EXTENSION;
use crate::core::coordinate::ArtifactCoordinate;
use crate::core::report::MatchedFile;

/// 文件名匹配规则
///
/// 精确名称 `<artifact>-<version>.jar` 及其 -all / -sources / -javadoc 变体，
/// 外加兜底的 `*<artifact>*<version>*.jar`。只看文件名，不读取文件内容。
pub struct FileNamePattern {
    exact: Vec<String>,
    fallback: Option<Regex>,
}

impl FileNamePattern {
    pub fn new(coordinate: &ArtifactCoordinate) -> Self {
        let fallback = format!(
            "^.*{}.*{}.*\\.{}$",
            regex::escape(coordinate.artifact()),
            regex::escape(coordinate.version()),
            JAR_EXTENSION
        );
        Self {
            exact: coordinate.qualified_file_names(),
            // 各部分都已转义，表达式总是合法的
            fallback: Regex::new(&fallback).ok(),
        }
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.exact.iter().any(|name| name == file_name)
            || self
                .fallback
                .as_ref()
                .is_some_and(|fallback| fallback.is_match(file_name))
    }
}

/// 旧版本文件定位器
pub struct Locator;

impl Locator {
    /// 在所有目录中递归查找与坐标匹配的文件
    ///
    /// 不存在或不可读的目录会被跳过并记录警告，不会报错。
    pub fn locate(coordinate: &ArtifactCoordinate, dirs: &[PathBuf]) -> Vec<MatchedFile> {
        let pattern = FileNamePattern::new(coordinate);
        let mut seen = HashSet::new();
        let mut matches = Vec::new();

        for dir in dirs {
            if !dir.exists() {
                warn!(dir = %dir.display(), "search directory does not exist, skipping");
                continue;
            }
            if !dir.is_dir() {
                warn!(dir = %dir.display(), "search path is not a directory, skipping");
                continue;
            }

            let found = Self::scan_dir(dir, &pattern);
            info!(dir = %dir.display(), count = found.len(), "scanned directory");

            for path in found {
                // 重叠的搜索目录只报告一次
                let key = fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
                if seen.insert(key) {
                    matches.push(MatchedFile::new(path));
                }
            }
        }

        matches
    }

    fn scan_dir(dir: &Path, pattern: &FileNamePattern) -> Vec<PathBuf> {
        let mut found = Vec::new();

        for entry in WalkDir::new(dir).follow_links(false).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "unreadable entry, skipping");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let matched = pattern.matches(&entry.file_name().to_string_lossy());
            if matched {
                debug!(path = %entry.path().display(), "matched");
                found.push(entry.into_path());
            }
        }

        found
    }
}
