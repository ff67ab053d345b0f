use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::core::constants::replace::STAGING_PREFIX;
use crate::core::coordinate::ArtifactCoordinate;
use crate::core::report::MatchedFile;
use crate::core::request::PatchOptions;
use crate::error::{PatchError, PatchResult};
use crate::infrastructure::process::InUseProbe;

/// 单个文件的替换结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// 新文件已就位，旧文件已删除
    Replaced { new_path: PathBuf },
    /// 预览模式，没有任何 IO
    DryRun { new_path: PathBuf },
}

/// 文件替换器
///
/// 顺序：占用检测 → 复制新文件 → 删除旧文件。目录中可以暂时同时存在
/// 两个版本，但不会出现两个版本都不存在的情况。
pub struct Replacer<'a> {
    probe: Option<&'a dyn InUseProbe>,
    force: bool,
    dry_run: bool,
}

impl<'a> Replacer<'a> {
    pub fn new(probe: Option<&'a dyn InUseProbe>, options: &PatchOptions) -> Self {
        Self {
            probe,
            force: options.force,
            dry_run: options.dry_run,
        }
    }

    /// 用 new_artifact 替换 matched
    pub fn replace(
        &self,
        matched: &MatchedFile,
        new_artifact: &Path,
        new_coordinate: &ArtifactCoordinate,
    ) -> PatchResult<ReplaceOutcome> {
        let new_path = matched.containing_dir.join(new_coordinate.file_name());

        if self.dry_run {
            info!(
                old = %matched.path.display(),
                new = %new_path.display(),
                "[dry-run] would replace"
            );
            return Ok(ReplaceOutcome::DryRun { new_path });
        }

        if !self.force {
            self.ensure_not_in_use(&matched.path)?;
        }

        self.install(new_artifact, &new_path, &matched.path)?;

        if matched.path == new_path {
            debug!(path = %new_path.display(), "matched file is the new artifact name, nothing to delete");
        } else {
            fs::remove_file(&matched.path)
                .map_err(|e| PatchError::delete_failed(&matched.path, e))?;
        }

        info!(
            old = %matched.path.display(),
            new = %new_path.display(),
            "replaced"
        );
        Ok(ReplaceOutcome::Replaced { new_path })
    }

    fn ensure_not_in_use(&self, path: &Path) -> PatchResult<()> {
        let probe = match self.probe {
            Some(probe) => probe,
            None => return Ok(()),
        };

        match probe.holders(path) {
            Ok(pids) if !pids.is_empty() => Err(PatchError::FileInUse {
                path: path.to_path_buf(),
                pids,
            }),
            Ok(_) => Ok(()),
            Err(e) => {
                // 检测失败不阻止替换
                warn!(
                    path = %path.display(),
                    probe = probe.name(),
                    error = %e,
                    "in-use check failed, assuming file is free"
                );
                Ok(())
            }
        }
    }

    /// 先复制到同目录的临时文件，再重命名到目标名称
    fn install(&self, source: &Path, target: &Path, replaced: &Path) -> PatchResult<()> {
        let staging = staging_path_for(target);

        if let Err(e) = fs::copy(source, &staging) {
            remove_staging(&staging);
            return Err(PatchError::copy_failed(target, e));
        }

        // 沿用被替换文件的权限
        if let Ok(metadata) = fs::metadata(replaced) {
            if let Err(e) = fs::set_permissions(&staging, metadata.permissions()) {
                warn!(path = %target.display(), error = %e, "failed to carry over permissions");
            }
        }

        if let Err(e) = fs::rename(&staging, target) {
            remove_staging(&staging);
            return Err(PatchError::copy_failed(target, e));
        }

        Ok(())
    }
}

fn staging_path_for(target: &Path) -> PathBuf {
    let file_name = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!("{STAGING_PREFIX}{file_name}"))
}

fn remove_staging(staging: &Path) {
    if staging.exists() {
        if let Err(e) = fs::remove_file(staging) {
            warn!(path = %staging.display(), error = %e, "failed to remove staging file");
        }
    }
}
