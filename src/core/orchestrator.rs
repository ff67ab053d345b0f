use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{debug, error, info, warn};

use crate::artifacts::{BackupManager, Locator, ReplaceOutcome, Replacer};
use crate::core::coordinate::ArtifactCoordinate;
use crate::core::report::{BackupRecord, FailureKind, MatchedFile, OperationReport};
use crate::core::request::PatchRequest;
use crate::error::{PatchError, PatchResult};
use crate::infrastructure::process::InUseProbe;
use crate::infrastructure::remote::{Downloader, ProgressFn, Transport};

/// 运行阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Discover,
    Resolve,
    Download,
    Backup,
    Replace,
    Report,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Discover => "discover",
            Stage::Resolve => "resolve",
            Stage::Download => "download",
            Stage::Backup => "backup",
            Stage::Replace => "replace",
            Stage::Report => "report",
        };
        f.write_str(name)
    }
}

/// 下载到本地的新制品，drop 时连同临时目录一起删除
pub struct DownloadedArtifact {
    pub local_path: PathBuf,
    pub coordinate: ArtifactCoordinate,
    workspace: TempDir,
}

impl DownloadedArtifact {
    fn prepare(coordinate: &ArtifactCoordinate) -> std::io::Result<Self> {
        let workspace = tempfile::Builder::new()
            .prefix("patch-artifact-")
            .tempdir()?;
        Ok(Self {
            local_path: workspace.path().join(coordinate.file_name()),
            coordinate: coordinate.clone(),
            workspace,
        })
    }

    fn cleanup(self) {
        let path = self.workspace.path().to_path_buf();
        if let Err(e) = self.workspace.close() {
            warn!(path = %path.display(), error = %e, "failed to remove download workspace");
        }
    }
}

/// 补丁流程编排器
///
/// DISCOVER → RESOLVE → DOWNLOAD → BACKUP → REPLACE → REPORT，
/// 新制品只下载一次，再复制到每个匹配的目录。
pub struct Orchestrator {
    transport: Arc<dyn Transport>,
    probe: Option<Box<dyn InUseProbe>>,
}

impl Orchestrator {
    /// probe 为 None 时不做占用检测（--force）
    pub fn new(transport: Arc<dyn Transport>, probe: Option<Box<dyn InUseProbe>>) -> Self {
        Self { transport, probe }
    }

    /// 执行一次补丁请求
    ///
    /// 坐标和下载错误直接返回；单个文件的失败记录在报告中，不影响其他文件。
    pub async fn run(
        &self,
        request: &PatchRequest,
        progress: &ProgressFn,
    ) -> PatchResult<OperationReport> {
        let old = request.old();
        let new = request.new_coordinate();
        let options = request.options();
        let mut report = OperationReport::new(old.to_string(), new.to_string(), options.dry_run);

        enter(Stage::Discover);
        let matched = discover(request);
        report.matched = matched.clone();
        if matched.is_empty() {
            info!(coordinate = %old, "no matching files found, nothing to do");
            enter(Stage::Report);
            return Ok(report);
        }
        info!(coordinate = %old, count = matched.len(), "found files to patch");

        enter(Stage::Resolve);
        let url = new.resolve(request.repository_url())?;
        info!(%url, "resolved download url");
        report.download_url = Some(url.clone());

        if options.dry_run {
            self.preview(request, &matched, &url, &mut report)?;
            enter(Stage::Report);
            return Ok(report);
        }

        enter(Stage::Download);
        let artifact = DownloadedArtifact::prepare(new)
            .map_err(|e| PatchError::fetch_failed(&url, format!("cannot create workspace: {e}")))?;
        let verify = options
            .verify_checksum
            .then_some(request.checksum_algorithm());

        match Downloader::new(Arc::clone(&self.transport))
            .fetch(&url, &artifact.local_path, verify, progress)
            .await
        {
            Ok(checksum) => report.checksum = checksum,
            Err(e) => {
                error!(stage = %Stage::Download, %url, error = %e, "download failed, no files were modified");
                artifact.cleanup();
                return Err(e);
            }
        }

        let backups = BackupManager::new(request.backup_dir(), options.backup);
        let replacer = Replacer::new(self.probe.as_deref(), options);

        for file in &matched {
            if backups.is_enabled() {
                enter(Stage::Backup);
                match backups.backup(&file.path) {
                    Ok(Some(backup)) => report.backups.push(BackupRecord {
                        source: file.path.clone(),
                        backup,
                    }),
                    Ok(None) => {}
                    Err(e) => warn!(
                        stage = %Stage::Backup,
                        path = %file.path.display(),
                        error = %e,
                        "backup failed, replacing anyway"
                    ),
                }
            }

            enter(Stage::Replace);
            match replacer.replace(file, &artifact.local_path, &artifact.coordinate) {
                Ok(_) => report.record_replaced(file.clone()),
                Err(e) => {
                    error!(
                        stage = %Stage::Replace,
                        path = %file.path.display(),
                        error = %e,
                        "replacement failed"
                    );
                    let kind = FailureKind::from_error(&e).unwrap_or(FailureKind::CopyFailed);
                    report.record_failed(file.clone(), kind, e.to_string());
                }
            }
        }

        artifact.cleanup();
        enter(Stage::Report);
        info!(
            matched = report.matched.len(),
            replaced = report.replaced.len(),
            failed = report.failed.len(),
            "patch run finished"
        );
        Ok(report)
    }

    /// 预览模式：只描述将要执行的操作
    fn preview(
        &self,
        request: &PatchRequest,
        matched: &[MatchedFile],
        url: &str,
        report: &mut OperationReport,
    ) -> PatchResult<()> {
        info!(%url, "[dry-run] would download artifact once");
        if request.options().backup {
            info!(
                backup_dir = %request.backup_dir().display(),
                "[dry-run] would back up matched files"
            );
        }

        let replacer = Replacer::new(None, request.options());
        for file in matched {
            if let ReplaceOutcome::DryRun { .. } =
                replacer.replace(file, Path::new(""), request.new_coordinate())?
            {
                report.planned.push(file.clone());
            }
        }
        Ok(())
    }
}

fn enter(stage: Stage) {
    info!(stage = %stage, "entering stage");
}

/// 查找旧版本文件，排除已经是新版本规范名称的文件
fn discover(request: &PatchRequest) -> Vec<MatchedFile> {
    let new_name = request.new_coordinate().file_name();
    Locator::locate(request.old(), request.search_dirs())
        .into_iter()
        .filter(|file| {
            let keep = file.file_name() != new_name;
            if !keep {
                debug!(path = %file.path.display(), "already at the new version, skipping");
            }
            keep
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::report::ChecksumStatus;
    use crate::core::request::PatchOptions;
    use crate::infrastructure::remote::memory::MemoryTransport;
    use sha1::{Digest, Sha1};
    use std::collections::BTreeMap;
    use std::fs;
    use std::io;
    use tempfile::TempDir;
    use walkdir::WalkDir;

    const REPO: &str = "https://repo.example/maven2";
    const URL: &str = "https://repo.example/maven2/net/minidev/json-smart/2.5.2/json-smart-2.5.2.jar";
    const NEW_BYTES: &[u8] = b"json-smart 2.5.2";
    const OLD_BYTES: &[u8] = b"json-smart 2.4.3";

    fn no_progress(_: u64, _: u64) {}

    struct Tree {
        root: TempDir,
        lib: PathBuf,
        plugins: PathBuf,
    }

    impl Tree {
        /// /lib 和 /plugins 都放一个 json-smart-2.4.3.jar
        fn new() -> Self {
            let root = TempDir::new().unwrap();
            let lib = root.path().join("opt/lib");
            let plugins = root.path().join("opt/plugins");
            for dir in [&lib, &plugins] {
                fs::create_dir_all(dir).unwrap();
                fs::write(dir.join("json-smart-2.4.3.jar"), OLD_BYTES).unwrap();
            }
            Self { root, lib, plugins }
        }

        fn dirs(&self) -> Vec<PathBuf> {
            vec![self.lib.clone(), self.plugins.clone()]
        }

        fn backup_dir(&self) -> PathBuf {
            self.root.path().join("backups")
        }

        fn snapshot(&self) -> BTreeMap<PathBuf, Vec<u8>> {
            WalkDir::new(self.root.path())
                .into_iter()
                .flatten()
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| {
                    let bytes = fs::read(entry.path()).unwrap();
                    (entry.into_path(), bytes)
                })
                .collect()
        }
    }

    fn request(tree: &Tree, options: PatchOptions) -> PatchRequest {
        let old = ArtifactCoordinate::new("net.minidev", "json-smart", "2.4.3").unwrap();
        PatchRequest::new(old, "2.5.2", tree.dirs(), REPO, options)
            .unwrap()
            .with_backup_dir(tree.backup_dir())
    }

    fn online() -> Arc<MemoryTransport> {
        Arc::new(MemoryTransport::new().with_response(URL, NEW_BYTES))
    }

    struct PathProbe(PathBuf);

    impl InUseProbe for PathProbe {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn holders(&self, path: &Path) -> io::Result<Vec<u32>> {
            Ok(if path == self.0 { vec![99] } else { Vec::new() })
        }
    }

    /// 查询时删除被检测的文件，使随后的删除失败
    struct VanishingProbe;

    impl InUseProbe for VanishingProbe {
        fn name(&self) -> &'static str {
            "vanishing"
        }

        fn holders(&self, path: &Path) -> io::Result<Vec<u32>> {
            fs::remove_file(path)?;
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_replaces_in_every_directory_with_single_download() {
        let tree = Tree::new();
        let transport = online();
        let orchestrator = Orchestrator::new(transport.clone(), None);

        let report = orchestrator
            .run(&request(&tree, PatchOptions::default()), &no_progress)
            .await
            .unwrap();

        assert_eq!(report.matched.len(), 2);
        assert_eq!(report.replaced.len(), 2);
        assert!(report.failed.is_empty());
        assert_eq!(report.exit_code(), 0);
        for dir in tree.dirs() {
            assert_eq!(fs::read(dir.join("json-smart-2.5.2.jar")).unwrap(), NEW_BYTES);
            assert!(!dir.join("json-smart-2.4.3.jar").exists());
        }
        assert_eq!(transport.request_count(URL), 1);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_second_run_finds_nothing() {
        let tree = Tree::new();
        let transport = online();
        let orchestrator = Orchestrator::new(transport.clone(), None);
        let request = request(&tree, PatchOptions::default());

        orchestrator.run(&request, &no_progress).await.unwrap();
        let second = orchestrator.run(&request, &no_progress).await.unwrap();

        assert!(second.matched.is_empty());
        assert!(second.replaced.is_empty());
        assert_eq!(second.exit_code(), 0);
        assert_eq!(transport.request_count(URL), 1);
    }

    #[tokio::test]
    async fn test_zero_matches_writes_nothing() {
        let root = TempDir::new().unwrap();
        let lib = root.path().join("lib");
        fs::create_dir_all(&lib).unwrap();
        fs::write(lib.join("other-1.0.jar"), b"other").unwrap();
        let transport = online();
        let orchestrator = Orchestrator::new(transport.clone(), None);
        let old = ArtifactCoordinate::new("net.minidev", "json-smart", "2.4.3").unwrap();
        let options = PatchOptions {
            backup: true,
            ..PatchOptions::default()
        };
        let request = PatchRequest::new(old, "2.5.2", vec![lib.clone()], REPO, options)
            .unwrap()
            .with_backup_dir(root.path().join("backups"));

        let report = orchestrator.run(&request, &no_progress).await.unwrap();

        assert_eq!(report.exit_code(), 0);
        assert!(report.matched.is_empty());
        assert!(transport.requests().is_empty());
        assert!(!root.path().join("backups").exists());
        assert_eq!(fs::read_dir(&lib).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_tree_untouched() {
        let tree = Tree::new();
        let before = tree.snapshot();
        let options = PatchOptions {
            backup: true,
            ..PatchOptions::default()
        };
        let orchestrator = Orchestrator::new(Arc::new(MemoryTransport::offline()), None);

        let result = orchestrator.run(&request(&tree, options), &no_progress).await;

        assert!(matches!(result, Err(PatchError::FetchFailed { .. })));
        assert_eq!(tree.snapshot(), before);
        for dir in tree.dirs() {
            assert_eq!(fs::read(dir.join("json-smart-2.4.3.jar")).unwrap(), OLD_BYTES);
        }
    }

    #[tokio::test]
    async fn test_dry_run_is_byte_for_byte_noop() {
        let tree = Tree::new();
        let before = tree.snapshot();
        let transport = online();
        let options = PatchOptions {
            dry_run: true,
            backup: true,
            verify_checksum: true,
            ..PatchOptions::default()
        };
        let orchestrator = Orchestrator::new(transport.clone(), None);

        let report = orchestrator.run(&request(&tree, options), &no_progress).await.unwrap();

        assert!(report.dry_run);
        assert_eq!(report.planned.len(), 2);
        assert!(report.replaced.is_empty());
        assert_eq!(report.download_url.as_deref(), Some(URL));
        assert!(transport.requests().is_empty());
        assert_eq!(tree.snapshot(), before);
    }

    #[tokio::test]
    async fn test_one_bad_directory_does_not_block_the_other() {
        let tree = Tree::new();
        // plugins 中目标名被目录占用，复制必然失败
        fs::create_dir_all(tree.plugins.join("json-smart-2.5.2.jar")).unwrap();
        let options = PatchOptions {
            backup: true,
            ..PatchOptions::default()
        };
        let orchestrator = Orchestrator::new(online(), None);

        let report = orchestrator.run(&request(&tree, options), &no_progress).await.unwrap();

        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.replaced.len(), 1);
        assert_eq!(report.replaced[0].containing_dir, tree.lib);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].kind, FailureKind::CopyFailed);
        assert_eq!(report.failed[0].file.containing_dir, tree.plugins);
        assert!(tree.plugins.join("json-smart-2.4.3.jar").exists());

        // 两个文件在替换前都已备份
        assert_eq!(report.backups.len(), 2);
        for record in &report.backups {
            assert_eq!(fs::read(&record.backup).unwrap(), OLD_BYTES);
        }
    }

    #[tokio::test]
    async fn test_in_use_file_is_reported() {
        let tree = Tree::new();
        let busy = tree.lib.join("json-smart-2.4.3.jar");
        let orchestrator = Orchestrator::new(online(), Some(Box::new(PathProbe(busy.clone()))));

        let report = orchestrator
            .run(&request(&tree, PatchOptions::default()), &no_progress)
            .await
            .unwrap();

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].kind, FailureKind::FileInUse);
        assert!(busy.exists());
        assert!(!tree.lib.join("json-smart-2.5.2.jar").exists());
        assert!(tree.plugins.join("json-smart-2.5.2.jar").exists());
    }

    #[tokio::test]
    async fn test_delete_failure_is_reported() {
        let tree = Tree::new();
        let orchestrator = Orchestrator::new(online(), Some(Box::new(VanishingProbe)));

        let report = orchestrator
            .run(&request(&tree, PatchOptions::default()), &no_progress)
            .await
            .unwrap();

        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.failed.len(), 2);
        assert!(report
            .failed
            .iter()
            .all(|failed| failed.kind == FailureKind::DeleteFailed));
        assert!(report.replaced.is_empty());
        for dir in tree.dirs() {
            assert_eq!(fs::read(dir.join("json-smart-2.5.2.jar")).unwrap(), NEW_BYTES);
        }
    }

    #[tokio::test]
    async fn test_backup_failure_does_not_block_replacement() {
        let root = TempDir::new().unwrap();
        let lib = root.path().join("lib");
        fs::create_dir_all(&lib).unwrap();
        fs::write(lib.join("json-smart-2.4.3.jar"), OLD_BYTES).unwrap();
        // 备份目录的父路径是普通文件，create_dir_all 必然失败
        let blocker = root.path().join("blocker");
        fs::write(&blocker, b"file").unwrap();
        let old = ArtifactCoordinate::new("net.minidev", "json-smart", "2.4.3").unwrap();
        let options = PatchOptions {
            backup: true,
            ..PatchOptions::default()
        };
        let request = PatchRequest::new(old, "2.5.2", vec![lib.clone()], REPO, options)
            .unwrap()
            .with_backup_dir(blocker.join("sub"));
        let orchestrator = Orchestrator::new(online(), None);

        let report = orchestrator.run(&request, &no_progress).await.unwrap();

        assert_eq!(report.replaced.len(), 1);
        assert!(report.failed.is_empty());
        assert!(report.backups.is_empty());
        assert_eq!(report.exit_code(), 0);
        assert_eq!(fs::read(lib.join("json-smart-2.5.2.jar")).unwrap(), NEW_BYTES);
    }

    #[tokio::test]
    async fn test_checksum_status_recorded() {
        let tree = Tree::new();
        let digest = hex::encode(Sha1::digest(NEW_BYTES));
        let transport = MemoryTransport::new()
            .with_response(URL, NEW_BYTES)
            .with_response(&format!("{URL}.sha1"), digest.as_bytes());
        let options = PatchOptions {
            verify_checksum: true,
            ..PatchOptions::default()
        };
        let orchestrator = Orchestrator::new(Arc::new(transport), None);

        let report = orchestrator.run(&request(&tree, options), &no_progress).await.unwrap();

        assert!(matches!(report.checksum, ChecksumStatus::Verified { .. }));
        assert_eq!(report.replaced.len(), 2);
    }

    #[tokio::test]
    async fn test_checksum_mismatch_still_patches() {
        let tree = Tree::new();
        let transport = MemoryTransport::new()
            .with_response(URL, NEW_BYTES)
            .with_response(&format!("{URL}.sha1"), &[b'0'; 40]);
        let options = PatchOptions {
            verify_checksum: true,
            ..PatchOptions::default()
        };
        let orchestrator = Orchestrator::new(Arc::new(transport), None);

        let report = orchestrator.run(&request(&tree, options), &no_progress).await.unwrap();

        assert!(matches!(report.checksum, ChecksumStatus::Mismatch { .. }));
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::Discover.to_string(), "discover");
        assert_eq!(Stage::Report.to_string(), "report");
    }
}
