use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::cli::commands::Cli;
use crate::cli::output::{create_progress_bar, OutputFormat, FORMATTER};
use crate::core::coordinate::ArtifactCoordinate;
use crate::core::orchestrator::Orchestrator;
use crate::core::request::{PatchOptions, PatchRequest};
use crate::error::{PatchError, PatchResult};
use crate::infrastructure::config::Config;
use crate::infrastructure::process::{detect_probe, InUseProbe};
use crate::infrastructure::remote::{HttpClient, Transport};

/// 命令处理器
pub struct CommandHandler {
    config: Config,
}

impl CommandHandler {
    /// 加载配置并创建命令处理器
    pub fn new(config_path: Option<&Path>) -> PatchResult<Self> {
        Ok(Self::with_config(Config::load(config_path)?))
    }

    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// 合并命令行和配置文件，构造不可变的请求
    pub fn build_request(&self, cli: &Cli) -> PatchResult<PatchRequest> {
        let old = ArtifactCoordinate::new(&cli.group, &cli.artifact, &cli.old_version)?;

        let search_dirs = match cli.search_dirs() {
            dirs if dirs.is_empty() => self.config.search_dirs.clone(),
            dirs => dirs,
        };
        let repository = cli
            .repository
            .as_deref()
            .unwrap_or(&self.config.repository);
        let backup_dir = cli
            .backup_dir
            .clone()
            .unwrap_or_else(|| self.config.backup_dir.clone());

        let options = PatchOptions {
            dry_run: cli.dry_run,
            verbose: cli.verbose,
            force: cli.force,
            backup: cli.backup,
            verify_checksum: cli.checksum,
        };

        Ok(
            PatchRequest::new(old, &cli.new_version, search_dirs, repository, options)?
                .with_backup_dir(backup_dir)
                .with_checksum_algorithm(self.config.checksum_algorithm),
        )
    }

    /// 处理命令，返回进程退出码
    pub async fn handle(&self, cli: &Cli) -> PatchResult<i32> {
        let transport = HttpClient::new(&self.config.user_agent)
            .map_err(|e| PatchError::missing_dependency("http client", &e.to_string()))?;
        self.handle_with_transport(cli, Arc::new(transport)).await
    }

    /// 使用指定的传输层处理命令
    pub async fn handle_with_transport(
        &self,
        cli: &Cli,
        transport: Arc<dyn Transport>,
    ) -> PatchResult<i32> {
        let request = self.build_request(cli)?;
        let options = request.options();

        // 占用检测能力在启动时确定，缺失时直接失败
        let probe: Option<Box<dyn InUseProbe>> = if options.force || options.dry_run {
            None
        } else {
            let probe = detect_probe(self.config.in_use_probe)?;
            info!(probe = probe.name(), "in-use detection enabled");
            Some(probe)
        };

        let orchestrator = Orchestrator::new(transport, probe);

        let format = if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        };
        let pb = create_progress_bar(cli.json);
        let bar = pb.clone();
        let progress = move |downloaded: u64, total: u64| {
            if total > 0 {
                bar.set_length(total);
            }
            bar.set_position(downloaded);
        };

        let result = orchestrator.run(&request, &progress).await;
        pb.finish_and_clear();
        let report = result?;

        let output = FORMATTER
            .format_report(&report, format)
            .map_err(|e| PatchError::Io(e.into()))?;
        print!("{}", output);

        Ok(report.exit_code())
    }
}
