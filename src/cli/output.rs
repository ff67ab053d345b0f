use indicatif::{ProgressBar, ProgressStyle};

use crate::core::report::{ChecksumStatus, OperationReport};

/// 下载进度条，输出到 stderr
pub fn create_progress_bar(hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta}) {percent}%",
    ) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// 输出格式化器
pub struct OutputFormatter;

impl OutputFormatter {
    /// 格式化运行报告
    pub fn format_report(
        &self,
        report: &OperationReport,
        format: OutputFormat,
    ) -> Result<String, serde_json::Error> {
        match format {
            OutputFormat::Json => serde_json::to_string_pretty(report).map(|s| s + "\n"),
            OutputFormat::Text => Ok(self.format_report_text(report)),
        }
    }

    fn format_report_text(&self, report: &OperationReport) -> String {
        let mut output = String::new();

        if report.matched.is_empty() {
            output.push_str(&format!("No files matching {} found, nothing to do\n", report.old));
            return output;
        }

        let header = if report.dry_run { "Dry run" } else { "Patch summary" };
        output.push_str(&format!("{}: {} -> {}\n", header, report.old, report.new));
        if let Some(url) = &report.download_url {
            output.push_str(&format!("  source:   {}\n", url));
        }
        output.push_str(&format!("  matched:  {}\n", report.matched.len()));

        if report.dry_run {
            output.push_str(&format!("  planned:  {}\n", report.planned.len()));
            for file in &report.planned {
                output.push_str(&format!("  🔍 would replace {}\n", file.path.display()));
            }
            return output;
        }

        output.push_str(&format!("  replaced: {}\n", report.replaced.len()));
        output.push_str(&format!("  failed:   {}\n", report.failed.len()));
        if let Some(checksum) = self.format_checksum(&report.checksum) {
            output.push_str(&format!("  checksum: {}\n", checksum));
        }

        for file in &report.replaced {
            output.push_str(&format!("  ✅ {}\n", file.path.display()));
        }
        for failed in &report.failed {
            output.push_str(&format!(
                "  ❌ [{}] {}: {}\n",
                failed.kind,
                failed.file.path.display(),
                failed.reason
            ));
        }
        for record in &report.backups {
            output.push_str(&format!(
                "  💾 {} -> {}\n",
                record.source.display(),
                record.backup.display()
            ));
        }

        output
    }

    fn format_checksum(&self, status: &ChecksumStatus) -> Option<String> {
        match status {
            ChecksumStatus::NotRequested => None,
            ChecksumStatus::Verified { algorithm, digest } => {
                Some(format!("verified ({} {})", algorithm, digest))
            }
            ChecksumStatus::Mismatch {
                algorithm,
                expected,
                actual,
            } => Some(format!(
                "⚠️  MISMATCH ({} expected {}, got {})",
                algorithm, expected, actual
            )),
            ChecksumStatus::Unavailable { algorithm, reason } => {
                Some(format!("⚠️  not verified ({}: {})", algorithm, reason))
            }
        }
    }
}

/// 默认输出格式化器实例
pub static FORMATTER: OutputFormatter = OutputFormatter;
