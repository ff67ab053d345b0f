use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// 初始化日志，输出到 stderr，stdout 留给报告
pub fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    // 测试中可能被重复调用
    let _ = tracing::subscriber::set_global_default(subscriber);
}
