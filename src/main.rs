use clap::Parser;
use patch_artifact::cli::{Cli, CommandHandler};
use patch_artifact::infrastructure::logging::init_logging;
use std::process;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help 和 --version 不是错误
            process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    init_logging(cli.verbose);

    let handler = match CommandHandler::new(cli.config.as_deref()) {
        Ok(handler) => handler,
        Err(e) => {
            eprint!("{}", e.user_message());
            process::exit(1);
        }
    };

    match handler.handle(&cli).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprint!("{}", e.user_message());
            process::exit(1);
        }
    }
}
