use anyhow::Result;
use clap::Parser;
use zip_creator_lib::cli::{runner, Args};

fn main() -> Result<()> {
    let args = Args::parse();

    // 日志写到 stderr，stdout 只留给命令输出；RUST_LOG 可覆盖
    let level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    runner::run(args)
}
