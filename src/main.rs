use activator_config::{AppConfig, LogLevel, OutputFormat};
use anyhow::{Context, Result};
use bus_activator::app::Application;
use bus_activator::logging::init_logging;
use clap::{Arg, Command};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let matches = Command::new("bus-activator")
        .version("1.0.0")
        .about("为后台作业注入消息总线的作业激活器")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("日志级别")
                .value_parser(["trace", "debug", "info", "warn", "error"]),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("日志格式")
                .value_parser(["json", "pretty"]),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .value_name("NAMES")
                .help("要运行的作业名称，逗号分隔")
                .value_delimiter(','),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config");

    // 加载配置
    let mut config = AppConfig::load(config_path.map(String::as_str))
        .with_context(|| format!("加载配置失败: {config_path:?}"))?;

    if let Some(level) = matches.get_one::<String>("log-level") {
        config.log.level = level
            .parse::<LogLevel>()
            .map_err(|e| anyhow::anyhow!(e))?;
    }
    if let Some(format) = matches.get_one::<String>("log-format") {
        config.log.format = format
            .parse::<OutputFormat>()
            .map_err(|e| anyhow::anyhow!(e))?;
    }
    if let Some(jobs) = matches.get_many::<String>("jobs") {
        config.host.jobs = jobs.cloned().collect();
    }

    // 初始化日志系统
    init_logging(&config.log)?;

    info!("启动作业激活器");
    if let Some(path) = config_path {
        info!("配置文件: {path}");
    }

    let app = Application::new(config);
    let summary = app.run().await?;

    if summary.failed > 0 {
        warn!("{} 个作业失败", summary.failed);
    }
    info!("作业激活器已退出");
    Ok(())
}
