use clap::Parser;
use scheduler_check::core::engine::exit_status;
use scheduler_check::utils::{logger, validation::Validate};
use scheduler_check::{CheckConfig, CheckEngine, CliConfig, LocalStorage, SchedulePipeline};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init(cli.verbose, cli.json_logs);

    tracing::info!("Starting scheduler check");
    tracing::debug!("CLI args: {:?}", cli);

    // 載入並驗證配置
    let config = match CheckConfig::from_cli(&cli).and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration validation failed: {}", e);
            tracing::error!("Suggestion: {}", e.recovery_suggestion());
            eprintln!("{}", e.user_friendly_message());
            std::process::exit(e.exit_code());
        }
    };

    if cli.monitor {
        tracing::info!("Process monitoring enabled");
    }

    let pipeline = SchedulePipeline::new(LocalStorage::default(), config);
    let engine = CheckEngine::new_with_monitoring(pipeline, cli.monitor);

    let result = engine.run().await;
    match &result {
        Ok(summary) if summary.flagged_patients > 0 => {
            tracing::warn!("{} patients flagged", summary.flagged_patients);
        }
        Ok(_) => {}
        Err(e) => {
            tracing::error!(
                "Scheduler check failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("{}", e.user_friendly_message());
            eprintln!("Suggestion: {}", e.recovery_suggestion());
        }
    }

    std::process::exit(exit_status(&result, cli.fail_on_flags));
}
