use clap::Parser;
use crm_property_etl::config::{access_token_from_env, DEFAULT_TOKEN_ENV};
use crm_property_etl::core::ConfigProvider;
use crm_property_etl::utils::error::ErrorSeverity;
use crm_property_etl::utils::{logger, validation::Validate};
use crm_property_etl::{
    CliConfig, EtlEngine, LocalStorage, PropertyPipeline, Result, ResultStatus, TomlConfig,
};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // .env is optional; real environment variables win.
    dotenvy::dotenv().ok();

    let cli = CliConfig::parse();

    if cli.log_format == "json" {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting crm-property-etl");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let outcome = match &cli.config {
        Some(path) => {
            tracing::info!("📄 Loading configuration from {}", path);
            match TomlConfig::from_file(path) {
                Ok(config) => {
                    let token_env = config.token_env().to_string();
                    run(config, &token_env).await
                }
                Err(e) => Err(e),
            }
        }
        None => run(cli.clone(), DEFAULT_TOKEN_ENV).await,
    };

    if let Err(e) = outcome {
        tracing::error!(
            "❌ Property import failed: {} (Severity: {:?})",
            e,
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };

        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run<C: ConfigProvider + Validate>(config: C, token_env: &str) -> Result<()> {
    config.validate()?;
    let access_token = access_token_from_env(token_env)?;

    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = PropertyPipeline::new(storage, config, access_token);
    let engine = EtlEngine::new(pipeline);

    let summary = engine.run().await?;

    tracing::info!("📁 Report saved to: {}", summary.report_path);
    println!(
        "✅ Processed {} rows: {} created, {} failed, {} invalid",
        summary.results.len() - summary.count(ResultStatus::CriticalError),
        summary.count(ResultStatus::Success),
        summary.count(ResultStatus::Failure),
        summary.count(ResultStatus::InvalidObject),
    );
    if summary.count(ResultStatus::CriticalError) > 0 {
        println!("⚠️ The input file could not be read completely; see the report");
    }
    println!("📁 Report saved to: {}", summary.report_path);

    Ok(())
}
