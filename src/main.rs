use checkout_cards::core::driver::describe;
use checkout_cards::utils::error::ErrorSeverity;
use checkout_cards::utils::{logger, validation::Validate};
use checkout_cards::{AppConfig, CardDriver, CardError, CliConfig, Command, GoogleBooksResolver};
use clap::Parser;

fn exit_with(e: &CardError) -> ! {
    tracing::error!(
        "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

async fn run(cli: CliConfig, config: AppConfig) -> Result<(), CardError> {
    let root = tracing::info_span!("checkout_cards");
    let resolver = GoogleBooksResolver::new(&config)?
        .with_span(tracing::info_span!(parent: &root, "resolver"));
    let driver = CardDriver::new(config, resolver).with_span(root);

    match cli.command {
        Command::Populate => {
            let mut catalogue = driver.load_catalogue().await?;
            let report = driver.populate(&mut catalogue).await?;
            println!(
                "✅ {} cached, {} newly resolved, {} unresolved",
                report.cached,
                report.resolved,
                report.missing.len()
            );
            for identifier in &report.missing {
                println!("   ⚠️ {}", identifier);
            }
        }
        Command::Cards {
            layout,
            no_populate,
        } => {
            let report = driver.run(layout, !no_populate).await?;
            for path in &report.written {
                println!("📁 {}", path);
            }
            for (name, e) in &report.failed {
                eprintln!("❌ {}: {}", name, e.user_friendly_message());
            }
            if let Some((_, first)) = report.failed.first() {
                eprintln!("💡 {}", first.recovery_suggestion());
                std::process::exit(1);
            }
        }
        Command::Show => {
            let catalogue = driver.load_catalogue().await?;
            for line in describe(&catalogue) {
                println!("{}", line);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose, cli.json_logs);
    tracing::info!("Starting checkout-cards");
    tracing::debug!("CLI config: {:?}", cli);

    // 載入並驗證配置
    let config = match AppConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };
    let checked = if cli.command.needs_lookup() {
        config.validate().and_then(|()| config.validate_lookup())
    } else {
        config.validate()
    };
    if let Err(e) = checked {
        exit_with(&e);
    }

    if let Err(e) = run(cli, config).await {
        exit_with(&e);
    }
}
