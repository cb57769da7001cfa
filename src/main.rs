use lotledger::{config::Config, db::init_db, read_export, LedgerProcessor, Repository};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match init_db(&config.database_path).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };
    let repo = Repository::new(pool);

    let Some(import) = config.import else {
        tracing::info!("No IMPORT_FILE configured, ledger initialized only");
        return;
    };

    let records = match read_export(&import.file, import.source, import.skip_invalid_records) {
        Ok(records) => records,
        Err(e) => {
            eprintln!("Failed to read {}: {}", import.file, e);
            std::process::exit(1);
        }
    };

    let summary = match LedgerProcessor::process_transactions(&repo, &records).await {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Processing stopped: {}", e);
            std::process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize summary: {}", e);
            std::process::exit(1);
        }
    }
}
