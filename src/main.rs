use promptrelay::{logger, server, Config, GeminiClient, ImageAnalyzer};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let config = Config::from_env();
    logger::init_with_config(logger::LoggerConfig::from_relay_config(&config))?;

    if dotenv_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), &config);

    let client = match GeminiClient::new(config.gemini.clone()) {
        Ok(client) => {
            log::info!("✅ Gemini client initialized ({})", client.model());
            client
        }
        Err(e) => {
            log::error!("❌ Failed to initialize Gemini client: {}", e);
            return Err(e.into());
        }
    };

    let analyzer: Arc<dyn ImageAnalyzer> = Arc::new(client);
    server::run(config, analyzer).await?;

    log::info!("👋 Server stopped");
    Ok(())
}
