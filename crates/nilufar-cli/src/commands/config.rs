//! Config file command implementations

use anyhow::{bail, Result};
use nilufar_core::config::{self, API_KEY_UNSET};
use nilufar_core::{AnalysisBackend, Config, DeepSeekBackend};

/// Mask an API key for display, keeping only a short prefix
fn mask_key(key: &str) -> String {
    if key.chars().count() <= 6 {
        "***".to_string()
    } else {
        let prefix: String = key.chars().take(6).collect();
        format!("{}***", prefix)
    }
}

pub fn cmd_config_show() -> Result<()> {
    let path = config::config_path()?;
    let config = Config::load()?;

    println!();
    println!("⚙️  Configuration  ({})", path.display());
    println!("   ─────────────────────────────────────────────");
    match config.api_key() {
        Some(key) => println!("   DeepSeek API key:  {}", mask_key(key)),
        None => println!("   DeepSeek API key:  (not configured)"),
    }
    println!("   Request timeout:   {}s", config.settings.timeout_secs);
    println!(
        "   Test timeout:      {}s",
        config.settings.connect_test_timeout_secs
    );
    println!("   Timeout retries:   {}", config.settings.max_retries);
    Ok(())
}

pub fn cmd_config_set_key(key: &str) -> Result<()> {
    let key = key.trim();
    if !key.starts_with("sk-") || key == API_KEY_UNSET {
        bail!("API key must start with 'sk-' and not be the placeholder");
    }

    let mut config = Config::load()?;
    config.deepseek.api_key = key.to_string();
    config.save()?;

    println!("✅ API key saved ({})", mask_key(key));
    Ok(())
}

pub async fn cmd_config_test() -> Result<()> {
    let config = Config::load()?;
    let backend = DeepSeekBackend::from_config(&config)?;

    println!("🔌 Testing connection to {}...", backend.model());
    let reply = backend.test_connection().await?;
    println!("✅ Connection OK, model replied: {}", reply.trim());
    Ok(())
}
