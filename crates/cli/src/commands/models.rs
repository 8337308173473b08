//! `oraculo models`: List providers and the models they offer.

use oraculo_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("Available models");
    println!("================");
    println!();
    print!("{}", format_registry(&config));
    println!();
    println!("  * marks the default. Pick another with `oraculo chat --model <name>`");
    println!("  or set ORACULO_MODEL.");

    Ok(())
}

fn format_registry(config: &AppConfig) -> String {
    let mut out = String::new();
    for (name, provider) in &config.providers {
        let endpoint = provider.api_url.as_deref().unwrap_or("default endpoint");
        out.push_str(&format!("  {name} ({endpoint})\n"));
        for model in &provider.models {
            let is_default = name.eq_ignore_ascii_case(&config.default_provider)
                && *model == config.default_model;
            let marker = if is_default { '*' } else { ' ' };
            out.push_str(&format!("    {marker} {model}\n"));
        }
    }
    out
}
