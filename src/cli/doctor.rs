//! Environment readiness check.

use crate::config::EngineConfig;
use crate::sources::browser::find_chromium;
use crate::sources::http::HttpClient;
use anyhow::Result;
use url::Url;

/// Check Chromium availability, config sanity, and endpoint reachability.
pub async fn run(config: EngineConfig) -> Result<()> {
    println!("Demanda Doctor");
    println!("==============");
    println!();

    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;
    println!("OS:   {os}");
    println!("Arch: {arch}");
    println!();

    // Chromium (only the browser-rendered fallback needs it)
    let chromium = find_chromium();
    match &chromium {
        Some(path) => println!("[OK] Chromium found: {}", path.display()),
        None => println!(
            "[!!] Chromium NOT found. The browser-rendered fallback will be unavailable \
             (set DEMANDA_CHROMIUM_PATH)."
        ),
    }

    // Config URLs must parse before any adapter can use them
    let urls = [
        ("api_base_url", &config.api_base_url),
        ("legacy_landing_url", &config.legacy_landing_url),
        ("legacy_service_url", &config.legacy_service_url),
        ("page_url", &config.page_url),
    ];
    let mut urls_ok = true;
    for (name, value) in urls {
        match Url::parse(value) {
            Ok(_) => println!("[OK] {name} parses"),
            Err(e) => {
                urls_ok = false;
                println!("[!!] {name} invalid ({e}): {value}");
            }
        }
    }

    // Reachability probe against the rendering page (cheapest public URL)
    let client = HttpClient::new(5_000);
    match client.get(&config.page_url).await {
        Ok(resp) if resp.is_success() => println!("[OK] provider page reachable"),
        Ok(resp) => println!("[!!] provider page answered HTTP {}", resp.status),
        Err(e) => println!("[!!] provider page unreachable: {e}"),
    }

    println!();
    if urls_ok {
        println!("Status: READY");
        if chromium.is_none() {
            println!("  (degraded: browser fallback disabled)");
        }
    } else {
        println!("Status: NOT READY");
        println!("  Fix the config at {}", EngineConfig::default_path().display());
    }
    Ok(())
}
