//! List or search the provider's metric catalog.

use crate::catalog::CatalogResolver;
use crate::cli::output;
use crate::config::EngineConfig;
use anyhow::Result;

pub async fn run(config: EngineConfig, query: Option<&str>) -> Result<()> {
    let resolver = CatalogResolver::new(&config);
    let entries = resolver.entries().await?;

    let filtered: Vec<_> = match query {
        Some(q) => {
            let needle = q.to_lowercase();
            entries
                .into_iter()
                .filter(|m| {
                    m.id.to_lowercase().contains(&needle)
                        || m.display_name.to_lowercase().contains(&needle)
                })
                .collect()
        }
        None => entries,
    };

    if output::is_json() {
        output::print_json(&serde_json::json!({ "metrics": filtered }));
        return Ok(());
    }

    if filtered.is_empty() {
        println!("No catalog entries matched.");
        return Ok(());
    }
    for m in &filtered {
        println!("  {:<24} {}", m.id, m.display_name);
    }
    println!();
    println!("{} metric(s)", filtered.len());
    Ok(())
}
