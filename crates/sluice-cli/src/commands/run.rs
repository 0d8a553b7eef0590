use std::path::Path;

use anyhow::{Context, Result};

use sluice_components::builtin_registry;
use sluice_engine::Etl;

/// Execute the `run` command: load the configuration and run every chain.
pub fn execute(config_path: &Path) -> Result<()> {
    let etl = Etl::from_file(config_path, builtin_registry())
        .with_context(|| format!("Failed to load configuration: {}", config_path.display()))?;

    let summary = etl.run()?;

    for outcome in &summary.outcomes {
        match &outcome.result {
            Ok(result) => {
                let status = if result.is_done() { "done" } else { "FAILED" };
                println!("Chain '{}': {}", outcome.spec, status);
                println!("  Cycles:    {}", result.counts.cycles);
                println!("  Delivered: {}", result.counts.delivered);
                println!("  Skipped:   {}", result.counts.skipped);
                println!("  Duration:  {:.2}s", result.duration_secs);
                if let Some(err) = &result.error {
                    println!("  Error:     {}", err);
                }
                for failure in &result.cleanup_failures {
                    println!("  Cleanup [{}] failed: {}", failure.section, failure.error);
                }
            }
            Err(err) => {
                println!("Chain '{}': assembly failed: {}", outcome.spec, err);
            }
        }
    }
    println!("Total duration: {:.2}s", summary.duration_secs);

    if summary.all_done() {
        Ok(())
    } else {
        anyhow::bail!("one or more chains failed");
    }
}
