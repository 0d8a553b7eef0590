use std::path::Path;

use anyhow::{Context, Result};

use sluice_components::builtin_registry;
use sluice_engine::Etl;

/// Execute the `check` command: assemble every configured chain and report
/// what would run, without running it.
pub fn execute(config_path: &Path) -> Result<()> {
    let etl = Etl::from_file(config_path, builtin_registry())
        .with_context(|| format!("Failed to load configuration: {}", config_path.display()))?;

    let mut failed = 0usize;
    for (spec, assembled) in etl.check()? {
        match assembled {
            Ok(chain) => {
                println!("Chain '{}': OK", spec);
                for (role, section) in chain.stage_sections() {
                    println!("  {:<6} [{}]", role, section);
                }
            }
            Err(err) => {
                failed += 1;
                println!("Chain '{}': {}", spec, err);
            }
        }
    }

    if failed == 0 {
        Ok(())
    } else {
        anyhow::bail!("{failed} chain(s) failed to assemble");
    }
}
