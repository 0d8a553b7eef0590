//! Top-level ETL driver: build every configured chain and run them in
//! order.
//!
//! The chain list lives under `etl.chains` as a comma-separated list of
//! chain specifications. One failing chain is logged and recorded but does
//! not abort the batch, so a bad chain cannot take down a multi-chain run.

use std::path::Path;
use std::time::Instant;

use sluice_core::{ComponentRegistry, ConfigError, ConfigStore};

use crate::chain::Chain;
use crate::config::parser;
use crate::errors::ChainAssemblyError;
use crate::result::RunResult;

/// Section and key where the chain list is configured.
const ETL_SECTION: &str = "etl";
const CHAINS_KEY: &str = "chains";

/// Outcome of one configured chain: either its run result or the assembly
/// error that prevented the run.
#[derive(Debug)]
pub struct ChainOutcome {
    pub spec: String,
    pub result: Result<RunResult, ChainAssemblyError>,
}

impl ChainOutcome {
    pub fn is_done(&self) -> bool {
        matches!(&self.result, Ok(r) if r.is_done())
    }
}

/// Outcome of a whole ETL invocation.
#[derive(Debug)]
pub struct EtlSummary {
    pub outcomes: Vec<ChainOutcome>,
    pub duration_secs: f64,
}

impl EtlSummary {
    pub fn all_done(&self) -> bool {
        self.outcomes.iter().all(ChainOutcome::is_done)
    }
}

/// The main driver: builds chains of components from a configuration
/// store and lets them run.
pub struct Etl {
    store: ConfigStore,
    registry: ComponentRegistry,
}

impl Etl {
    pub fn new(store: ConfigStore, registry: ComponentRegistry) -> Self {
        Self { store, registry }
    }

    /// Load the configuration document from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path, registry: ComponentRegistry) -> Result<Self, ConfigError> {
        Ok(Self::new(parser::parse_config(path)?, registry))
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// The configured chain specifications, in declared order.
    ///
    /// # Errors
    ///
    /// Returns an error if `etl.chains` is missing or empty.
    pub fn chain_specs(&self) -> Result<Vec<String>, ConfigError> {
        let raw = self.store.get(ETL_SECTION, CHAINS_KEY).ok_or_else(|| {
            ConfigError::MissingRequired {
                section: ETL_SECTION.to_string(),
                name: CHAINS_KEY.to_string(),
            }
        })?;
        let specs: Vec<String> = raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if specs.is_empty() {
            return Err(ConfigError::InvalidValue {
                section: ETL_SECTION.to_string(),
                name: CHAINS_KEY.to_string(),
                detail: "no chains configured".to_string(),
            });
        }
        Ok(specs)
    }

    /// Assemble every configured chain without running it. Used by
    /// configuration checks.
    pub fn check(&self) -> Result<Vec<(String, Result<Chain, ChainAssemblyError>)>, ConfigError> {
        let specs = self.chain_specs()?;
        Ok(specs
            .into_iter()
            .map(|spec| {
                let assembled = Chain::assemble(&spec, &self.store, &self.registry);
                (spec, assembled)
            })
            .collect())
    }

    /// Assemble and run every configured chain in order.
    ///
    /// # Errors
    ///
    /// Returns an error only if the chain list itself cannot be read;
    /// per-chain failures are recorded in the summary.
    pub fn run(&self) -> Result<EtlSummary, ConfigError> {
        let specs = self.chain_specs()?;
        let started = Instant::now();
        let mut outcomes = Vec::with_capacity(specs.len());

        for spec in specs {
            tracing::info!(chain = spec.as_str(), "starting chain");
            match Chain::assemble(&spec, &self.store, &self.registry) {
                Ok(mut chain) => {
                    let result = chain.run();
                    if let Some(err) = &result.error {
                        tracing::error!(
                            chain = spec.as_str(),
                            error = %err,
                            "chain failed; continuing with next chain"
                        );
                    }
                    outcomes.push(ChainOutcome {
                        spec,
                        result: Ok(result),
                    });
                }
                Err(err) => {
                    tracing::error!(
                        chain = spec.as_str(),
                        error = %err,
                        "chain assembly failed; continuing with next chain"
                    );
                    outcomes.push(ChainOutcome {
                        spec,
                        result: Err(err),
                    });
                }
            }
        }

        Ok(EtlSummary {
            outcomes,
            duration_secs: started.elapsed().as_secs_f64(),
        })
    }
}
