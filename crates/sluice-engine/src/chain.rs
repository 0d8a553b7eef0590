//! Chain assembly and the run-loop state machine.
//!
//! A chain is assembled once from its `|`-delimited stage-section list and
//! run once: `INIT -> RUNNING -> DRAINING -> DONE | FAILED`. Stages
//! execute strictly sequentially within a cycle, and cycles are
//! sequential; the only shared state is the packet metadata map, which is
//! safe without locking for exactly that reason.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use sluice_core::config::attr::CLASS_KEY;
use sluice_core::packet::new_chain_meta;
use sluice_core::{
    ComponentRegistry, ConfigError, ConfigStore, Feedback, Filter, Flow, Input, Output, Packet,
    Pull, Stage, StageError,
};

use crate::errors::{ChainAssemblyError, ChainRunError};
use crate::result::{CleanupFailure, RunCounts, RunResult, RunStatus};

/// Cooperative cancellation flag, checked once per cycle boundary.
///
/// Cancelling does not interrupt a stage mid-invoke; the chain notices the
/// flag before pulling the next input packet and drains normally.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Assembled,
    Init,
    Running,
    Draining,
    Done,
    Failed,
}

/// An assembled pipeline: one input, zero or more filters, one or more
/// outputs. Structurally immutable after assembly; not restartable after
/// [`Chain::run`].
pub struct Chain {
    name: String,
    input: Box<dyn Input>,
    filters: Vec<Box<dyn Filter>>,
    outputs: Vec<Box<dyn Output>>,
    state: RunState,
    cancel: CancelToken,
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("name", &self.name)
            .field("filters", &self.filters.len())
            .field("outputs", &self.outputs.len())
            .field("state", &self.state)
            .finish()
    }
}

impl Chain {
    /// Resolve `spec` (section names joined by `|`) against the store and
    /// registry, instantiate every stage, and verify the layout and
    /// adjacent format compatibility.
    pub fn assemble(
        spec: &str,
        store: &ConfigStore,
        registry: &ComponentRegistry,
    ) -> Result<Self, ChainAssemblyError> {
        let name = spec.trim().to_string();
        let sections: Vec<String> = name
            .split('|')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if sections.is_empty() {
            return Err(ChainAssemblyError::EmptyChain { chain: name });
        }

        let mut input: Option<Box<dyn Input>> = None;
        let mut filters: Vec<Box<dyn Filter>> = Vec::new();
        let mut outputs: Vec<Box<dyn Output>> = Vec::new();

        for section in &sections {
            if !store.has_section(section) {
                return Err(ConfigError::MissingSection {
                    section: section.to_string(),
                }
                .into());
            }
            let class = store.get(section, CLASS_KEY).ok_or_else(|| {
                ChainAssemblyError::MissingClass {
                    section: section.to_string(),
                }
            })?;
            let factory =
                registry
                    .resolve(class)
                    .ok_or_else(|| ChainAssemblyError::UnknownClass {
                        section: section.to_string(),
                        class: class.to_string(),
                    })?;
            let stage = factory(store, section)?;
            tracing::debug!(
                chain = name.as_str(),
                section = section.as_str(),
                class = class,
                role = stage.role(),
                "stage instantiated"
            );

            match stage {
                Stage::Input(c) => {
                    if input.is_some() || !filters.is_empty() || !outputs.is_empty() {
                        return Err(ChainAssemblyError::InputNotFirst {
                            chain: name,
                            section: section.to_string(),
                        });
                    }
                    input = Some(c);
                }
                Stage::Filter(c) => {
                    if !outputs.is_empty() {
                        return Err(ChainAssemblyError::StageAfterOutput {
                            chain: name,
                            section: section.to_string(),
                            role: "filter",
                        });
                    }
                    filters.push(c);
                }
                Stage::Output(c) => outputs.push(c),
            }
        }

        let input = input.ok_or_else(|| ChainAssemblyError::MissingInput {
            chain: name.clone(),
        })?;
        if outputs.is_empty() {
            return Err(ChainAssemblyError::MissingOutput { chain: name });
        }

        // Format compatibility along the data flow: input through the
        // filters, then every output against the last producing stage.
        let mut producer = input.section().to_string();
        let mut produced = input.produces();
        for filter in &filters {
            if !produced.accepts(filter.consumes()) {
                return Err(ChainAssemblyError::FormatMismatch {
                    chain: name,
                    producer,
                    produced,
                    consumer: filter.section().to_string(),
                    consumed: filter.consumes(),
                });
            }
            producer = filter.section().to_string();
            produced = filter.produces();
        }
        for output in &outputs {
            if !produced.accepts(output.consumes()) {
                return Err(ChainAssemblyError::FormatMismatch {
                    chain: name,
                    producer,
                    produced,
                    consumer: output.section().to_string(),
                    consumed: output.consumes(),
                });
            }
        }

        tracing::info!(
            chain = name.as_str(),
            stages = 1 + filters.len() + outputs.len(),
            "chain assembled"
        );
        Ok(Self {
            name,
            input,
            filters,
            outputs,
            state: RunState::Assembled,
            cancel: CancelToken::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle for requesting cooperative cancellation from outside the run
    /// loop.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// `(role, section)` of every stage in pipeline order.
    pub fn stage_sections(&self) -> Vec<(&'static str, &str)> {
        let mut stages = vec![("input", self.input.section())];
        stages.extend(self.filters.iter().map(|f| ("filter", f.section())));
        stages.extend(self.outputs.iter().map(|o| ("output", o.section())));
        stages
    }

    /// Drive the chain until the input ends, an output requests a stop,
    /// a stage fails, or the cancel token is set. Every initialized stage
    /// is drained exactly once, whatever ended the run.
    pub fn run(&mut self) -> RunResult {
        let started = Instant::now();
        if self.state != RunState::Assembled {
            return RunResult {
                chain: self.name.clone(),
                status: RunStatus::Failed,
                error: Some(ChainRunError::AlreadyRan {
                    chain: self.name.clone(),
                }),
                counts: RunCounts::default(),
                cleanup_failures: Vec::new(),
                duration_secs: started.elapsed().as_secs_f64(),
            };
        }

        let meta = new_chain_meta();
        let sentinel = Packet::new(meta.clone());
        let total = self.stage_count();
        let mut counts = RunCounts::default();
        let mut run_error: Option<ChainRunError> = None;

        let mut last_input: Option<Packet> = None;
        let mut last_filters: Vec<Option<Packet>> = vec![None; self.filters.len()];
        let mut last_delivered: Option<Packet> = None;

        self.state = RunState::Init;
        tracing::debug!(chain = self.name.as_str(), "initializing stages");
        let mut initialized = 0usize;
        for idx in 0..total {
            match self.init_stage(idx) {
                Ok(()) => initialized += 1,
                Err(err) => {
                    let section = self.section_at(idx).to_string();
                    tracing::error!(
                        chain = self.name.as_str(),
                        section = section.as_str(),
                        error = %err,
                        "stage initialization failed"
                    );
                    run_error = Some(ChainRunError::Init {
                        section,
                        source: err,
                    });
                    break;
                }
            }
        }

        if run_error.is_none() {
            self.state = RunState::Running;
            tracing::debug!(chain = self.name.as_str(), "run loop started");
            'cycles: loop {
                if self.cancel.is_cancelled() {
                    tracing::info!(
                        chain = self.name.as_str(),
                        "cancellation requested; stopping at cycle boundary"
                    );
                    break;
                }

                let fresh = Packet::new(meta.clone());
                let mut current = match self.input.invoke(fresh) {
                    Ok(Pull::EndOfStream) => {
                        tracing::debug!(chain = self.name.as_str(), "input end-of-stream");
                        break;
                    }
                    Ok(Pull::Packet(packet)) => {
                        counts.cycles += 1;
                        last_input = Some(packet.clone());
                        packet
                    }
                    Err(err) => {
                        run_error = Some(stage_error(self.input.section(), err));
                        break;
                    }
                };

                for (i, filter) in self.filters.iter_mut().enumerate() {
                    current = match filter.invoke(current) {
                        Ok(Flow::Forward(packet)) => {
                            last_filters[i] = Some(packet.clone());
                            packet
                        }
                        Ok(Flow::Skip) => {
                            counts.skipped += 1;
                            tracing::debug!(
                                chain = self.name.as_str(),
                                section = filter.section(),
                                "cycle skipped"
                            );
                            continue 'cycles;
                        }
                        Err(err) => {
                            run_error = Some(stage_error(filter.section(), err));
                            break 'cycles;
                        }
                    };
                }

                counts.delivered += 1;
                last_delivered = Some(current.clone());
                let mut stop = false;
                for output in self.outputs.iter_mut() {
                    match output.invoke(&current) {
                        Ok(Feedback::Continue) => {}
                        Ok(Feedback::Stop) => {
                            tracing::info!(
                                chain = self.name.as_str(),
                                section = output.section(),
                                "output requested stop"
                            );
                            stop = true;
                        }
                        Err(err) => {
                            run_error = Some(stage_error(output.section(), err));
                            break 'cycles;
                        }
                    }
                }
                if stop {
                    break;
                }
            }
        }

        self.state = RunState::Draining;
        tracing::debug!(chain = self.name.as_str(), "draining stages");
        let filter_count = self.filters.len();
        let mut cleanup_failures = Vec::new();
        for idx in 0..initialized {
            let last = match idx {
                0 => last_input.as_ref(),
                i if i <= filter_count => last_filters[i - 1].as_ref(),
                _ => last_delivered.as_ref(),
            }
            .unwrap_or(&sentinel);
            if let Err(err) = self.drain_stage(idx, last) {
                let section = self.section_at(idx).to_string();
                tracing::warn!(
                    chain = self.name.as_str(),
                    section = section.as_str(),
                    error = %err,
                    "cleanup hook failed"
                );
                cleanup_failures.push(CleanupFailure {
                    section,
                    error: err,
                });
            }
        }

        let status = if run_error.is_some() {
            self.state = RunState::Failed;
            RunStatus::Failed
        } else {
            self.state = RunState::Done;
            RunStatus::Done
        };
        let duration_secs = started.elapsed().as_secs_f64();
        tracing::info!(
            chain = self.name.as_str(),
            status = ?status,
            cycles = counts.cycles,
            delivered = counts.delivered,
            skipped = counts.skipped,
            "chain run finished"
        );

        RunResult {
            chain: self.name.clone(),
            status,
            error: run_error,
            counts,
            cleanup_failures,
            duration_secs,
        }
    }

    fn stage_count(&self) -> usize {
        1 + self.filters.len() + self.outputs.len()
    }

    fn section_at(&self, idx: usize) -> &str {
        if idx == 0 {
            self.input.section()
        } else if idx <= self.filters.len() {
            self.filters[idx - 1].section()
        } else {
            self.outputs[idx - 1 - self.filters.len()].section()
        }
    }

    fn init_stage(&mut self, idx: usize) -> Result<(), StageError> {
        if idx == 0 {
            self.input.init()
        } else if idx <= self.filters.len() {
            self.filters[idx - 1].init()
        } else {
            self.outputs[idx - 1 - self.filters.len()].init()
        }
    }

    fn drain_stage(&mut self, idx: usize, last: &Packet) -> Result<(), StageError> {
        if idx == 0 {
            self.input.after_chain_invoke(last)
        } else if idx <= self.filters.len() {
            self.filters[idx - 1].after_chain_invoke(last)
        } else {
            self.outputs[idx - 1 - self.filters.len()].after_chain_invoke(last)
        }
    }
}

fn stage_error(section: &str, source: StageError) -> ChainRunError {
    ChainRunError::Stage {
        section: section.to_string(),
        source,
    }
}
