//! Archive expansion.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use sluice_core::{
    AttrKind, AttrSpec, AttrValue, Component, ComponentDescriptor, ConfigError, ConfigStore,
    Filter, Flow, Format, Packet, Payload, Stage, StageError,
};

/// Expands a gzip-compressed file under a target path and forwards the
/// expanded path.
///
/// Non-gzip inputs are skipped, not failed: a chain fed a mixed directory
/// simply passes over them. The configured cleanup runs once the chain has
/// completed.
pub struct GzipExpander {
    section: String,
    target_path: PathBuf,
    remove_input_file: bool,
    clear_target: bool,
    input_archive: Option<PathBuf>,
    expanded: Option<PathBuf>,
}

impl GzipExpander {
    pub const CLASS: &'static str = "gzip_expander";

    fn descriptor() -> ComponentDescriptor {
        ComponentDescriptor::new()
            .attr(
                AttrSpec::required("target_path", AttrKind::Text)
                    .describe("file to expand into, or an existing directory to expand under"),
            )
            .attr(
                AttrSpec::optional("remove_input_file", AttrKind::Bool, AttrValue::Bool(false))
                    .describe("delete the input archive when the chain has completed"),
            )
            .attr(
                AttrSpec::optional("clear_target", AttrKind::Bool, AttrValue::Bool(true))
                    .describe("delete the expanded file when the chain has completed"),
            )
    }

    pub fn from_config(store: &ConfigStore, section: &str) -> Result<Self, ConfigError> {
        let attrs = Self::descriptor().resolve(store, section)?;
        Ok(Self {
            section: section.to_string(),
            target_path: PathBuf::from(attrs.text("target_path")?),
            remove_input_file: attrs.flag("remove_input_file")?,
            clear_target: attrs.flag("clear_target")?,
            input_archive: None,
            expanded: None,
        })
    }

    pub fn factory(store: &ConfigStore, section: &str) -> Result<Stage, ConfigError> {
        Ok(Stage::Filter(Box::new(Self::from_config(store, section)?)))
    }

    fn output_path(&self, input: &Path) -> PathBuf {
        if self.target_path.is_dir() {
            let name = input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "expanded".to_string());
            self.target_path.join(safe_filename(&name))
        } else {
            self.target_path.clone()
        }
    }
}

fn safe_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '_' })
        .collect()
}

fn remove_if_file(path: &Path) -> Result<(), StageError> {
    if path.is_file() {
        std::fs::remove_file(path)?;
    }
    Ok(())
}

impl Component for GzipExpander {
    fn section(&self) -> &str {
        &self.section
    }

    fn after_chain_invoke(&mut self, _last: &Packet) -> Result<(), StageError> {
        if self.remove_input_file {
            if let Some(path) = self.input_archive.take() {
                remove_if_file(&path)?;
            }
        }
        if self.clear_target {
            if let Some(path) = self.expanded.take() {
                remove_if_file(&path)?;
            }
        }
        Ok(())
    }
}

impl Filter for GzipExpander {
    fn consumes(&self) -> Format {
        Format::FilePath
    }

    fn produces(&self) -> Format {
        Format::FilePath
    }

    fn invoke(&mut self, packet: Packet) -> Result<Flow, StageError> {
        let input = match &packet.data {
            Payload::FilePath(p) => p.clone(),
            other => {
                return Err(StageError::data(format!(
                    "expected file_path payload, got {}",
                    other.format()
                )))
            }
        };

        if input.extension().map_or(true, |e| e != "gz") {
            tracing::warn!(
                section = self.section.as_str(),
                file = %input.display(),
                "not a gzip file; skipping"
            );
            return Ok(Flow::Skip);
        }

        let target = self.output_path(&input);
        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut decoder = GzDecoder::new(BufReader::new(File::open(&input)?));
        let mut dest = File::create(&target)?;
        let bytes = std::io::copy(&mut decoder, &mut dest)?;
        tracing::info!(
            section = self.section.as_str(),
            file = %input.display(),
            target = %target.display(),
            bytes = bytes,
            "archive expanded"
        );

        self.input_archive = Some(input);
        self.expanded = Some(target.clone());
        Ok(Flow::Forward(packet.with(Payload::FilePath(target))))
    }
}
