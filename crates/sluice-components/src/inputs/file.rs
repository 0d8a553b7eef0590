//! File-based inputs.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use regex::Regex;
use sluice_core::{
    AttrKind, AttrSpec, AttrValue, Component, ComponentDescriptor, ConfigError, ConfigStore,
    Format, Input, Packet, Payload, Pull, Stage, StageError,
};

/// Emits one `FilePath` packet per regular file in a directory whose name
/// matches a filter pattern, in sorted order.
#[derive(Debug)]
pub struct DirectoryInput {
    section: String,
    path: PathBuf,
    filter_re: Regex,
    files: std::vec::IntoIter<PathBuf>,
}

impl DirectoryInput {
    pub const CLASS: &'static str = "directory_input";

    fn descriptor() -> ComponentDescriptor {
        ComponentDescriptor::new()
            .attr(
                AttrSpec::required("path", AttrKind::Text)
                    .describe("directory to list files from"),
            )
            .attr(
                AttrSpec::optional("filter_re", AttrKind::Text, AttrValue::Text(".*".to_string()))
                    .describe("regex a file name must match to be emitted"),
            )
    }

    pub fn from_config(store: &ConfigStore, section: &str) -> Result<Self, ConfigError> {
        let attrs = Self::descriptor().resolve(store, section)?;
        let pattern = attrs.text("filter_re")?;
        let filter_re = Regex::new(&pattern).map_err(|e| ConfigError::InvalidValue {
            section: section.to_string(),
            name: "filter_re".to_string(),
            detail: e.to_string(),
        })?;
        Ok(Self {
            section: section.to_string(),
            path: PathBuf::from(attrs.text("path")?),
            filter_re,
            files: Vec::new().into_iter(),
        })
    }

    pub fn factory(store: &ConfigStore, section: &str) -> Result<Stage, ConfigError> {
        Ok(Stage::Input(Box::new(Self::from_config(store, section)?)))
    }
}

impl Component for DirectoryInput {
    fn section(&self) -> &str {
        &self.section
    }

    fn init(&mut self) -> Result<(), StageError> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.path)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            if self.filter_re.is_match(&name.to_string_lossy()) {
                files.push(entry.path());
            }
        }
        files.sort();
        tracing::debug!(
            section = self.section.as_str(),
            dir = %self.path.display(),
            count = files.len(),
            "directory listed"
        );
        self.files = files.into_iter();
        Ok(())
    }
}

impl Input for DirectoryInput {
    fn produces(&self) -> Format {
        Format::FilePath
    }

    fn invoke(&mut self, mut packet: Packet) -> Result<Pull, StageError> {
        match self.files.next() {
            Some(path) => {
                packet.set(Payload::FilePath(path));
                Ok(Pull::Packet(packet))
            }
            None => Ok(Pull::EndOfStream),
        }
    }
}

/// Streams the lines of one or more files, in order, as `Line` packets.
#[derive(Debug)]
pub struct LineFileInput {
    section: String,
    file_paths: Vec<PathBuf>,
    trim: bool,
    next_file: usize,
    reader: Option<BufReader<File>>,
}

impl LineFileInput {
    pub const CLASS: &'static str = "line_file_input";

    fn descriptor() -> ComponentDescriptor {
        ComponentDescriptor::new()
            .attr(
                AttrSpec::required("file_path", AttrKind::List)
                    .describe("files to read, in order"),
            )
            .attr(
                AttrSpec::optional("trim", AttrKind::Bool, AttrValue::Bool(false))
                    .describe("strip surrounding whitespace from each line"),
            )
    }

    pub fn from_config(store: &ConfigStore, section: &str) -> Result<Self, ConfigError> {
        let attrs = Self::descriptor().resolve(store, section)?;
        Ok(Self {
            section: section.to_string(),
            file_paths: attrs
                .list("file_path")?
                .into_iter()
                .map(PathBuf::from)
                .collect(),
            trim: attrs.flag("trim")?,
            next_file: 0,
            reader: None,
        })
    }

    pub fn factory(store: &ConfigStore, section: &str) -> Result<Stage, ConfigError> {
        Ok(Stage::Input(Box::new(Self::from_config(store, section)?)))
    }
}

impl Component for LineFileInput {
    fn section(&self) -> &str {
        &self.section
    }

    fn init(&mut self) -> Result<(), StageError> {
        for path in &self.file_paths {
            if !path.is_file() {
                return Err(StageError::data(format!(
                    "input file {} does not exist",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

impl Input for LineFileInput {
    fn produces(&self) -> Format {
        Format::Line
    }

    fn invoke(&mut self, mut packet: Packet) -> Result<Pull, StageError> {
        loop {
            match self.reader.as_mut() {
                Some(reader) => {
                    let mut line = String::new();
                    if reader.read_line(&mut line)? == 0 {
                        self.reader = None;
                        continue;
                    }
                    line.truncate(line.trim_end_matches(['\n', '\r']).len());
                    if self.trim {
                        line = line.trim().to_string();
                    }
                    packet.set(Payload::Line(line));
                    return Ok(Pull::Packet(packet));
                }
                None => {
                    if self.next_file >= self.file_paths.len() {
                        return Ok(Pull::EndOfStream);
                    }
                    let path = &self.file_paths[self.next_file];
                    tracing::debug!(
                        section = self.section.as_str(),
                        file = %path.display(),
                        "opening input file"
                    );
                    self.reader = Some(BufReader::new(File::open(path)?));
                    self.next_file += 1;
                }
            }
        }
    }
}
