//! File sink.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use sluice_core::{
    AttrKind, AttrSpec, AttrValue, Component, ComponentDescriptor, ConfigError, ConfigStore,
    Feedback, Format, Output, Packet, Stage, StageError,
};

/// Writes each payload to a file, one per line.
pub struct FileOutput {
    section: String,
    file_path: PathBuf,
    append: bool,
    writer: Option<BufWriter<File>>,
}

impl FileOutput {
    pub const CLASS: &'static str = "file_output";

    fn descriptor() -> ComponentDescriptor {
        ComponentDescriptor::new()
            .attr(AttrSpec::required("file_path", AttrKind::Text).describe("file to write to"))
            .attr(
                AttrSpec::optional("append", AttrKind::Bool, AttrValue::Bool(false))
                    .describe("append instead of truncating"),
            )
    }

    pub fn from_config(store: &ConfigStore, section: &str) -> Result<Self, ConfigError> {
        let attrs = Self::descriptor().resolve(store, section)?;
        Ok(Self {
            section: section.to_string(),
            file_path: PathBuf::from(attrs.text("file_path")?),
            append: attrs.flag("append")?,
            writer: None,
        })
    }

    pub fn factory(store: &ConfigStore, section: &str) -> Result<Stage, ConfigError> {
        Ok(Stage::Output(Box::new(Self::from_config(store, section)?)))
    }
}

impl Component for FileOutput {
    fn section(&self) -> &str {
        &self.section
    }

    fn init(&mut self) -> Result<(), StageError> {
        let file = OpenOptions::new()
            .create(true)
            .append(self.append)
            .truncate(!self.append)
            .write(true)
            .open(&self.file_path)?;
        self.writer = Some(BufWriter::new(file));
        Ok(())
    }

    fn after_chain_invoke(&mut self, _last: &Packet) -> Result<(), StageError> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Output for FileOutput {
    fn consumes(&self) -> Format {
        Format::Any
    }

    fn invoke(&mut self, packet: &Packet) -> Result<Feedback, StageError> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| StageError::data("output file is not open"))?;
        writeln!(writer, "{}", packet.data)?;
        Ok(Feedback::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::packet::new_chain_meta;
    use sluice_core::Payload;

    fn line_packet(text: &str) -> Packet {
        Packet::new(new_chain_meta()).with(Payload::Line(text.to_string()))
    }

    #[test]
    fn writes_lines_and_flushes_on_drain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let store = ConfigStore::new().with("out", "file_path", path.display().to_string());
        let mut output = FileOutput::from_config(&store, "out").unwrap();
        output.init().unwrap();

        output.invoke(&line_packet("one")).unwrap();
        output.invoke(&line_packet("two")).unwrap();
        output
            .after_chain_invoke(&Packet::new(new_chain_meta()))
            .unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn append_keeps_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "old\n").unwrap();

        let store = ConfigStore::new()
            .with("out", "file_path", path.display().to_string())
            .with("out", "append", "yes");
        let mut output = FileOutput::from_config(&store, "out").unwrap();
        output.init().unwrap();
        output.invoke(&line_packet("new")).unwrap();
        output
            .after_chain_invoke(&Packet::new(new_chain_meta()))
            .unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old\nnew\n");
    }

    #[test]
    fn invoke_without_init_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let store = ConfigStore::new().with("out", "file_path", path.display().to_string());
        let mut output = FileOutput::from_config(&store, "out").unwrap();
        assert!(output.invoke(&line_packet("x")).is_err());
    }
}
