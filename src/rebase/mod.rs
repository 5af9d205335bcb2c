//! Rebuilding an FLV stream from a command list.
//!
//! Assembly runs in two phases. *Resolve* opens and indexes every source the
//! commands reference, builds inline and script tags in memory and checks
//! every index; nothing is written until it succeeds. *Emit* writes the file
//! header and then one tag per non-drop command, in command order, with the
//! command's timestamp.

mod command;
mod source;

pub use crate::error::{Error, Result};
pub use command::{Action, RebaseCommand, SourceRef};
pub use source::{FsOpener, ReadSeek, SourceOpener};

use fib_amf::ScriptValue;
use fib_flv::{TagWriter, FLAG_AUDIO, FLAG_VIDEO};
use source::{SourceKey, SourceSet};
use std::io::Write;

/// Metadata property rewritten to cover the whole output.
pub const DURATION_KEY: &str = "duration";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssembleOptions {
    /// Flags byte of the output file header.
    pub header_flags: u8,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            header_flags: FLAG_AUDIO | FLAG_VIDEO,
        }
    }
}

/// One output tag: which loaded tag to copy and the timestamp it gets.
#[derive(Debug)]
struct Placement {
    /// Command the tag came from.
    position: usize,
    key: SourceKey,
    index: usize,
    timestamp: i32,
}

/// Assembles output streams from command lists.
pub struct Assembler<O> {
    opener: O,
    options: AssembleOptions,
}

impl<O: SourceOpener> Assembler<O> {
    pub fn new(opener: O) -> Self {
        Self {
            opener,
            options: AssembleOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AssembleOptions) -> Self {
        self.options = options;
        self
    }

    /// Write the stream described by `commands` to `output` and return it.
    ///
    /// A reference that does not resolve fails before anything is written.
    /// An error while emitting leaves `output` partially written.
    pub fn assemble<W: Write>(&mut self, commands: &[RebaseCommand], output: W) -> Result<W> {
        let (mut sources, placements) = self.resolve(commands)?;

        tracing::info!(
            "Writing {} tags from {} sources",
            placements.len(),
            sources.len()
        );

        let mut writer = TagWriter::new(output);
        writer.write_file_header(self.options.header_flags)?;

        for placement in &placements {
            let loaded = sources
                .get_mut(&placement.key)
                .ok_or_else(|| missing_placement(placement))?;
            let tag = loaded
                .tags
                .get(placement.index)
                .ok_or_else(|| missing_placement(placement))?
                .with_timestamp(placement.timestamp);

            tracing::trace!("{} #{} -> {}", placement.key, placement.index, tag);
            writer.write_tag(&mut loaded.stream, &tag)?;
        }

        writer.flush()?;
        tracing::info!("Wrote {} bytes", writer.bytes_written());
        Ok(writer.into_inner())
    }

    fn resolve(&mut self, commands: &[RebaseCommand]) -> Result<(SourceSet, Vec<Placement>)> {
        let first = commands.iter().position(|cmd| !cmd.is_drop());
        let duration = commands
            .iter()
            .filter(|cmd| !cmd.is_drop())
            .map(|cmd| cmd.timestamp / 1000.0)
            .fold(f64::NEG_INFINITY, f64::max)
            + 1.0;

        let mut sources = SourceSet::new();
        let mut placements = Vec::with_capacity(commands.len());

        for (position, cmd) in commands.iter().enumerate() {
            if cmd.is_drop() {
                continue;
            }
            let timestamp = cmd.timestamp_millis().ok_or_else(|| {
                Error::invalid_command(
                    position,
                    format!("timestamp {} ms does not fit a tag header", cmd.timestamp),
                )
            })?;

            let (key, index) = match &cmd.action {
                Action::Drop => continue,
                Action::Pick { source, index } => {
                    let count = sources.load(&mut self.opener, source)?;
                    let index = match source {
                        SourceRef::RawTag(_) => 0,
                        _ => *index,
                    };
                    if index >= count {
                        return Err(Error::IndexOutOfRange {
                            origin: source.to_string(),
                            index,
                            count,
                        });
                    }
                    (SourceKey::Ref(source.clone()), index)
                }
                Action::Inline { bytes } => (
                    SourceKey::Synthetic,
                    sources
                        .push_inline(bytes)
                        .map_err(|e| command_error(position, e))?,
                ),
                Action::Script { body } if Some(position) == first => {
                    let mut body = body.clone();
                    body.properties_mut()
                        .insert(DURATION_KEY, ScriptValue::number(duration));
                    tracing::debug!("Set {} to {} on the leading script tag", DURATION_KEY, duration);
                    (
                        SourceKey::Synthetic,
                        sources
                            .push_script(&body)
                            .map_err(|e| command_error(position, e))?,
                    )
                }
                Action::Script { body } => (
                    SourceKey::Synthetic,
                    sources
                        .push_script(body)
                        .map_err(|e| command_error(position, e))?,
                ),
            };

            placements.push(Placement {
                position,
                key,
                index,
                timestamp,
            });
        }

        sources.seal();
        Ok((sources, placements))
    }
}

/// Assemble `commands` into `output` with sources from `opener`.
pub fn assemble<O, W>(
    commands: &[RebaseCommand],
    opener: O,
    output: W,
    options: AssembleOptions,
) -> Result<W>
where
    O: SourceOpener,
    W: Write,
{
    Assembler::new(opener)
        .with_options(options)
        .assemble(commands, output)
}

fn command_error(position: usize, err: Error) -> Error {
    match err {
        Error::Flv(e) => Error::invalid_command(position, e.to_string()),
        Error::Amf(e) => Error::invalid_command(position, e.to_string()),
        other => other,
    }
}

fn missing_placement(placement: &Placement) -> Error {
    Error::invalid_command(
        placement.position,
        format!(
            "tag {} of {} was not resolved before writing",
            placement.index, placement.key
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_missing_placement_names_command() {
        let placement = Placement {
            position: 4,
            key: SourceKey::Synthetic,
            index: 2,
            timestamp: 0,
        };
        let err = missing_placement(&placement);
        assert!(!err.is_reference());
        assert_matches!(
            &err,
            Error::InvalidCommand { index: 4, reason } if reason.contains("tag 2 of inline tags")
        );
    }
}
