//! Rebase plans: the editable JSON form of a command list.
//!
//! `fib parse` writes one entry per tag of the primary source. Editing the
//! entries (dropping, reordering, retiming, pointing at other files) and
//! running `fib build` produces the new file.
//!
//! ```json
//! {
//!   "source": { "path": "/videos/in.flv", "hash": "9f86d0...", "skip_hash": false },
//!   "tags": [
//!     { "command": "script", "index": 0, "timestamp": 0.0, "script": { ... } },
//!     { "command": "pick", "index": 1, "timestamp": 0.0, "type": "Video", "keyframe": true },
//!     { "command": "P", "index": 4, "timestamp": 40.0, "from": "/videos/other.flv" },
//!     { "command": "P", "timestamp": 80.0, "raw": "/videos/one.blob" },
//!     { "command": "I", "timestamp": 120.0, "hex": "09000004 00007800 000000 17010000 0000000F" }
//!   ]
//! }
//! ```
//!
//! `type`, `size`, `offset`, `keyframe` and `header` describe the scanned
//! tag and never affect the output.

use crate::rebase::{RebaseCommand, SourceRef};
use crate::{Error, Result};
use fib_amf::ScriptTagBody;
use fib_flv::{read_body, TagDescriptor, TagType};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

/// What to do with one plan entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanCommand {
    #[serde(alias = "D", alias = "Drop")]
    Drop,
    #[serde(alias = "P", alias = "Pick")]
    Pick,
    #[serde(alias = "I", alias = "Inline")]
    Inline,
    #[serde(alias = "S", alias = "Script")]
    Script,
}

/// The container a plan was made from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSource {
    pub path: PathBuf,

    /// Lowercase hex SHA-256 of the file, empty when not recorded.
    #[serde(default)]
    pub hash: String,

    #[serde(default)]
    pub skip_hash: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanTag {
    pub command: PlanCommand,

    /// Tag number in the source, not in the output.
    #[serde(default)]
    pub index: usize,

    /// Output timestamp in milliseconds.
    #[serde(default)]
    pub timestamp: f64,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub tag_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub keyframe: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub header: bool,

    /// Pick from another FLV container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<PathBuf>,

    /// Pick the single tag stored in this file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<PathBuf>,

    /// Framed tag bytes for `inline`; whitespace is ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hex: Option<String>,

    /// Metadata body for `script`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<ScriptTagBody>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl PlanTag {
    pub fn new(command: PlanCommand, index: usize, timestamp: f64) -> Self {
        Self {
            command,
            index,
            timestamp,
            tag_type: None,
            size: None,
            offset: None,
            keyframe: false,
            header: false,
            from: None,
            raw: None,
            hex: None,
            script: None,
        }
    }

    /// An entry describing a scanned tag.
    fn describe(command: PlanCommand, index: usize, tag: &TagDescriptor) -> Self {
        Self {
            tag_type: Some(tag.tag_type.as_str().to_string()),
            size: Some(tag.size),
            offset: Some(tag.position),
            keyframe: tag.is_keyframe(),
            header: tag.is_header(),
            ..Self::new(command, index, tag.timestamp as f64)
        }
    }

    fn to_command(&self, position: usize) -> Result<RebaseCommand> {
        let timestamp = self.timestamp;
        if !timestamp.is_finite() {
            return Err(Error::invalid_command(
                position,
                format!("bad timestamp {}", timestamp),
            ));
        }

        let command = match self.command {
            PlanCommand::Drop => RebaseCommand::drop(),
            PlanCommand::Pick => {
                let source = match (non_empty(&self.from), non_empty(&self.raw)) {
                    (Some(path), _) => SourceRef::Container(path.to_path_buf()),
                    (None, Some(path)) => SourceRef::RawTag(path.to_path_buf()),
                    (None, None) => SourceRef::Primary,
                };
                RebaseCommand::pick(source, self.index, timestamp)
            }
            PlanCommand::Inline => {
                let text = self
                    .hex
                    .as_deref()
                    .ok_or_else(|| Error::invalid_command(position, "inline entry has no hex"))?;
                let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
                let bytes = hex::decode(&compact)
                    .map_err(|e| Error::invalid_command(position, format!("bad hex: {}", e)))?;
                RebaseCommand::inline(bytes, timestamp)
            }
            PlanCommand::Script => {
                let body = self
                    .script
                    .clone()
                    .ok_or_else(|| Error::invalid_command(position, "script entry has no body"))?;
                RebaseCommand::script(body, timestamp)
            }
        };
        Ok(command)
    }
}

fn non_empty(path: &Option<PathBuf>) -> Option<&Path> {
    path.as_deref().filter(|p| !p.as_os_str().is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebasePlan {
    pub source: PlanSource,

    #[serde(default)]
    pub tags: Vec<PlanTag>,
}

impl RebasePlan {
    /// Read a plan file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Write this plan as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        fs::write(path, text)?;
        Ok(())
    }

    /// Build an unedited plan from the scanned tags of `stream`.
    ///
    /// Metadata tags become `script` entries carrying their decoded body.
    /// A metadata tag that does not decode is kept as a `pick`.
    pub fn from_scan<R>(
        path: impl Into<PathBuf>,
        hash: impl Into<String>,
        skip_hash: bool,
        tags: &[TagDescriptor],
        stream: &mut R,
    ) -> Result<Self>
    where
        R: Read + Seek + ?Sized,
    {
        let mut entries = Vec::with_capacity(tags.len());
        for (index, tag) in tags.iter().enumerate() {
            let entry = if tag.tag_type == TagType::Script {
                let payload = read_body(stream, tag)?;
                match ScriptTagBody::decode(&payload) {
                    Ok(body) => PlanTag {
                        script: Some(body),
                        ..PlanTag::describe(PlanCommand::Script, index, tag)
                    },
                    Err(e) => {
                        tracing::warn!("Tag {} kept as raw bytes: {}", index, e);
                        PlanTag::describe(PlanCommand::Pick, index, tag)
                    }
                }
            } else {
                PlanTag::describe(PlanCommand::Pick, index, tag)
            };
            entries.push(entry);
        }

        Ok(Self {
            source: PlanSource {
                path: path.into(),
                hash: hash.into(),
                skip_hash,
            },
            tags: entries,
        })
    }

    /// The command list this plan describes.
    pub fn to_commands(&self) -> Result<Vec<RebaseCommand>> {
        self.tags
            .iter()
            .enumerate()
            .map(|(position, tag)| tag.to_command(position))
            .collect()
    }
}
