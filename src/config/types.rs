use fib_flv::{FLAG_AUDIO, FLAG_VIDEO};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Silence all log output.
    #[serde(default)]
    pub quiet: bool,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub parse: ParseConfig,

    #[serde(default)]
    pub extract: ExtractConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Flags byte written to built FLV headers (0x01 video, 0x04 audio).
    #[serde(default = "default_header_flags")]
    pub header_flags: u8,

    /// Replace existing output files without `--force`.
    #[serde(default)]
    pub overwrite: bool,
}

fn default_header_flags() -> u8 {
    FLAG_AUDIO | FLAG_VIDEO
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            header_flags: default_header_flags(),
            overwrite: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ParseConfig {
    /// Do not hash the primary source when writing a plan.
    #[serde(default)]
    pub skip_hash: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExtractConfig {
    /// Hex characters per line when printing a tag.
    #[serde(default = "default_hex_line_width")]
    pub hex_line_width: usize,
}

fn default_hex_line_width() -> usize {
    64
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            hex_line_width: default_hex_line_width(),
        }
    }
}
