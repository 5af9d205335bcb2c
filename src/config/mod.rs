mod types;

pub use types::*;

use anyhow::{Context, Result};
use fib_flv::{FLAG_AUDIO, FLAG_VIDEO};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = ["./fib.toml", "~/.config/fib/config.toml"];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    let width = config.extract.hex_line_width;
    if width == 0 || width % 2 != 0 {
        anyhow::bail!(
            "extract.hex_line_width must be a positive even number, got {}",
            width
        );
    }

    let unknown = config.output.header_flags & !(FLAG_AUDIO | FLAG_VIDEO);
    if unknown != 0 {
        anyhow::bail!(
            "output.header_flags has unsupported bits {:#04x}",
            unknown
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(!config.quiet);
        assert_eq!(config.output.header_flags, 5);
        assert!(!config.output.overwrite);
        assert!(!config.parse.skip_hash);
        assert_eq!(config.extract.hex_line_width, 64);
    }

    #[test]
    fn test_partial_file() {
        let file = write_config(
            r#"
quiet = true

[output]
overwrite = true
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert!(config.quiet);
        assert!(config.output.overwrite);
        assert_eq!(config.output.header_flags, 5);
        assert_eq!(config.extract.hex_line_width, 64);
    }

    #[test]
    fn test_rejects_odd_line_width() {
        let file = write_config("[extract]\nhex_line_width = 33\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("hex_line_width"));

        let file = write_config("[extract]\nhex_line_width = 0\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_rejects_unknown_header_flags() {
        let file = write_config("[output]\nheader_flags = 8\n");
        assert!(load_config(file.path()).is_err());

        let file = write_config("[output]\nheader_flags = 1\n");
        assert_eq!(load_config(file.path()).unwrap().output.header_flags, 1);
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("fib.toml");
        assert!(load_config_or_default(Some(&missing)).is_err());
    }
}
