use fib_amf::ScriptTagBody;
use std::fmt;
use std::path::PathBuf;

/// Where a picked tag comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceRef {
    /// The container the plan was made from.
    Primary,
    /// Another FLV container.
    Container(PathBuf),
    /// A file holding one bare tag, as written by `fib extract`.
    RawTag(PathBuf),
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceRef::Primary => f.write_str("primary source"),
            SourceRef::Container(path) => write!(f, "container {}", path.display()),
            SourceRef::RawTag(path) => write!(f, "raw tag {}", path.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Emit nothing.
    Drop,
    /// Copy tag `index` of `source`. Raw tag sources always use their only tag.
    Pick { source: SourceRef, index: usize },
    /// A complete framed tag given as bytes.
    Inline { bytes: Vec<u8> },
    /// A metadata tag built from an edited body.
    Script { body: ScriptTagBody },
}

/// One entry of a rebase command list.
#[derive(Debug, Clone, PartialEq)]
pub struct RebaseCommand {
    pub action: Action,
    /// Timestamp the emitted tag carries, in milliseconds. May be negative.
    pub timestamp: f64,
}

impl RebaseCommand {
    pub fn new(action: Action, timestamp: f64) -> Self {
        Self { action, timestamp }
    }

    pub fn drop() -> Self {
        Self::new(Action::Drop, 0.0)
    }

    pub fn pick(source: SourceRef, index: usize, timestamp: f64) -> Self {
        Self::new(Action::Pick { source, index }, timestamp)
    }

    pub fn inline(bytes: Vec<u8>, timestamp: f64) -> Self {
        Self::new(Action::Inline { bytes }, timestamp)
    }

    pub fn script(body: ScriptTagBody, timestamp: f64) -> Self {
        Self::new(Action::Script { body }, timestamp)
    }

    pub fn is_drop(&self) -> bool {
        matches!(self.action, Action::Drop)
    }

    /// Target timestamp truncated to whole milliseconds, if it fits the
    /// signed 32-bit tag header field.
    pub fn timestamp_millis(&self) -> Option<i32> {
        let millis = self.timestamp.trunc();
        if millis.is_finite() && millis >= i32::MIN as f64 && millis <= i32::MAX as f64 {
            Some(millis as i32)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_millis_truncates() {
        let cmd = RebaseCommand::pick(SourceRef::Primary, 0, 40.999);
        assert_eq!(cmd.timestamp_millis(), Some(40));
        let cmd = RebaseCommand::pick(SourceRef::Primary, 0, -33.7);
        assert_eq!(cmd.timestamp_millis(), Some(-33));
    }

    #[test]
    fn test_timestamp_millis_range() {
        let at = |millis: f64| {
            RebaseCommand::pick(SourceRef::Primary, 0, millis).timestamp_millis()
        };
        assert_eq!(at(i32::MAX as f64), Some(i32::MAX));
        assert_eq!(at(i32::MIN as f64), Some(i32::MIN));
        assert_eq!(at(i32::MAX as f64 + 1.0), None);
        assert_eq!(at(i32::MIN as f64 - 1.0), None);
        assert_eq!(at(f64::NAN), None);
        assert_eq!(at(f64::INFINITY), None);
    }

    #[test]
    fn test_source_display() {
        assert_eq!(SourceRef::Primary.to_string(), "primary source");
        assert_eq!(
            SourceRef::RawTag(PathBuf::from("a.blob")).to_string(),
            "raw tag a.blob"
        );
        assert!(RebaseCommand::drop().is_drop());
    }
}
