//! Run configuration

use std::path::{Path, PathBuf};

/// Options controlling how records are assembled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Abort on the first field that fails to convert instead of skipping it
    pub strict: bool,
    /// Terminate each query text line with `\n` instead of gluing lines together
    pub preserve_line_breaks: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            strict: false,
            preserve_line_breaks: true,
        }
    }
}

impl ParserConfig {
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_line_breaks(mut self, preserve: bool) -> Self {
        self.preserve_line_breaks = preserve;
        self
    }
}

/// Where converted records are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    /// Resolve the destination for `input`. `-` selects stdout; with no explicit
    /// output the input path is reused with a `.json` extension.
    pub fn resolve(explicit: Option<&str>, input: &Path) -> Self {
        match explicit {
            Some("-") => OutputTarget::Stdout,
            Some(path) => OutputTarget::File(PathBuf::from(path)),
            None => OutputTarget::File(input.with_extension("json")),
        }
    }
}
