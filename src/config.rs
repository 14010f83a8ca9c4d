//! Run configuration.
//!
//! [`Options`] is built once from the command line and handed read-only to
//! every display routine. Nothing in the decoders consults it.

use crate::elf::dump::UnicodePolicy;

/// Radix used for symbol sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizeBase {
    #[default]
    Decimal,
    Hex,
}

/// A section named on the command line, by index or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DumpTarget {
    Index(u64),
    Name(String),
}

impl DumpTarget {
    /// A purely numeric argument is an index, anything else a name.
    pub fn parse(arg: &str) -> Self {
        match arg.parse::<u64>() {
            Ok(index) => DumpTarget::Index(index),
            Err(_) => DumpTarget::Name(arg.to_string()),
        }
    }

    /// Does the section at `index` match? `name` is the section's strictly
    /// resolved name, `None` when it could not be resolved.
    pub fn matches(&self, index: usize, name: Option<&str>) -> bool {
        match self {
            DumpTarget::Index(wanted) => index as u64 == *wanted,
            DumpTarget::Name(wanted) => name == Some(wanted.as_str()),
        }
    }
}

impl std::fmt::Display for DumpTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DumpTarget::Index(index) => write!(f, "{index}"),
            DumpTarget::Name(name) => write!(f, "'{name}'"),
        }
    }
}

/// What to display and how.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub file_header: bool,
    pub segments: bool,
    pub sections: bool,
    pub section_groups: bool,
    pub symbols: bool,
    pub dyn_syms: bool,
    pub dynamic: bool,
    pub relocs: bool,
    pub version_info: bool,
    pub histogram: bool,
    pub notes: bool,
    pub arch_specific: bool,
    pub unwind: bool,
    pub archive_index: bool,

    /// Take relocations and symbols from the dynamic tags, not sections.
    pub use_dynamic: bool,
    pub wide: bool,
    pub demangle: bool,

    /// Expand compressed sections before dumping them.
    pub decompress: bool,
    pub sym_base: SizeBase,
    pub unicode: UnicodePolicy,

    /// Shortest string `-p` prints.
    pub string_min_len: usize,

    pub hex_dumps: Vec<DumpTarget>,
    pub string_dumps: Vec<DumpTarget>,
    pub reloc_dumps: Vec<DumpTarget>,

    /// Sections holding the CTF symbol and string tables. CTF itself is
    /// decoded elsewhere; these are only recorded.
    pub ctf_symbols: Option<String>,
    pub ctf_strings: Option<String>,
}

impl Options {
    /// True if at least one kind of output was requested.
    pub fn any_display(&self) -> bool {
        self.file_header
            || self.segments
            || self.sections
            || self.section_groups
            || self.symbols
            || self.dyn_syms
            || self.dynamic
            || self.relocs
            || self.version_info
            || self.histogram
            || self.notes
            || self.arch_specific
            || self.unwind
            || self.archive_index
            || !self.hex_dumps.is_empty()
            || !self.string_dumps.is_empty()
            || !self.reloc_dumps.is_empty()
    }

    /// Every dump target, so unmatched ones can be reported.
    pub fn dump_targets(&self) -> impl Iterator<Item = &DumpTarget> {
        self.hex_dumps
            .iter()
            .chain(&self.string_dumps)
            .chain(&self.reloc_dumps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_target_parse() {
        assert_eq!(DumpTarget::parse("12"), DumpTarget::Index(12));
        assert_eq!(DumpTarget::parse(".text"), DumpTarget::Name(".text".into()));
        assert_eq!(DumpTarget::parse(".text").to_string(), "'.text'");
    }

    #[test]
    fn test_dump_target_matches() {
        let by_name = DumpTarget::Name(".text".into());
        assert!(by_name.matches(3, Some(".text")));
        assert!(!by_name.matches(3, None));
        assert!(DumpTarget::Index(3).matches(3, None));
        assert!(!DumpTarget::Index(4).matches(3, Some(".text")));
    }

    #[test]
    fn test_any_display() {
        let mut opts = Options::default();
        assert!(!opts.any_display());
        opts.string_dumps.push(DumpTarget::Index(1));
        assert!(opts.any_display());
    }
}
