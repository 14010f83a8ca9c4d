//! # Text Output
//!
//! readelf-style renderings of a decoded [`ElfFile`]. Every routine writes
//! to a caller-supplied [`Write`] so the output can be captured in tests.
//! Displays never decode anything themselves beyond what the tables in
//! [`ElfFile`] hold; a table that failed to load is skipped with a
//! diagnostic instead of being rendered from partial data.

pub mod attrs;
pub mod dumps;
pub mod dynamic;
pub mod file_header;
pub mod notes;
pub mod relocs;
pub mod sections;
pub mod segments;
pub mod symbols;
pub mod unwind;
pub mod versions;

use std::io::{self, Write};

use crate::config::Options;
use crate::elf::{ElfFile, SectionHeader};

/// Render everything `opts` asks for, in a fixed order.
pub fn render(file: &ElfFile<'_>, opts: &Options, out: &mut dyn Write) -> io::Result<()> {
    if opts.file_header {
        file_header::render(file, out)?;
    }
    if opts.sections {
        sections::render(file, opts, out)?;
    }
    if opts.section_groups {
        sections::render_groups(file, out)?;
    }
    if opts.segments {
        segments::render(file, out)?;
    }
    if opts.dynamic {
        dynamic::render(file, out)?;
    }
    if opts.relocs {
        relocs::render(file, opts, out)?;
    }
    if opts.unwind {
        unwind::render(file, out)?;
    }
    if opts.symbols || opts.dyn_syms {
        symbols::render(file, opts, out)?;
    }
    if opts.version_info {
        versions::render(file, out)?;
    }
    if opts.arch_specific {
        attrs::render(file, out)?;
    }
    if opts.notes {
        notes::render(file, out)?;
    }
    if opts.histogram {
        symbols::render_histogram(file, out)?;
    }
    dumps::render(file, opts, out)
}

/// The section headers, or `None` after reporting that `what` cannot be
/// shown without them.
fn sections_or_skip<'f>(file: &'f ElfFile<'_>, what: &str) -> Option<&'f [SectionHeader]> {
    match file.sections.as_deref() {
        Some(sections) => Some(sections),
        None => {
            file.diag().warn(format_args!(
                "Cannot display {what}: the section headers could not be read"
            ));
            None
        }
    }
}

/// Hex digits used for an address of this file's class.
fn addr_width(file: &ElfFile<'_>) -> usize {
    if file.header.class.is_64() {
        16
    } else {
        8
    }
}

/// `name` shortened to `width` columns unless `wide` output was requested.
fn fit(name: &str, width: usize, wide: bool) -> String {
    if wide || name.chars().count() <= width {
        return name.to_string();
    }
    let keep: String = name.chars().take(width.saturating_sub(5)).collect();
    format!("{keep}[...]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit() {
        assert_eq!(fit(".text", 17, false), ".text");
        assert_eq!(fit(".debug_line_str.long", 17, false), ".debug_line_[...]");
        assert_eq!(fit(".debug_line_str.long", 17, true), ".debug_line_str.long");
    }
}
