//! PA-RISC `.PARISC.unwind` tables: 16-byte entries holding a start and
//! end address followed by two words of packed frame descriptors.

use super::super::section::SectionHeader;
use super::super::ElfFile;
use super::{format_addr, relocated, AbsAddr, UnwindEntry, UnwindTable};

const ENTRY_SIZE: usize = 16;

/// `R_PARISC_SEGREL32`, the only relocation expected in the table.
const R_PARISC_SEGREL32: u32 = 49;

/// A named piece of a descriptor word.
enum Field {
    /// A single bit, printed by name when set.
    Flag(u32, &'static str),
    /// A multi-bit count at (shift, width), printed as `name:value` when nonzero.
    Count(u32, u32, &'static str),
}

use Field::{Count, Flag};

/// The first descriptor word, most significant bit first.
const WORD1: [Field; 22] = [
    Flag(31, "Cannot_unwind"),
    Flag(30, "Millicode"),
    Flag(29, "Millicode_save_sr0"),
    Count(27, 2, "Region_description"),
    Flag(25, "Entry_SR"),
    Count(21, 4, "Entry_FR"),
    Count(16, 5, "Entry_GR"),
    Flag(15, "Args_stored"),
    Flag(14, "Variable_Frame"),
    Flag(13, "Separate_Package_Body"),
    Flag(12, "Frame_Extension_Millicode"),
    Flag(11, "Stack_Overflow_Check"),
    Flag(10, "Two_Instruction_SP_Increment"),
    Flag(9, "Ada_Region"),
    Flag(8, "cxx_info"),
    Flag(7, "cxx_try_catch"),
    Flag(6, "sched_entry_seq"),
    Flag(4, "Save_SP"),
    Flag(3, "Save_RP"),
    Flag(2, "Save_MRP_in_frame"),
    Flag(1, "extn_ptr_defined"),
    Flag(0, "Cleanup_defined"),
];

const WORD2: [Field; 4] = [
    Flag(31, "MPE_XL_interrupt_marker"),
    Flag(30, "HP_UX_interrupt_marker"),
    Flag(29, "Large_frame"),
    Flag(28, "Pseudo_SP_Set"),
];

fn render(word: u32, fields: &[Field], out: &mut Vec<String>) {
    for f in fields {
        match *f {
            Flag(bit, name) if word & (1 << bit) != 0 => out.push(name.to_string()),
            Count(shift, width, name) => {
                let value = (word >> shift) & ((1 << width) - 1);
                if value != 0 {
                    out.push(format!("{name}:{value}"));
                }
            }
            Flag(..) => {}
        }
    }
}

/// The descriptor words as a single line of flag names and counts.
fn describe(word1: u32, word2: u32) -> String {
    let mut parts = Vec::new();
    render(word1, &WORD1, &mut parts);
    render(word2, &WORD2, &mut parts);
    parts.push(format!("Total_frame_size:{}", word2 & 0x07ff_ffff));
    parts.join(" ")
}

#[derive(Debug, Clone, Copy, Default)]
struct TableEntry {
    start: AbsAddr,
    end: AbsAddr,
    word1: u32,
    word2: u32,
}

pub fn decode(file: &ElfFile<'_>) -> Vec<UnwindTable> {
    file.sections()
        .iter()
        .filter(|s| s.name == ".PARISC.unwind")
        .filter_map(|sec| decode_table(file, sec))
        .collect()
}

fn decode_table(file: &ElfFile<'_>, sec: &SectionHeader) -> Option<UnwindTable> {
    let diag = file.diag();
    let codec = file.codec;
    let data = file.section_data(sec).ok()?;
    if data.len() % ENTRY_SIZE != 0 {
        diag.warn(format_args!(
            "Unwind section {} size {:#x} is not a multiple of {ENTRY_SIZE}",
            sec.name,
            data.len()
        ));
    }

    let mut entries: Vec<TableEntry> = data
        .chunks_exact(ENTRY_SIZE)
        .map(|chunk| {
            let word = |i: usize| codec.u32_at(chunk, i * 4).unwrap_or(0);
            TableEntry {
                start: AbsAddr::raw(u64::from(word(0))),
                end: AbsAddr::raw(u64::from(word(1))),
                word1: word(2),
                word2: word(3),
            }
        })
        .collect();

    if file.is_relocatable() {
        for (rel, sym) in file.relocations_against(sec.index) {
            if rel.rtype != R_PARISC_SEGREL32 {
                diag.warn(format_args!(
                    "Skipping unexpected relocation type {} in the PA-RISC unwind table",
                    crate::elf::reloc::type_name(rel.rtype, file.caps)
                ));
                continue;
            }
            let index = (rel.offset / ENTRY_SIZE as u64) as usize;
            let slot = (rel.offset % ENTRY_SIZE as u64) / 4;
            let Some(entry) = entries.get_mut(index) else {
                diag.warn(format_args!(
                    "Skipping PA-RISC unwind relocation with invalid offset {:#x}",
                    rel.offset
                ));
                continue;
            };
            match slot {
                0 => entry.start = relocated(&rel, sym, entry.start.offset),
                1 => entry.end = relocated(&rel, sym, entry.end.offset),
                _ => diag.warn(format_args!(
                    "Skipping relocation against unwind descriptor word at {:#x}",
                    rel.offset
                )),
            }
        }
    }

    let symbols = file.address_symbols();
    let entries = entries
        .iter()
        .map(|e| UnwindEntry {
            heading: format!(
                "{}..{}",
                format_addr(e.start, symbols),
                format_addr(e.end, symbols)
            ),
            lines: vec![format!("\t{}", describe(e.word1, e.word2))],
        })
        .collect();

    Some(UnwindTable {
        section: sec.index,
        name: sec.name.clone(),
        offset: sec.offset,
        entries,
    })
}
