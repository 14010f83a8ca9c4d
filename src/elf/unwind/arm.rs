//! ARM EHABI and TI C6000 exception index tables.
//!
//! Both machines use the same index layout: pairs of words, the first a
//! `prel31` offset to the function, the second either `EXIDX_CANTUNWIND`,
//! an inline compact-model entry (bit 31 set) or a `prel31` offset to the
//! entry's record in the exception table. The byte-coded unwind
//! instructions differ per machine.

use std::collections::HashMap;

use crate::arch::EM_TI_C6000;
use crate::utils::Cursor;

use super::super::reloc::Relocation;
use super::super::section::{SectionHeader, SHT_PROC_UNWIND};
use super::super::symbol::Symbol;
use super::super::ElfFile;
use super::{format_addr, relocated, symbolize, AbsAddr, UnwindEntry, UnwindTable};

/// Second index word of a function that cannot be unwound.
const EXIDX_CANTUNWIND: u32 = 1;

const R_ARM_PREL31: u32 = 42;
const R_C6000_PREL31: u32 = 25;

/// Personality routines whose data follows the GNU layout.
const GNU_PERSONALITIES: [&str; 4] = [
    "__gcc_personality_v0",
    "__gxx_personality_v0",
    "__gcj_personality_v0",
    "__gnu_objc_personality_v0",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flavor {
    Arm,
    C6000,
}

impl Flavor {
    fn prel31_type(self) -> u32 {
        match self {
            Flavor::Arm => R_ARM_PREL31,
            Flavor::C6000 => R_C6000_PREL31,
        }
    }

    fn decode_ops(self, bytes: &[u8]) -> Vec<String> {
        match self {
            Flavor::Arm => arm_ops(bytes),
            Flavor::C6000 => c6000_ops(bytes),
        }
    }
}

/// Sign-extend the low 31 bits of `word`.
fn prel31(word: u32) -> u64 {
    (((word << 1) as i32) >> 1) as i64 as u64
}

pub fn decode(file: &ElfFile<'_>) -> Vec<UnwindTable> {
    let flavor = if file.header.machine == EM_TI_C6000 {
        Flavor::C6000
    } else {
        Flavor::Arm
    };
    let mut decoder = Decoder {
        file,
        flavor,
        relocs: HashMap::new(),
    };
    file.sections()
        .iter()
        .filter(|s| s.sh_type == SHT_PROC_UNWIND)
        .filter_map(|sec| decoder.table(sec))
        .collect()
}

type Resolved<'f> = (Relocation, Option<&'f Symbol>);

struct Decoder<'f, 'a> {
    file: &'f ElfFile<'a>,
    flavor: Flavor,

    /// Relocations against each section, by section index and offset.
    relocs: HashMap<usize, HashMap<u64, Resolved<'f>>>,
}

impl<'f, 'a> Decoder<'f, 'a> {
    /// The relocation patching `offset` of section `index` in an object
    /// file. Unexpected relocation types are reported and ignored.
    fn reloc_at(&mut self, index: usize, offset: u64) -> Option<Resolved<'f>> {
        if !self.file.is_relocatable() {
            return None;
        }
        let file = self.file;
        let expected = self.flavor.prel31_type();
        let table = self.relocs.entry(index).or_insert_with(|| {
            let mut by_offset = HashMap::new();
            for (rel, sym) in file.relocations_against(index) {
                if rel.rtype != expected {
                    file.diag().warn(format_args!(
                        "Skipping unexpected relocation type {} in unwind section [{index}]",
                        super::super::reloc::type_name(rel.rtype, file.caps)
                    ));
                    continue;
                }
                by_offset.insert(rel.offset, (rel, sym));
            }
            by_offset
        });
        table.get(&offset).cloned()
    }

    fn table(&mut self, sec: &SectionHeader) -> Option<UnwindTable> {
        let file = self.file;
        let data = file.section_data(sec).ok()?;
        if data.len() % 8 != 0 {
            file.diag().warn(format_args!(
                "Unwind section {} size {:#x} is not a multiple of 8",
                sec.name,
                data.len()
            ));
        }
        let symbols = file.address_symbols();
        let mut entries = Vec::new();
        for (i, pair) in data.chunks_exact(8).enumerate() {
            let off = i as u64 * 8;
            let (Ok(w0), Ok(w1)) = (file.codec.u32_at(pair, 0), file.codec.u32_at(pair, 4)) else {
                break;
            };

            let func = match self.reloc_at(sec.index, off) {
                Some((rel, sym)) => relocated(&rel, sym, prel31(w0)),
                None if file.is_relocatable() => AbsAddr::raw(prel31(w0)),
                None => AbsAddr::raw(sec.addr.wrapping_add(off).wrapping_add(prel31(w0))),
            };
            let func_text = format_addr(func, symbols);
            let word1_reloc = self.reloc_at(sec.index, off + 4);

            let entry = if w1 == EXIDX_CANTUNWIND && word1_reloc.is_none() {
                UnwindEntry {
                    heading: format!("{func_text}: 0x1 [cantunwind]"),
                    lines: Vec::new(),
                }
            } else if w1 & 0x8000_0000 != 0 && word1_reloc.is_none() {
                UnwindEntry {
                    heading: format!("{func_text}: {w1:#x}"),
                    lines: self.compact(w1, &[]),
                }
            } else {
                let target = match word1_reloc {
                    Some((rel, sym)) => relocated(&rel, sym, prel31(w1)),
                    None => AbsAddr::raw(
                        sec.addr
                            .wrapping_add(off + 4)
                            .wrapping_add(prel31(w1)),
                    ),
                };
                UnwindEntry {
                    heading: format!("{func_text}: @{:#x}", target.offset),
                    lines: self.extab(target),
                }
            };
            entries.push(entry);
        }
        Some(UnwindTable {
            section: sec.index,
            name: sec.name.clone(),
            offset: sec.offset,
            entries,
        })
    }

    /// Decode the exception table record at `target`.
    fn extab(&mut self, target: AbsAddr) -> Vec<String> {
        let file = self.file;
        let located = match target.section {
            Some(idx) => file.sections().get(idx).map(|s| (s, target.offset)),
            None => file
                .section_containing(target.offset)
                .map(|s| (s, target.offset - s.addr)),
        };
        let Some((sec, off)) = located else {
            return vec![format!("  [exception table entry {:#x} not found]", target.offset)];
        };
        let data = file.section_data(sec).unwrap_or(&[]);
        let Some(start) = usize::try_from(off).ok().filter(|&o| o < data.len()) else {
            return vec!["  [Truncated data]".to_string()];
        };
        let Ok(word) = file.codec.u32_at(data, start) else {
            return vec!["  [Truncated data]".to_string()];
        };
        if word & 0x8000_0000 != 0 {
            return self.compact(word, &data[start + 4..]);
        }

        let name = match self.reloc_at(sec.index, off) {
            Some((rel, sym)) => sym.filter(|s| !s.name.is_empty()).map_or_else(
                || format!("{:#x}", relocated(&rel, sym, prel31(word)).offset),
                |s| s.name.clone(),
            ),
            None => {
                let routine = AbsAddr::raw(
                    sec.addr.wrapping_add(off).wrapping_add(prel31(word)),
                );
                match symbolize(routine, file.address_symbols()) {
                    Some((name, 0)) => name.to_string(),
                    _ => format_addr(routine, file.address_symbols()),
                }
            }
        };
        let mut lines = vec![format!("  Personality routine: {name}")];
        if !GNU_PERSONALITIES.contains(&name.as_str()) {
            lines.push("  [Personality routine-specific data]".to_string());
            return lines;
        }
        let rest = &data[start + 4..];
        let Ok(header) = file.codec.u32_at(rest, 0) else {
            lines.push("  [Truncated data]".to_string());
            return lines;
        };
        let more_words = (header >> 24) as usize;
        let mut bytes = header.to_be_bytes()[1..].to_vec();
        self.append_words(&mut bytes, &rest[4..], more_words, &mut lines);
        lines.extend(self.flavor.decode_ops(&bytes));
        lines
    }

    /// Decode a compact-model word; `rest` holds any further words.
    fn compact(&self, word: u32, rest: &[u8]) -> Vec<String> {
        let index = (word >> 24) & 0xf;
        let mut lines = vec![format!("  Compact model index: {index}")];
        let be = word.to_be_bytes();
        let bytes = match index {
            0 => be[1..].to_vec(),
            1 | 2 => {
                let mut bytes = be[2..].to_vec();
                self.append_words(&mut bytes, rest, usize::from(be[1]), &mut lines);
                bytes
            }
            _ => {
                lines.push(format!("  [reserved compact model index {index}]"));
                return lines;
            }
        };
        lines.extend(self.flavor.decode_ops(&bytes));
        lines
    }

    /// Append `count` further opcode words, most significant byte first.
    fn append_words(&self, bytes: &mut Vec<u8>, rest: &[u8], count: usize, lines: &mut Vec<String>) {
        for i in 0..count {
            match self.file.codec.u32_at(rest, i * 4) {
                Ok(w) => bytes.extend_from_slice(&w.to_be_bytes()),
                Err(_) => {
                    self.file.diag().warn(format_args!(
                        "Unwind data claims {count} extra words but only {i} are present"
                    ));
                    lines.push("  [Truncated data]".to_string());
                    return;
                }
            }
        }
    }
}

// ============================================================================
// Opcode streams
// ============================================================================

fn op_line(raw: &[u8], text: impl std::fmt::Display) -> String {
    let hex: Vec<String> = raw.iter().map(|b| format!("{b:#04x}")).collect();
    format!("  {:<11} {text}", hex.join(" "))
}

/// Render a register list: `{r4, r5, lr}`.
fn reg_list<'n>(names: impl IntoIterator<Item = &'n str>) -> String {
    format!("{{{}}}", names.into_iter().collect::<Vec<_>>().join(", "))
}

const ARM_REGS: [&str; 16] = [
    "r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8", "r9", "r10", "fp", "ip", "sp", "lr", "pc",
];

fn masked<'n>(mask: u32, names: &'n [&'n str]) -> impl Iterator<Item = &'n str> + 'n {
    names
        .iter()
        .enumerate()
        .filter(move |(i, _)| mask & (1 << i) != 0)
        .map(|(_, n)| *n)
}

fn reg_range(prefix: &str, first: u32, count: u32) -> String {
    if count == 0 {
        format!("{{{prefix}{first}}}")
    } else {
        format!("{{{prefix}{first}-{prefix}{}}}", first + count)
    }
}

/// Decode ARM EHABI unwind instructions.
fn arm_ops(bytes: &[u8]) -> Vec<String> {
    let mut c = Cursor::new(bytes);
    let mut out = Vec::new();
    while !c.is_empty() {
        let start = c.position();
        let Some(text) = arm_op(&mut c) else {
            out.push(op_line(&bytes[start..], "[Truncated opcode]"));
            break;
        };
        out.push(op_line(&bytes[start..c.position()], text));
    }
    out
}

fn arm_op(c: &mut Cursor<'_>) -> Option<String> {
    let op = c.u8()?;
    let text = match op {
        0x00..=0x3f => format!("vsp = vsp + {}", (u32::from(op & 0x3f) << 2) + 4),
        0x40..=0x7f => format!("vsp = vsp - {}", (u32::from(op & 0x3f) << 2) + 4),
        0x80..=0x8f => {
            let op2 = c.u8()?;
            let mask = (u32::from(op & 0xf) << 8) | u32::from(op2);
            if mask == 0 {
                "Refuse to unwind".to_string()
            } else {
                format!("pop {}", reg_list(masked(mask << 4, &ARM_REGS)))
            }
        }
        0x90..=0x9f if op & 0xf == 13 || op & 0xf == 15 => "[Reserved]".to_string(),
        0x90..=0x9f => format!("vsp = {}", ARM_REGS[usize::from(op & 0xf)]),
        0xa0..=0xaf => {
            let last = 4 + usize::from(op & 0x7);
            let mut regs: Vec<&str> = ARM_REGS[4..=last].to_vec();
            if op & 0x8 != 0 {
                regs.push("lr");
            }
            format!("pop {}", reg_list(regs))
        }
        0xb0 => "finish".to_string(),
        0xb1 => {
            let op2 = c.u8()?;
            if op2 == 0 || op2 & 0xf0 != 0 {
                "[Spare]".to_string()
            } else {
                format!("pop {}", reg_list(masked(u32::from(op2), &ARM_REGS)))
            }
        }
        0xb2 => {
            let value = c.uleb128()?;
            format!("vsp = vsp + {}", value.wrapping_shl(2).wrapping_add(0x204))
        }
        0xb3 | 0xc8 | 0xc9 => {
            let op2 = c.u8()?;
            let base = if op == 0xc8 { 16 } else { 0 };
            let range = reg_range("D", base + u32::from(op2 >> 4), u32::from(op2 & 0xf));
            if op == 0xb3 {
                format!("pop {range} (FSTMFDX)")
            } else {
                format!("pop {range}")
            }
        }
        0xb4..=0xb7 => "[Spare]".to_string(),
        0xb8..=0xbf => format!("pop {} (FSTMFDX)", reg_range("D", 8, u32::from(op & 0x7))),
        0xc0..=0xc5 => format!("pop {}", reg_range("wR", 10, u32::from(op & 0x7))),
        0xc6 => {
            let op2 = c.u8()?;
            format!("pop {}", reg_range("wR", u32::from(op2 >> 4), u32::from(op2 & 0xf)))
        }
        0xc7 => {
            let op2 = c.u8()?;
            if op2 == 0 || op2 & 0xf0 != 0 {
                "[Spare]".to_string()
            } else {
                const WCGR: [&str; 4] = ["wCGR0", "wCGR1", "wCGR2", "wCGR3"];
                format!("pop {}", reg_list(masked(u32::from(op2), &WCGR)))
            }
        }
        0xd0..=0xd7 => format!("pop {}", reg_range("D", 8, u32::from(op & 0x7))),
        _ => "[Spare]".to_string(),
    };
    Some(text)
}

/// C6000 register names in unwind mask bit order.
const C6000_REGS: [&str; 13] = [
    "A15", "B15", "B14", "B13", "B12", "B11", "B10", "B3", "A14", "A13", "A12", "A11", "A10",
];

fn c6000_reg(index: u8) -> &'static str {
    match index {
        0xf => "[pad]",
        i => C6000_REGS.get(usize::from(i)).copied().unwrap_or("[invalid]"),
    }
}

/// Decode TI C6000 unwind instructions.
fn c6000_ops(bytes: &[u8]) -> Vec<String> {
    let mut c = Cursor::new(bytes);
    let mut out = Vec::new();
    while !c.is_empty() {
        let start = c.position();
        let Some(text) = c6000_op(&mut c) else {
            out.push(op_line(&bytes[start..], "[Truncated opcode]"));
            break;
        };
        out.push(op_line(&bytes[start..c.position()], text));
    }
    out
}

fn c6000_op(c: &mut Cursor<'_>) -> Option<String> {
    let op = c.u8()?;
    let text = match op {
        0x00..=0x3f => format!("sp = sp + {}", (u32::from(op & 0x3f) << 3) + 8),
        0x80..=0xbf => {
            let op2 = c.u8()?;
            let mask = (u32::from(op & 0x1f) << 8) | u32::from(op2);
            let kind = if op & 0x20 != 0 { "pop compact" } else { "pop" };
            if mask == 0 {
                "Refuse to unwind".to_string()
            } else {
                format!("{kind} {}", reg_list(masked(mask, &C6000_REGS)))
            }
        }
        0xc0..=0xcf => {
            let count = usize::from(op & 0xf) + 1;
            let packed = c.bytes(count.div_ceil(2))?;
            let regs = packed
                .iter()
                .flat_map(|b| [b >> 4, b & 0xf])
                .take(count)
                .map(c6000_reg);
            format!("pop frame {}", reg_list(regs))
        }
        0xd0 => "MOV FP, SP".to_string(),
        0xd1 => "__c6xabi_pop_rts".to_string(),
        0xd2 => {
            let value = c.uleb128()?;
            format!("sp = sp + {}", value.wrapping_shl(3).wrapping_add(0x408))
        }
        0xe0..=0xef => match c6000_reg(op & 0xf) {
            "B3" => "RETURN".to_string(),
            reg => format!("MV {reg}, B3"),
        },
        _ => "[Reserved]".to_string(),
    };
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prel31() {
        assert_eq!(prel31(0x10), 0x10);
        assert_eq!(prel31(0x7fff_fff0) as i64, -0x10);
        assert_eq!(prel31(0x8000_0010), 0x10);
    }

    #[test]
    fn test_arm_opcodes() {
        let lines = arm_ops(&[0x97, 0x84, 0x00, 0xa3, 0x02, 0x41, 0xb1, 0x03, 0xb2, 0x01, 0xb0]);
        assert_eq!(
            lines,
            [
                "  0x97        vsp = r7",
                "  0x84 0x00   pop {lr}",
                "  0xa3        pop {r4, r5, r6, r7}",
                "  0x02        vsp = vsp + 12",
                "  0x41        vsp = vsp - 8",
                "  0xb1 0x03   pop {r0, r1}",
                "  0xb2 0x01   vsp = vsp + 520",
                "  0xb0        finish",
            ]
        );
    }

    #[test]
    fn test_arm_vfp_and_refuse() {
        let lines = arm_ops(&[0xb3, 0x12, 0xc9, 0x80, 0xd1, 0x80, 0x00, 0x9d]);
        assert_eq!(lines[0], "  0xb3 0x12   pop {D1-D3} (FSTMFDX)");
        assert_eq!(lines[1], "  0xc9 0x80   pop {D8}");
        assert_eq!(lines[2], "  0xd1        pop {D8-D9}");
        assert_eq!(lines[3], "  0x80 0x00   Refuse to unwind");
        assert_eq!(lines[4], "  0x9d        [Reserved]");
    }

    #[test]
    fn test_truncated_opcode() {
        let lines = arm_ops(&[0xb0, 0xb2, 0x80]);
        assert_eq!(lines.last().map(String::as_str), Some("  0xb2 0x80   [Truncated opcode]"));
    }

    #[test]
    fn test_c6000_opcodes() {
        let lines = c6000_ops(&[0x01, 0x80, 0x81, 0xc2, 0x78, 0xf0, 0xd2, 0x01, 0xe7, 0xe1, 0xd0]);
        assert_eq!(
            lines,
            [
                "  0x01        sp = sp + 16",
                "  0x80 0x81   pop {A15, B3}",
                "  0xc2 0x78 0xf0 pop frame {B3, A14, [pad]}",
                "  0xd2 0x01   sp = sp + 1040",
                "  0xe7        RETURN",
                "  0xe1        MV B15, B3",
                "  0xd0        MOV FP, SP",
            ]
        );
    }
}
