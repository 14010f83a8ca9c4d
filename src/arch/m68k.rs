//! Motorola 68000.

use super::{name_table, MachineCaps, RelocEffect, EM_68K};

static M68K_RELOCS: &[(u32, &str)] = name_table! {
    R_68K_NONE = 0,
    R_68K_32 = 1,
    R_68K_16 = 2,
    R_68K_8 = 3,
    R_68K_PC32 = 4,
    R_68K_PC16 = 5,
    R_68K_PC8 = 6,
    R_68K_GOT32 = 7,
    R_68K_GOT16 = 8,
    R_68K_GOT8 = 9,
    R_68K_GOT32O = 10,
    R_68K_GOT16O = 11,
    R_68K_GOT8O = 12,
    R_68K_PLT32 = 13,
    R_68K_PLT16 = 14,
    R_68K_PLT8 = 15,
    R_68K_PLT32O = 16,
    R_68K_PLT16O = 17,
    R_68K_PLT8O = 18,
    R_68K_COPY = 19,
    R_68K_GLOB_DAT = 20,
    R_68K_JMP_SLOT = 21,
    R_68K_RELATIVE = 22,
    R_68K_GNU_VTINHERIT = 23,
    R_68K_GNU_VTENTRY = 24,
    R_68K_TLS_GD32 = 25,
    R_68K_TLS_LDM32 = 28,
    R_68K_TLS_LDO32 = 31,
    R_68K_TLS_IE32 = 34,
    R_68K_TLS_LE32 = 37,
    R_68K_TLS_DTPMOD32 = 40,
    R_68K_TLS_DTPREL32 = 41,
    R_68K_TLS_TPREL32 = 42,
};

pub static M68K: MachineCaps = MachineCaps {
    machines: &[EM_68K],
    relocs: M68K_RELOCS,
    reloc_effects: &[
        (0, RelocEffect::None),
        (1, RelocEffect::Abs(4)),
        (2, RelocEffect::Abs(2)),
        (3, RelocEffect::Abs(1)),
        (4, RelocEffect::PcRel(4)),
        (5, RelocEffect::PcRel(2)),
        (6, RelocEffect::PcRel(1)),
    ],
    section_types: &[],
    segment_types: &[],
    dynamic_tags: &[],
    symbol_types: &[],
    section_indices: &[],
    symbol_other: &[],
    decode_flags: m68k_flags,
    quirks: &[],
};

const EF_M68K_CPU32: u32 = 0x0081_0000;
const EF_M68K_M68000: u32 = 0x0100_0000;
const EF_M68K_CFV4E: u32 = 0x0000_8000;

fn m68k_flags(flags: u32) -> Vec<String> {
    if flags & EF_M68K_M68000 == EF_M68K_M68000 {
        vec!["m68000".to_string()]
    } else if flags & EF_M68K_CPU32 == EF_M68K_CPU32 {
        vec!["cpu32".to_string()]
    } else if flags & EF_M68K_CFV4E == EF_M68K_CFV4E {
        vec!["cfv4e".to_string()]
    } else {
        Vec::new()
    }
}
