//! x86-64 and i386.

use super::{name_table, MachineCaps, RelocEffect, EM_386, EM_X86_64};

static X86_64_RELOCS: &[(u32, &str)] = name_table! {
    R_X86_64_NONE = 0,
    R_X86_64_64 = 1,
    R_X86_64_PC32 = 2,
    R_X86_64_GOT32 = 3,
    R_X86_64_PLT32 = 4,
    R_X86_64_COPY = 5,
    R_X86_64_GLOB_DAT = 6,
    R_X86_64_JUMP_SLOT = 7,
    R_X86_64_RELATIVE = 8,
    R_X86_64_GOTPCREL = 9,
    R_X86_64_32 = 10,
    R_X86_64_32S = 11,
    R_X86_64_16 = 12,
    R_X86_64_PC16 = 13,
    R_X86_64_8 = 14,
    R_X86_64_PC8 = 15,
    R_X86_64_DTPMOD64 = 16,
    R_X86_64_DTPOFF64 = 17,
    R_X86_64_TPOFF64 = 18,
    R_X86_64_TLSGD = 19,
    R_X86_64_TLSLD = 20,
    R_X86_64_DTPOFF32 = 21,
    R_X86_64_GOTTPOFF = 22,
    R_X86_64_TPOFF32 = 23,
    R_X86_64_PC64 = 24,
    R_X86_64_GOTOFF64 = 25,
    R_X86_64_GOTPC32 = 26,
    R_X86_64_GOT64 = 27,
    R_X86_64_GOTPCREL64 = 28,
    R_X86_64_GOTPC64 = 29,
    R_X86_64_GOTPLT64 = 30,
    R_X86_64_PLTOFF64 = 31,
    R_X86_64_SIZE32 = 32,
    R_X86_64_SIZE64 = 33,
    R_X86_64_GOTPC32_TLSDESC = 34,
    R_X86_64_TLSDESC_CALL = 35,
    R_X86_64_TLSDESC = 36,
    R_X86_64_IRELATIVE = 37,
    R_X86_64_RELATIVE64 = 38,
    R_X86_64_GOTPCRELX = 41,
    R_X86_64_REX_GOTPCRELX = 42,
    R_X86_64_CODE_4_GOTPCRELX = 43,
    R_X86_64_CODE_4_GOTTPOFF = 44,
    R_X86_64_CODE_4_GOTPC32_TLSDESC = 45,
    R_X86_64_GNU_VTINHERIT = 250,
    R_X86_64_GNU_VTENTRY = 251,
};

static X86_64_EFFECTS: &[(u32, RelocEffect)] = &[
    (0, RelocEffect::None),
    (1, RelocEffect::Abs(8)),
    (2, RelocEffect::PcRel(4)),
    (4, RelocEffect::PcRel(4)),
    (10, RelocEffect::Abs(4)),
    (11, RelocEffect::Abs(4)),
    (12, RelocEffect::Abs(2)),
    (13, RelocEffect::PcRel(2)),
    (14, RelocEffect::Abs(1)),
    (15, RelocEffect::PcRel(1)),
    (24, RelocEffect::PcRel(8)),
];

static I386_RELOCS: &[(u32, &str)] = name_table! {
    R_386_NONE = 0,
    R_386_32 = 1,
    R_386_PC32 = 2,
    R_386_GOT32 = 3,
    R_386_PLT32 = 4,
    R_386_COPY = 5,
    R_386_GLOB_DAT = 6,
    R_386_JUMP_SLOT = 7,
    R_386_RELATIVE = 8,
    R_386_GOTOFF = 9,
    R_386_GOTPC = 10,
    R_386_32PLT = 11,
    R_386_TLS_TPOFF = 14,
    R_386_TLS_IE = 15,
    R_386_TLS_GOTIE = 16,
    R_386_TLS_LE = 17,
    R_386_TLS_GD = 18,
    R_386_TLS_LDM = 19,
    R_386_16 = 20,
    R_386_PC16 = 21,
    R_386_8 = 22,
    R_386_PC8 = 23,
    R_386_TLS_GD_32 = 24,
    R_386_TLS_GD_PUSH = 25,
    R_386_TLS_GD_CALL = 26,
    R_386_TLS_GD_POP = 27,
    R_386_TLS_LDM_32 = 28,
    R_386_TLS_LDM_PUSH = 29,
    R_386_TLS_LDM_CALL = 30,
    R_386_TLS_LDM_POP = 31,
    R_386_TLS_LDO_32 = 32,
    R_386_TLS_IE_32 = 33,
    R_386_TLS_LE_32 = 34,
    R_386_TLS_DTPMOD32 = 35,
    R_386_TLS_DTPOFF32 = 36,
    R_386_TLS_TPOFF32 = 37,
    R_386_SIZE32 = 38,
    R_386_TLS_GOTDESC = 39,
    R_386_TLS_DESC_CALL = 40,
    R_386_TLS_DESC = 41,
    R_386_IRELATIVE = 42,
    R_386_GOT32X = 43,
    R_386_GNU_VTINHERIT = 250,
    R_386_GNU_VTENTRY = 251,
};

static I386_EFFECTS: &[(u32, RelocEffect)] = &[
    (0, RelocEffect::None),
    (1, RelocEffect::Abs(4)),
    (2, RelocEffect::PcRel(4)),
    (20, RelocEffect::Abs(2)),
    (21, RelocEffect::PcRel(2)),
    (22, RelocEffect::Abs(1)),
    (23, RelocEffect::PcRel(1)),
];

pub static X86_64: MachineCaps = MachineCaps {
    machines: &[EM_X86_64],
    relocs: X86_64_RELOCS,
    reloc_effects: X86_64_EFFECTS,
    section_types: name_table! { X86_64_UNWIND = 0x7000_0001 },
    segment_types: &[],
    dynamic_tags: name_table! {
        X86_64_PLT = 0x7000_0000,
        X86_64_PLTSZ = 0x7000_0001,
        X86_64_PLTENT = 0x7000_0003,
    },
    symbol_types: &[],
    section_indices: name_table! { LARGE_COM = 0xff02 },
    symbol_other: &[],
    decode_flags: super::no_flags,
    quirks: &[],
};

pub static I386: MachineCaps = MachineCaps {
    machines: &[EM_386, 6],
    relocs: I386_RELOCS,
    reloc_effects: I386_EFFECTS,
    section_types: &[],
    segment_types: &[],
    dynamic_tags: &[],
    symbol_types: &[],
    section_indices: &[],
    symbol_other: &[],
    decode_flags: super::no_flags,
    quirks: &[],
};
