//! LoongArch.

use super::{name_table, MachineCaps, RelocEffect, EM_LOONGARCH};

static LOONGARCH_RELOCS: &[(u32, &str)] = name_table! {
    R_LARCH_NONE = 0,
    R_LARCH_32 = 1,
    R_LARCH_64 = 2,
    R_LARCH_RELATIVE = 3,
    R_LARCH_COPY = 4,
    R_LARCH_JUMP_SLOT = 5,
    R_LARCH_TLS_DTPMOD32 = 6,
    R_LARCH_TLS_DTPMOD64 = 7,
    R_LARCH_TLS_DTPREL32 = 8,
    R_LARCH_TLS_DTPREL64 = 9,
    R_LARCH_TLS_TPREL32 = 10,
    R_LARCH_TLS_TPREL64 = 11,
    R_LARCH_IRELATIVE = 12,
    R_LARCH_TLS_DESC32 = 13,
    R_LARCH_TLS_DESC64 = 14,
    R_LARCH_MARK_LA = 20,
    R_LARCH_MARK_PCREL = 21,
    R_LARCH_SOP_PUSH_PCREL = 22,
    R_LARCH_SOP_PUSH_ABSOLUTE = 23,
    R_LARCH_ADD8 = 47,
    R_LARCH_ADD16 = 48,
    R_LARCH_ADD24 = 49,
    R_LARCH_ADD32 = 50,
    R_LARCH_ADD64 = 51,
    R_LARCH_SUB8 = 52,
    R_LARCH_SUB16 = 53,
    R_LARCH_SUB24 = 54,
    R_LARCH_SUB32 = 55,
    R_LARCH_SUB64 = 56,
    R_LARCH_GNU_VTINHERIT = 57,
    R_LARCH_GNU_VTENTRY = 58,
    R_LARCH_B16 = 64,
    R_LARCH_B21 = 65,
    R_LARCH_B26 = 66,
    R_LARCH_ABS_HI20 = 67,
    R_LARCH_ABS_LO12 = 68,
    R_LARCH_ABS64_LO20 = 69,
    R_LARCH_ABS64_HI12 = 70,
    R_LARCH_PCALA_HI20 = 71,
    R_LARCH_PCALA_LO12 = 72,
    R_LARCH_GOT_PC_HI20 = 75,
    R_LARCH_GOT_PC_LO12 = 76,
    R_LARCH_32_PCREL = 99,
    R_LARCH_RELAX = 100,
    R_LARCH_ALIGN = 102,
    R_LARCH_PCREL20_S2 = 103,
    R_LARCH_ADD6 = 105,
    R_LARCH_SUB6 = 106,
    R_LARCH_ADD_ULEB128 = 107,
    R_LARCH_SUB_ULEB128 = 108,
    R_LARCH_64_PCREL = 109,
    R_LARCH_CALL36 = 110,
};

pub static LOONGARCH: MachineCaps = MachineCaps {
    machines: &[EM_LOONGARCH],
    relocs: LOONGARCH_RELOCS,
    reloc_effects: &[
        (0, RelocEffect::None),
        (1, RelocEffect::Abs(4)),
        (2, RelocEffect::Abs(8)),
        (47, RelocEffect::Add(1)),
        (48, RelocEffect::Add(2)),
        (49, RelocEffect::Add(3)),
        (50, RelocEffect::Add(4)),
        (51, RelocEffect::Add(8)),
        (52, RelocEffect::Sub(1)),
        (53, RelocEffect::Sub(2)),
        (54, RelocEffect::Sub(3)),
        (55, RelocEffect::Sub(4)),
        (56, RelocEffect::Sub(8)),
        (99, RelocEffect::PcRel(4)),
        (100, RelocEffect::None),
        (102, RelocEffect::None),
        (105, RelocEffect::Add6),
        (106, RelocEffect::Sub6),
        (107, RelocEffect::UlebAdd),
        (108, RelocEffect::UlebSub),
        (109, RelocEffect::PcRel(8)),
    ],
    section_types: &[],
    segment_types: &[],
    dynamic_tags: &[],
    symbol_types: &[],
    section_indices: &[],
    symbol_other: &[],
    decode_flags: loongarch_flags,
    quirks: &[],
};

const EF_LOONGARCH_ABI_MODIFIER_MASK: u32 = 0x07;
const EF_LOONGARCH_OBJABI_MASK: u32 = 0xc0;

fn loongarch_flags(flags: u32) -> Vec<String> {
    let mut out = vec![format!(
        "OBJ-v{}",
        (flags & EF_LOONGARCH_OBJABI_MASK) >> 6
    )];
    out.push(
        match flags & EF_LOONGARCH_ABI_MODIFIER_MASK {
            1 => "SOFT-FLOAT",
            2 => "SINGLE-FLOAT",
            3 => "DOUBLE-FLOAT",
            _ => "<unknown float ABI>",
        }
        .to_string(),
    );
    out
}
