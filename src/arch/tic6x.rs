//! TI C6000 DSP.

use super::{name_table, MachineCaps, RelocEffect, EM_TI_C6000};

static C6000_RELOCS: &[(u32, &str)] = name_table! {
    R_C6000_NONE = 0,
    R_C6000_ABS32 = 1,
    R_C6000_ABS16 = 2,
    R_C6000_ABS8 = 3,
    R_C6000_PCR_S21 = 4,
    R_C6000_PCR_S12 = 5,
    R_C6000_PCR_S10 = 6,
    R_C6000_PCR_S7 = 7,
    R_C6000_ABS_S16 = 8,
    R_C6000_ABS_L16 = 9,
    R_C6000_ABS_H16 = 10,
    R_C6000_SBR_U15_B = 11,
    R_C6000_SBR_U15_H = 12,
    R_C6000_SBR_U15_W = 13,
    R_C6000_SBR_S16 = 14,
    R_C6000_SBR_L16_B = 15,
    R_C6000_SBR_L16_H = 16,
    R_C6000_SBR_L16_W = 17,
    R_C6000_SBR_H16_B = 18,
    R_C6000_SBR_H16_H = 19,
    R_C6000_SBR_H16_W = 20,
    R_C6000_SBR_GOT_U15_W = 21,
    R_C6000_SBR_GOT_L16_W = 22,
    R_C6000_SBR_GOT_H16_W = 23,
    R_C6000_DSBT_INDEX = 24,
    R_C6000_PREL31 = 25,
    R_C6000_COPY = 26,
    R_C6000_JUMP_SLOT = 27,
    R_C6000_EHTYPE = 28,
    R_C6000_PCR_H16 = 29,
    R_C6000_PCR_L16 = 30,
    R_C6000_ALIGN = 253,
    R_C6000_FPHEAD = 254,
    R_C6000_NOCMP = 255,
};

pub static TIC6X: MachineCaps = MachineCaps {
    machines: &[EM_TI_C6000],
    relocs: C6000_RELOCS,
    reloc_effects: &[
        (0, RelocEffect::None),
        (1, RelocEffect::Abs(4)),
        (2, RelocEffect::Abs(2)),
        (3, RelocEffect::Abs(1)),
    ],
    section_types: name_table! {
        C6000_UNWIND = 0x7000_0001,
        C6000_PREEMPTMAP = 0x7000_0002,
        C6000_ATTRIBUTES = 0x7000_0003,
        TI_ICODE = 0x7f00_0000,
        TI_XREF = 0x7f00_0001,
        TI_HANDLER = 0x7f00_0002,
        TI_INITINFO = 0x7f00_0003,
        TI_PHATTRS = 0x7f00_0004,
    },
    segment_types: name_table! { C6000_PHATTR = 0x7000_0000 },
    dynamic_tags: name_table! {
        C6000_GSYM_OFFSET = 0x6000_0000,
        C6000_GSTR_OFFSET = 0x6000_0001,
        C6000_DSBT_BASE = 0x7000_0000,
        C6000_DSBT_SIZE = 0x7000_0001,
        C6000_PREEMPTMAP = 0x7000_0002,
        C6000_DSBT_INDEX = 0x7000_0003,
    },
    symbol_types: &[],
    section_indices: name_table! { SCOM = 0xff00 },
    symbol_other: &[],
    decode_flags: c6000_flags,
    quirks: &[],
};

const EF_C6000_REL: u32 = 0x1;

fn c6000_flags(flags: u32) -> Vec<String> {
    if flags & EF_C6000_REL != 0 {
        vec!["relocatable module".to_string()]
    } else {
        Vec::new()
    }
}
