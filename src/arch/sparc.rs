//! SPARC, SPARC32PLUS and SPARC V9.

use super::{name_table, MachineCaps, RelocEffect, EM_SPARC, EM_SPARC32PLUS, EM_SPARCV9};

static SPARC_RELOCS: &[(u32, &str)] = name_table! {
    R_SPARC_NONE = 0,
    R_SPARC_8 = 1,
    R_SPARC_16 = 2,
    R_SPARC_32 = 3,
    R_SPARC_DISP8 = 4,
    R_SPARC_DISP16 = 5,
    R_SPARC_DISP32 = 6,
    R_SPARC_WDISP30 = 7,
    R_SPARC_WDISP22 = 8,
    R_SPARC_HI22 = 9,
    R_SPARC_22 = 10,
    R_SPARC_13 = 11,
    R_SPARC_LO10 = 12,
    R_SPARC_GOT10 = 13,
    R_SPARC_GOT13 = 14,
    R_SPARC_GOT22 = 15,
    R_SPARC_PC10 = 16,
    R_SPARC_PC22 = 17,
    R_SPARC_WPLT30 = 18,
    R_SPARC_COPY = 19,
    R_SPARC_GLOB_DAT = 20,
    R_SPARC_JMP_SLOT = 21,
    R_SPARC_RELATIVE = 22,
    R_SPARC_UA32 = 23,
    R_SPARC_PLT32 = 24,
    R_SPARC_HIPLT22 = 25,
    R_SPARC_LOPLT10 = 26,
    R_SPARC_PCPLT32 = 27,
    R_SPARC_PCPLT22 = 28,
    R_SPARC_PCPLT10 = 29,
    R_SPARC_10 = 30,
    R_SPARC_11 = 31,
    R_SPARC_64 = 32,
    R_SPARC_OLO10 = 33,
    R_SPARC_HH22 = 34,
    R_SPARC_HM10 = 35,
    R_SPARC_LM22 = 36,
    R_SPARC_PC_HH22 = 37,
    R_SPARC_PC_HM10 = 38,
    R_SPARC_PC_LM22 = 39,
    R_SPARC_WDISP16 = 40,
    R_SPARC_WDISP19 = 41,
    R_SPARC_7 = 43,
    R_SPARC_5 = 44,
    R_SPARC_6 = 45,
    R_SPARC_DISP64 = 46,
    R_SPARC_PLT64 = 47,
    R_SPARC_HIX22 = 48,
    R_SPARC_LOX10 = 49,
    R_SPARC_H44 = 50,
    R_SPARC_M44 = 51,
    R_SPARC_L44 = 52,
    R_SPARC_REGISTER = 53,
    R_SPARC_UA64 = 54,
    R_SPARC_UA16 = 55,
    R_SPARC_TLS_GD_HI22 = 56,
    R_SPARC_TLS_GD_LO10 = 57,
    R_SPARC_TLS_GD_ADD = 58,
    R_SPARC_TLS_GD_CALL = 59,
    R_SPARC_TLS_DTPMOD32 = 74,
    R_SPARC_TLS_DTPMOD64 = 75,
    R_SPARC_TLS_DTPOFF32 = 76,
    R_SPARC_TLS_DTPOFF64 = 77,
    R_SPARC_TLS_TPOFF32 = 78,
    R_SPARC_TLS_TPOFF64 = 79,
    R_SPARC_GOTDATA_HIX22 = 80,
    R_SPARC_GOTDATA_LOX10 = 81,
    R_SPARC_H34 = 85,
    R_SPARC_SIZE32 = 86,
    R_SPARC_SIZE64 = 87,
    R_SPARC_WDISP10 = 88,
    R_SPARC_JMP_IREL = 248,
    R_SPARC_IRELATIVE = 249,
    R_SPARC_GNU_VTINHERIT = 250,
    R_SPARC_GNU_VTENTRY = 251,
    R_SPARC_REV32 = 252,
};

pub static SPARC: MachineCaps = MachineCaps {
    machines: &[EM_SPARC, EM_SPARC32PLUS, EM_SPARCV9],
    relocs: SPARC_RELOCS,
    reloc_effects: &[
        (0, RelocEffect::None),
        (3, RelocEffect::Abs(4)),
        (23, RelocEffect::Abs(4)),
        (32, RelocEffect::Abs(8)),
        (54, RelocEffect::Abs(8)),
        (6, RelocEffect::PcRel(4)),
        (46, RelocEffect::PcRel(8)),
    ],
    section_types: &[],
    segment_types: &[],
    dynamic_tags: name_table! { SPARC_REGISTER = 0x7000_0001 },
    symbol_types: name_table! { REGISTER = 13 },
    section_indices: &[],
    symbol_other: &[],
    decode_flags: sparc_flags,
    quirks: &[],
};

const EF_SPARCV9_MM: u32 = 0x3;
const EF_SPARC_32PLUS: u32 = 0x100;
const EF_SPARC_SUN_US1: u32 = 0x200;
const EF_SPARC_HAL_R1: u32 = 0x400;
const EF_SPARC_SUN_US3: u32 = 0x800;
const EF_SPARC_LEDATA: u32 = 0x0080_0000;

fn sparc_flags(flags: u32) -> Vec<String> {
    let mut out = Vec::new();
    for (bit, name) in [
        (EF_SPARC_32PLUS, "v8+"),
        (EF_SPARC_SUN_US1, "ultrasparcI"),
        (EF_SPARC_SUN_US3, "ultrasparcIII"),
        (EF_SPARC_HAL_R1, "halr1"),
        (EF_SPARC_LEDATA, "ledata"),
    ] {
        if flags & bit != 0 {
            out.push(name.to_string());
        }
    }
    match flags & EF_SPARCV9_MM {
        0 => out.push("tso".to_string()),
        1 => out.push("pso".to_string()),
        2 => out.push("rmo".to_string()),
        _ => {}
    }
    out
}
