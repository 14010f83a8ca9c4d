//! AArch64 and 32-bit ARM.

use super::{name_table, MachineCaps, RelocEffect, EM_AARCH64, EM_ARM};

static AARCH64_RELOCS: &[(u32, &str)] = name_table! {
    R_AARCH64_NONE = 0,
    R_AARCH64_P32_ABS32 = 1,
    R_AARCH64_P32_COPY = 180,
    R_AARCH64_P32_GLOB_DAT = 181,
    R_AARCH64_P32_JUMP_SLOT = 182,
    R_AARCH64_P32_RELATIVE = 183,
    R_AARCH64_ABS64 = 257,
    R_AARCH64_ABS32 = 258,
    R_AARCH64_ABS16 = 259,
    R_AARCH64_PREL64 = 260,
    R_AARCH64_PREL32 = 261,
    R_AARCH64_PREL16 = 262,
    R_AARCH64_MOVW_UABS_G0 = 263,
    R_AARCH64_MOVW_UABS_G0_NC = 264,
    R_AARCH64_MOVW_UABS_G1 = 265,
    R_AARCH64_MOVW_UABS_G1_NC = 266,
    R_AARCH64_MOVW_UABS_G2 = 267,
    R_AARCH64_MOVW_UABS_G2_NC = 268,
    R_AARCH64_MOVW_UABS_G3 = 269,
    R_AARCH64_MOVW_SABS_G0 = 270,
    R_AARCH64_MOVW_SABS_G1 = 271,
    R_AARCH64_MOVW_SABS_G2 = 272,
    R_AARCH64_LD_PREL_LO19 = 273,
    R_AARCH64_ADR_PREL_LO21 = 274,
    R_AARCH64_ADR_PREL_PG_HI21 = 275,
    R_AARCH64_ADR_PREL_PG_HI21_NC = 276,
    R_AARCH64_ADD_ABS_LO12_NC = 277,
    R_AARCH64_LDST8_ABS_LO12_NC = 278,
    R_AARCH64_TSTBR14 = 279,
    R_AARCH64_CONDBR19 = 280,
    R_AARCH64_JUMP26 = 282,
    R_AARCH64_CALL26 = 283,
    R_AARCH64_LDST16_ABS_LO12_NC = 284,
    R_AARCH64_LDST32_ABS_LO12_NC = 285,
    R_AARCH64_LDST64_ABS_LO12_NC = 286,
    R_AARCH64_MOVW_PREL_G0 = 287,
    R_AARCH64_MOVW_PREL_G0_NC = 288,
    R_AARCH64_MOVW_PREL_G1 = 289,
    R_AARCH64_MOVW_PREL_G1_NC = 290,
    R_AARCH64_MOVW_PREL_G2 = 291,
    R_AARCH64_MOVW_PREL_G2_NC = 292,
    R_AARCH64_MOVW_PREL_G3 = 293,
    R_AARCH64_LDST128_ABS_LO12_NC = 299,
    R_AARCH64_ADR_GOT_PAGE = 311,
    R_AARCH64_LD64_GOT_LO12_NC = 312,
    R_AARCH64_LD64_GOTPAGE_LO15 = 313,
    R_AARCH64_TLSGD_ADR_PAGE21 = 513,
    R_AARCH64_TLSGD_ADD_LO12_NC = 514,
    R_AARCH64_TLSIE_ADR_GOTTPREL_PAGE21 = 541,
    R_AARCH64_TLSIE_LD64_GOTTPREL_LO12_NC = 542,
    R_AARCH64_TLSLE_ADD_TPREL_HI12 = 549,
    R_AARCH64_TLSLE_ADD_TPREL_LO12 = 550,
    R_AARCH64_TLSLE_ADD_TPREL_LO12_NC = 551,
    R_AARCH64_TLSDESC_ADR_PAGE21 = 562,
    R_AARCH64_TLSDESC_LD64_LO12 = 563,
    R_AARCH64_TLSDESC_ADD_LO12 = 564,
    R_AARCH64_TLSDESC_CALL = 569,
    R_AARCH64_COPY = 1024,
    R_AARCH64_GLOB_DAT = 1025,
    R_AARCH64_JUMP_SLOT = 1026,
    R_AARCH64_RELATIVE = 1027,
    R_AARCH64_TLS_DTPMOD = 1028,
    R_AARCH64_TLS_DTPREL = 1029,
    R_AARCH64_TLS_TPREL = 1030,
    R_AARCH64_TLSDESC = 1031,
    R_AARCH64_IRELATIVE = 1032,
};

static ARM_RELOCS: &[(u32, &str)] = name_table! {
    R_ARM_NONE = 0,
    R_ARM_PC24 = 1,
    R_ARM_ABS32 = 2,
    R_ARM_REL32 = 3,
    R_ARM_LDR_PC_G0 = 4,
    R_ARM_ABS16 = 5,
    R_ARM_ABS12 = 6,
    R_ARM_THM_ABS5 = 7,
    R_ARM_ABS8 = 8,
    R_ARM_SBREL32 = 9,
    R_ARM_THM_CALL = 10,
    R_ARM_THM_PC8 = 11,
    R_ARM_BREL_ADJ = 12,
    R_ARM_TLS_DESC = 13,
    R_ARM_THM_SWI8 = 14,
    R_ARM_XPC25 = 15,
    R_ARM_THM_XPC22 = 16,
    R_ARM_TLS_DTPMOD32 = 17,
    R_ARM_TLS_DTPOFF32 = 18,
    R_ARM_TLS_TPOFF32 = 19,
    R_ARM_COPY = 20,
    R_ARM_GLOB_DAT = 21,
    R_ARM_JUMP_SLOT = 22,
    R_ARM_RELATIVE = 23,
    R_ARM_GOTOFF = 24,
    R_ARM_GOTPC = 25,
    R_ARM_GOT32 = 26,
    R_ARM_PLT32 = 27,
    R_ARM_CALL = 28,
    R_ARM_JUMP24 = 29,
    R_ARM_THM_JUMP24 = 30,
    R_ARM_BASE_ABS = 31,
    R_ARM_TARGET1 = 38,
    R_ARM_V4BX = 40,
    R_ARM_TARGET2 = 41,
    R_ARM_PREL31 = 42,
    R_ARM_MOVW_ABS_NC = 43,
    R_ARM_MOVT_ABS = 44,
    R_ARM_MOVW_PREL_NC = 45,
    R_ARM_MOVT_PREL = 46,
    R_ARM_THM_MOVW_ABS_NC = 47,
    R_ARM_THM_MOVT_ABS = 48,
    R_ARM_THM_MOVW_PREL_NC = 49,
    R_ARM_THM_MOVT_PREL = 50,
    R_ARM_THM_JUMP19 = 51,
    R_ARM_GOT_PREL = 96,
    R_ARM_THM_JUMP11 = 102,
    R_ARM_THM_JUMP8 = 103,
    R_ARM_TLS_GD32 = 104,
    R_ARM_TLS_LDM32 = 105,
    R_ARM_TLS_LDO32 = 106,
    R_ARM_TLS_IE32 = 107,
    R_ARM_TLS_LE32 = 108,
    R_ARM_IRELATIVE = 160,
    R_ARM_GNU_VTENTRY = 100,
    R_ARM_GNU_VTINHERIT = 101,
};

pub static AARCH64: MachineCaps = MachineCaps {
    machines: &[EM_AARCH64],
    relocs: AARCH64_RELOCS,
    reloc_effects: &[
        (0, RelocEffect::None),
        (257, RelocEffect::Abs(8)),
        (258, RelocEffect::Abs(4)),
        (259, RelocEffect::Abs(2)),
        (260, RelocEffect::PcRel(8)),
        (261, RelocEffect::PcRel(4)),
        (262, RelocEffect::PcRel(2)),
    ],
    section_types: name_table! {
        AARCH64_ATTRIBUTES = 0x7000_0003,
        AARCH64_AUTH_RELR = 0x7000_0004,
    },
    segment_types: name_table! {
        AARCH64_ARCHEXT = 0x7000_0000,
        AARCH64_MEMTAG_MTE = 0x7000_0002,
    },
    dynamic_tags: name_table! {
        AARCH64_BTI_PLT = 0x7000_0001,
        AARCH64_PAC_PLT = 0x7000_0003,
        AARCH64_VARIANT_PCS = 0x7000_0005,
        AARCH64_MEMTAG_MODE = 0x7000_0009,
        AARCH64_MEMTAG_HEAP = 0x7000_000b,
        AARCH64_MEMTAG_STACK = 0x7000_000c,
    },
    symbol_types: &[],
    section_indices: &[],
    symbol_other: name_table! { VARIANT_PCS = 0x80 },
    decode_flags: super::no_flags,
    quirks: &[],
};

pub static ARM: MachineCaps = MachineCaps {
    machines: &[EM_ARM],
    relocs: ARM_RELOCS,
    reloc_effects: &[
        (0, RelocEffect::None),
        (2, RelocEffect::Abs(4)),
        (3, RelocEffect::PcRel(4)),
    ],
    section_types: name_table! {
        ARM_EXIDX = 0x7000_0001,
        ARM_PREEMPTMAP = 0x7000_0002,
        ARM_ATTRIBUTES = 0x7000_0003,
        ARM_DEBUGOVERLAY = 0x7000_0004,
        ARM_OVERLAYSECTION = 0x7000_0005,
    },
    segment_types: name_table! { EXIDX = 0x7000_0001 },
    dynamic_tags: &[],
    symbol_types: name_table! { THUMB_FUNC = 13 },
    section_indices: &[],
    symbol_other: &[],
    decode_flags: arm_flags,
    quirks: &[],
};

const EF_ARM_EABIMASK: u32 = 0xff00_0000;
const EF_ARM_BE8: u32 = 0x0080_0000;
const EF_ARM_LE8: u32 = 0x0040_0000;
const EF_ARM_ABI_FLOAT_SOFT: u32 = 0x200;
const EF_ARM_ABI_FLOAT_HARD: u32 = 0x400;
const EF_ARM_RELEXEC: u32 = 0x01;
const EF_ARM_HASENTRY: u32 = 0x02;

fn arm_flags(flags: u32) -> Vec<String> {
    let mut out = Vec::new();
    let mut rest = flags;

    match (flags & EF_ARM_EABIMASK) >> 24 {
        0 => {
            out.push("GNU EABI".to_string());
            for (bit, name) in [(EF_ARM_RELEXEC, "relocatable executable"), (EF_ARM_HASENTRY, "has entry point")] {
                if flags & bit != 0 {
                    out.push(name.to_string());
                    rest &= !bit;
                }
            }
        }
        version @ 1..=5 => {
            out.push(format!("Version{version} EABI"));
            if flags & EF_ARM_BE8 != 0 {
                out.push("BE8".to_string());
                rest &= !EF_ARM_BE8;
            }
            if flags & EF_ARM_LE8 != 0 {
                out.push("LE8".to_string());
                rest &= !EF_ARM_LE8;
            }
            if version == 5 {
                if flags & EF_ARM_ABI_FLOAT_SOFT != 0 {
                    out.push("soft-float ABI".to_string());
                    rest &= !EF_ARM_ABI_FLOAT_SOFT;
                }
                if flags & EF_ARM_ABI_FLOAT_HARD != 0 {
                    out.push("hard-float ABI".to_string());
                    rest &= !EF_ARM_ABI_FLOAT_HARD;
                }
            }
        }
        _ => out.push("<EABI version unrecognised>".to_string()),
    }
    rest &= !EF_ARM_EABIMASK;

    if rest != 0 {
        out.push(format!("<unknown flags {rest:#x}>"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_flags() {
        assert_eq!(
            arm_flags(0x0500_0400),
            vec!["Version5 EABI".to_string(), "hard-float ABI".to_string()]
        );
        assert_eq!(arm_flags(0x0400_0000), vec!["Version4 EABI".to_string()]);
        assert_eq!(
            arm_flags(0x0500_0001),
            vec!["Version5 EABI".to_string(), "<unknown flags 0x1>".to_string()]
        );
    }
}
