//! Itanium.

use super::{name_table, MachineCaps, RelocEffect, EM_IA_64};

static IA64_RELOCS: &[(u32, &str)] = name_table! {
    R_IA64_NONE = 0x00,
    R_IA64_IMM14 = 0x21,
    R_IA64_IMM22 = 0x22,
    R_IA64_IMM64 = 0x23,
    R_IA64_DIR32MSB = 0x24,
    R_IA64_DIR32LSB = 0x25,
    R_IA64_DIR64MSB = 0x26,
    R_IA64_DIR64LSB = 0x27,
    R_IA64_GPREL22 = 0x2a,
    R_IA64_GPREL64I = 0x2b,
    R_IA64_GPREL32MSB = 0x2c,
    R_IA64_GPREL32LSB = 0x2d,
    R_IA64_GPREL64MSB = 0x2e,
    R_IA64_GPREL64LSB = 0x2f,
    R_IA64_LTOFF22 = 0x32,
    R_IA64_LTOFF64I = 0x33,
    R_IA64_PLTOFF22 = 0x3a,
    R_IA64_PLTOFF64I = 0x3b,
    R_IA64_PLTOFF64MSB = 0x3e,
    R_IA64_PLTOFF64LSB = 0x3f,
    R_IA64_FPTR64I = 0x43,
    R_IA64_FPTR32MSB = 0x44,
    R_IA64_FPTR32LSB = 0x45,
    R_IA64_FPTR64MSB = 0x46,
    R_IA64_FPTR64LSB = 0x47,
    R_IA64_PCREL60B = 0x48,
    R_IA64_PCREL21B = 0x49,
    R_IA64_PCREL21M = 0x4a,
    R_IA64_PCREL21F = 0x4b,
    R_IA64_PCREL32MSB = 0x4c,
    R_IA64_PCREL32LSB = 0x4d,
    R_IA64_PCREL64MSB = 0x4e,
    R_IA64_PCREL64LSB = 0x4f,
    R_IA64_LTOFF_FPTR22 = 0x52,
    R_IA64_LTOFF_FPTR64I = 0x53,
    R_IA64_SEGREL32MSB = 0x5c,
    R_IA64_SEGREL32LSB = 0x5d,
    R_IA64_SEGREL64MSB = 0x5e,
    R_IA64_SEGREL64LSB = 0x5f,
    R_IA64_SECREL32MSB = 0x64,
    R_IA64_SECREL32LSB = 0x65,
    R_IA64_SECREL64MSB = 0x66,
    R_IA64_SECREL64LSB = 0x67,
    R_IA64_REL32MSB = 0x6c,
    R_IA64_REL32LSB = 0x6d,
    R_IA64_REL64MSB = 0x6e,
    R_IA64_REL64LSB = 0x6f,
    R_IA64_LTV32MSB = 0x74,
    R_IA64_LTV32LSB = 0x75,
    R_IA64_LTV64MSB = 0x76,
    R_IA64_LTV64LSB = 0x77,
    R_IA64_IPLTMSB = 0x80,
    R_IA64_IPLTLSB = 0x81,
    R_IA64_COPY = 0x84,
    R_IA64_LTOFF22X = 0x86,
    R_IA64_LDXMOV = 0x87,
    R_IA64_TPREL14 = 0x91,
    R_IA64_TPREL22 = 0x92,
    R_IA64_TPREL64I = 0x93,
    R_IA64_TPREL64MSB = 0x96,
    R_IA64_TPREL64LSB = 0x97,
    R_IA64_DTPMOD64MSB = 0xa6,
    R_IA64_DTPMOD64LSB = 0xa7,
    R_IA64_DTPREL64MSB = 0xb6,
    R_IA64_DTPREL64LSB = 0xb7,
};

pub static IA64: MachineCaps = MachineCaps {
    machines: &[EM_IA_64],
    relocs: IA64_RELOCS,
    reloc_effects: &[
        (0x00, RelocEffect::None),
        (0x24, RelocEffect::Abs(4)),
        (0x25, RelocEffect::Abs(4)),
        (0x26, RelocEffect::Abs(8)),
        (0x27, RelocEffect::Abs(8)),
        (0x4d, RelocEffect::PcRel(4)),
        (0x4f, RelocEffect::PcRel(8)),
    ],
    section_types: name_table! {
        IA_64_EXT = 0x7000_0000,
        IA_64_UNWIND = 0x7000_0001,
    },
    segment_types: name_table! {
        IA_64_ARCHEXT = 0x7000_0000,
        IA_64_UNWIND = 0x7000_0001,
    },
    dynamic_tags: name_table! {
        IA_64_PLT_RESERVE = 0x7000_0000,
        IA_64_VMS_SUBTYPE = 0x6000_0000,
    },
    symbol_types: &[],
    section_indices: name_table! { ANSI_COM = 0xff00 },
    symbol_other: &[],
    decode_flags: ia64_flags,
    quirks: &[],
};

const EF_IA_64_TRAPNIL: u32 = 0x0000_0001;
const EF_IA_64_EXT: u32 = 0x0000_0004;
const EF_IA_64_BE: u32 = 0x0000_0008;
const EF_IA_64_ABI64: u32 = 0x0000_0010;
const EF_IA_64_REDUCEDFP: u32 = 0x0000_0020;
const EF_IA_64_CONS_GP: u32 = 0x0000_0040;
const EF_IA_64_NOFUNCDESC_CONS_GP: u32 = 0x0000_0080;
const EF_IA_64_ABSOLUTE: u32 = 0x0000_0100;
const EF_IA_64_ARCH: u32 = 0xff00_0000;

fn ia64_flags(flags: u32) -> Vec<String> {
    let mut out = Vec::new();
    out.push(
        if flags & EF_IA_64_ABI64 != 0 {
            "64-bit"
        } else {
            "32-bit"
        }
        .to_string(),
    );
    for (bit, name) in [
        (EF_IA_64_TRAPNIL, "trapnil"),
        (EF_IA_64_EXT, "ext"),
        (EF_IA_64_BE, "big endian"),
        (EF_IA_64_REDUCEDFP, "reduced fp model"),
        (EF_IA_64_CONS_GP, "constant gp"),
        (EF_IA_64_NOFUNCDESC_CONS_GP, "no function descriptors, constant gp"),
        (EF_IA_64_ABSOLUTE, "absolute"),
    ] {
        if flags & bit != 0 {
            out.push(name.to_string());
        }
    }
    if flags & EF_IA_64_ARCH == 0x0100_0000 {
        out.push("IA-64".to_string());
    }
    out
}
