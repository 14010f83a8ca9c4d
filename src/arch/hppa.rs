//! PA-RISC.

use super::{name_table, MachineCaps, Quirk, RelocEffect, ELFOSABI_HPUX, EM_PARISC};

static HPPA_RELOCS: &[(u32, &str)] = name_table! {
    R_PARISC_NONE = 0,
    R_PARISC_DIR32 = 1,
    R_PARISC_DIR21L = 2,
    R_PARISC_DIR17R = 3,
    R_PARISC_DIR17F = 4,
    R_PARISC_DIR14R = 6,
    R_PARISC_PCREL32 = 9,
    R_PARISC_PCREL21L = 10,
    R_PARISC_PCREL17R = 11,
    R_PARISC_PCREL17F = 12,
    R_PARISC_PCREL14R = 14,
    R_PARISC_DPREL21L = 18,
    R_PARISC_DPREL14R = 22,
    R_PARISC_GPREL21L = 26,
    R_PARISC_GPREL14R = 30,
    R_PARISC_LTOFF21L = 34,
    R_PARISC_LTOFF14R = 38,
    R_PARISC_SECREL32 = 41,
    R_PARISC_SEGBASE = 48,
    R_PARISC_SEGREL32 = 49,
    R_PARISC_PLTOFF21L = 50,
    R_PARISC_PLTOFF14R = 54,
    R_PARISC_LTOFF_FPTR32 = 57,
    R_PARISC_LTOFF_FPTR21L = 58,
    R_PARISC_LTOFF_FPTR14R = 62,
    R_PARISC_FPTR64 = 64,
    R_PARISC_PLABEL32 = 65,
    R_PARISC_PLABEL21L = 66,
    R_PARISC_PLABEL14R = 70,
    R_PARISC_PCREL64 = 72,
    R_PARISC_PCREL22F = 74,
    R_PARISC_DIR64 = 80,
    R_PARISC_DIR14WR = 83,
    R_PARISC_DIR14DR = 84,
    R_PARISC_DIR16F = 85,
    R_PARISC_DIR16WF = 86,
    R_PARISC_DIR16DF = 87,
    R_PARISC_GPREL64 = 88,
    R_PARISC_LTOFF64 = 96,
    R_PARISC_SECREL64 = 105,
    R_PARISC_SEGREL64 = 113,
    R_PARISC_PLTOFF14WR = 115,
    R_PARISC_PLTOFF14DR = 116,
    R_PARISC_LTOFF_FPTR64 = 120,
    R_PARISC_COPY = 128,
    R_PARISC_IPLT = 129,
    R_PARISC_EPLT = 130,
    R_PARISC_TPREL32 = 153,
    R_PARISC_TPREL21L = 154,
    R_PARISC_TPREL14R = 158,
    R_PARISC_TPREL64 = 216,
    R_PARISC_TLS_DTPMOD32 = 242,
    R_PARISC_TLS_DTPMOD64 = 243,
    R_PARISC_TLS_DTPOFF32 = 244,
    R_PARISC_TLS_DTPOFF64 = 245,
};

pub static HPPA: MachineCaps = MachineCaps {
    machines: &[EM_PARISC],
    relocs: HPPA_RELOCS,
    reloc_effects: &[
        (0, RelocEffect::None),
        (1, RelocEffect::Abs(4)),
        (80, RelocEffect::Abs(8)),
        (9, RelocEffect::PcRel(4)),
        (72, RelocEffect::PcRel(8)),
    ],
    section_types: name_table! {
        PARISC_EXT = 0x7000_0000,
        PARISC_UNWIND = 0x7000_0001,
        PARISC_DOC = 0x7000_0002,
        PARISC_ANNOT = 0x7000_0003,
        PARISC_DLKM = 0x7000_0004,
    },
    segment_types: name_table! {
        PARISC_ARCHEXT = 0x7000_0000,
        PARISC_UNWIND = 0x7000_0001,
        HP_TLS = 0x6000_0000,
        HP_CORE_NONE = 0x6000_0001,
        HP_CORE_VERSION = 0x6000_0002,
        HP_CORE_KERNEL = 0x6000_0003,
        HP_CORE_COMM = 0x6000_0004,
        HP_CORE_PROC = 0x6000_0005,
        HP_CORE_LOADABLE = 0x6000_0006,
        HP_CORE_STACK = 0x6000_0007,
        HP_CORE_SHM = 0x6000_0008,
        HP_CORE_MMF = 0x6000_0009,
        HP_PARALLEL = 0x6000_0010,
        HP_FASTBIND = 0x6000_0011,
        HP_OPT_ANNOT = 0x6000_0012,
        HP_HSL_ANNOT = 0x6000_0013,
        HP_STACK = 0x6000_0014,
    },
    dynamic_tags: name_table! {
        HP_LOAD_MAP = 0x6000_0000,
        HP_DLD_FLAGS = 0x6000_0001,
        HP_DLD_HOOK = 0x6000_0002,
        HP_UX10_INIT = 0x6000_0003,
        HP_UX10_INITSZ = 0x6000_0004,
        HP_PREINIT = 0x6000_0005,
        HP_PREINITSZ = 0x6000_0006,
        HP_NEEDED = 0x6000_0007,
        HP_TIME_STAMP = 0x6000_0008,
        HP_CHECKSUM = 0x6000_0009,
        HP_GST_SIZE = 0x6000_000a,
        HP_GST_VERSION = 0x6000_000b,
        HP_GST_HASHVAL = 0x6000_000c,
        HP_EPLTREL = 0x6000_000d,
        HP_EPLTRELSZ = 0x6000_000e,
        HP_FILTERED = 0x6000_000f,
        HP_FILTER_TLS = 0x6000_0010,
        HP_COMPAT_FILTERED = 0x6000_0011,
        HP_LAZYLOAD = 0x6000_0012,
        HP_BIND_NOW_COUNT = 0x6000_0013,
        PLT = 0x6000_0014,
        PLT_SIZE = 0x6000_0015,
        DLT = 0x6000_0016,
        DLT_SIZE = 0x6000_0017,
    },
    symbol_types: name_table! { PARISC_MILLI = 13 },
    section_indices: &[],
    symbol_other: &[],
    decode_flags: hppa_flags,
    quirks: &[(ELFOSABI_HPUX, Quirk::ZeroSizeDynamicSegment)],
};

const EF_PARISC_TRAPNIL: u32 = 0x0001_0000;
const EF_PARISC_EXT: u32 = 0x0002_0000;
const EF_PARISC_LSB: u32 = 0x0004_0000;
const EF_PARISC_WIDE: u32 = 0x0008_0000;
const EF_PARISC_NO_KABP: u32 = 0x0010_0000;
const EF_PARISC_LAZYSWAP: u32 = 0x0040_0000;
const EF_PARISC_ARCH: u32 = 0x0000_ffff;

fn hppa_flags(flags: u32) -> Vec<String> {
    let mut out = Vec::new();
    match flags & EF_PARISC_ARCH {
        0x020b => out.push("PA-RISC 1.0".to_string()),
        0x0210 => out.push("PA-RISC 1.1".to_string()),
        0x0214 => out.push("PA-RISC 2.0".to_string()),
        _ => {}
    }
    for (bit, name) in [
        (EF_PARISC_TRAPNIL, "trapnil"),
        (EF_PARISC_EXT, "ext"),
        (EF_PARISC_LSB, "lsb"),
        (EF_PARISC_WIDE, "wide"),
        (EF_PARISC_NO_KABP, "no kabp"),
        (EF_PARISC_LAZYSWAP, "lazyswap"),
    ] {
        if flags & bit != 0 {
            out.push(name.to_string());
        }
    }
    out
}
