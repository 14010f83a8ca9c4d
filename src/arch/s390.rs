//! s390 and s390x.

use super::{name_table, MachineCaps, RelocEffect, EM_S390, EM_S390_OLD};

static S390_RELOCS: &[(u32, &str)] = name_table! {
    R_390_NONE = 0,
    R_390_8 = 1,
    R_390_12 = 2,
    R_390_16 = 3,
    R_390_32 = 4,
    R_390_PC32 = 5,
    R_390_GOT12 = 6,
    R_390_GOT32 = 7,
    R_390_PLT32 = 8,
    R_390_COPY = 9,
    R_390_GLOB_DAT = 10,
    R_390_JMP_SLOT = 11,
    R_390_RELATIVE = 12,
    R_390_GOTOFF32 = 13,
    R_390_GOTPC = 14,
    R_390_GOT16 = 15,
    R_390_PC16 = 16,
    R_390_PC16DBL = 17,
    R_390_PLT16DBL = 18,
    R_390_PC32DBL = 19,
    R_390_PLT32DBL = 20,
    R_390_GOTPCDBL = 21,
    R_390_64 = 22,
    R_390_PC64 = 23,
    R_390_GOT64 = 24,
    R_390_PLT64 = 25,
    R_390_GOTENT = 26,
    R_390_GOTOFF16 = 27,
    R_390_GOTOFF64 = 28,
    R_390_GOTPLT12 = 29,
    R_390_GOTPLT16 = 30,
    R_390_GOTPLT32 = 31,
    R_390_GOTPLT64 = 32,
    R_390_GOTPLTENT = 33,
    R_390_PLTOFF16 = 34,
    R_390_PLTOFF32 = 35,
    R_390_PLTOFF64 = 36,
    R_390_TLS_LOAD = 37,
    R_390_TLS_GDCALL = 38,
    R_390_TLS_LDCALL = 39,
    R_390_TLS_GD32 = 40,
    R_390_TLS_GD64 = 41,
    R_390_TLS_GOTIE12 = 42,
    R_390_TLS_GOTIE32 = 43,
    R_390_TLS_GOTIE64 = 44,
    R_390_TLS_LDM32 = 45,
    R_390_TLS_LDM64 = 46,
    R_390_TLS_IE32 = 47,
    R_390_TLS_IE64 = 48,
    R_390_TLS_IEENT = 49,
    R_390_TLS_LE32 = 50,
    R_390_TLS_LE64 = 51,
    R_390_TLS_LDO32 = 52,
    R_390_TLS_LDO64 = 53,
    R_390_TLS_DTPMOD = 54,
    R_390_TLS_DTPOFF = 55,
    R_390_TLS_TPOFF = 56,
    R_390_20 = 57,
    R_390_GOT20 = 58,
    R_390_GOTPLT20 = 59,
    R_390_TLS_GOTIE20 = 60,
    R_390_IRELATIVE = 61,
    R_390_PC12DBL = 62,
    R_390_PLT12DBL = 63,
    R_390_PC24DBL = 64,
    R_390_PLT24DBL = 65,
    R_390_GNU_VTINHERIT = 250,
    R_390_GNU_VTENTRY = 251,
};

pub static S390: MachineCaps = MachineCaps {
    machines: &[EM_S390, EM_S390_OLD],
    relocs: S390_RELOCS,
    reloc_effects: &[
        (0, RelocEffect::None),
        (1, RelocEffect::Abs(1)),
        (3, RelocEffect::Abs(2)),
        (4, RelocEffect::Abs(4)),
        (22, RelocEffect::Abs(8)),
        (5, RelocEffect::PcRel(4)),
        (16, RelocEffect::PcRel(2)),
        (23, RelocEffect::PcRel(8)),
    ],
    section_types: &[],
    segment_types: name_table! { S390_PGSTE = 0x7000_0000 },
    dynamic_tags: &[],
    symbol_types: &[],
    section_indices: &[],
    symbol_other: &[],
    decode_flags: s390_flags,
    quirks: &[],
};

const EF_S390_HIGH_GPRS: u32 = 0x0000_0001;

fn s390_flags(flags: u32) -> Vec<String> {
    if flags & EF_S390_HIGH_GPRS != 0 {
        vec!["highgprs".to_string()]
    } else {
        Vec::new()
    }
}
