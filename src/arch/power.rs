//! 32 and 64-bit PowerPC.

use super::{name_table, MachineCaps, RelocEffect, EM_PPC, EM_PPC64};

static PPC_RELOCS: &[(u32, &str)] = name_table! {
    R_PPC_NONE = 0,
    R_PPC_ADDR32 = 1,
    R_PPC_ADDR24 = 2,
    R_PPC_ADDR16 = 3,
    R_PPC_ADDR16_LO = 4,
    R_PPC_ADDR16_HI = 5,
    R_PPC_ADDR16_HA = 6,
    R_PPC_ADDR14 = 7,
    R_PPC_ADDR14_BRTAKEN = 8,
    R_PPC_ADDR14_BRNTAKEN = 9,
    R_PPC_REL24 = 10,
    R_PPC_REL14 = 11,
    R_PPC_REL14_BRTAKEN = 12,
    R_PPC_REL14_BRNTAKEN = 13,
    R_PPC_GOT16 = 14,
    R_PPC_GOT16_LO = 15,
    R_PPC_GOT16_HI = 16,
    R_PPC_GOT16_HA = 17,
    R_PPC_PLTREL24 = 18,
    R_PPC_COPY = 19,
    R_PPC_GLOB_DAT = 20,
    R_PPC_JMP_SLOT = 21,
    R_PPC_RELATIVE = 22,
    R_PPC_LOCAL24PC = 23,
    R_PPC_UADDR32 = 24,
    R_PPC_UADDR16 = 25,
    R_PPC_REL32 = 26,
    R_PPC_PLT32 = 27,
    R_PPC_PLTREL32 = 28,
    R_PPC_PLT16_LO = 29,
    R_PPC_PLT16_HI = 30,
    R_PPC_PLT16_HA = 31,
    R_PPC_SDAREL16 = 32,
    R_PPC_SECTOFF = 33,
    R_PPC_SECTOFF_LO = 34,
    R_PPC_SECTOFF_HI = 35,
    R_PPC_SECTOFF_HA = 36,
    R_PPC_TLS = 67,
    R_PPC_DTPMOD32 = 68,
    R_PPC_TPREL16 = 69,
    R_PPC_TPREL32 = 73,
    R_PPC_DTPREL32 = 78,
    R_PPC_IRELATIVE = 248,
    R_PPC_REL16 = 249,
    R_PPC_REL16_LO = 250,
    R_PPC_REL16_HI = 251,
    R_PPC_REL16_HA = 252,
    R_PPC_GNU_VTINHERIT = 253,
    R_PPC_GNU_VTENTRY = 254,
};

static PPC64_RELOCS: &[(u32, &str)] = name_table! {
    R_PPC64_NONE = 0,
    R_PPC64_ADDR32 = 1,
    R_PPC64_ADDR24 = 2,
    R_PPC64_ADDR16 = 3,
    R_PPC64_ADDR16_LO = 4,
    R_PPC64_ADDR16_HI = 5,
    R_PPC64_ADDR16_HA = 6,
    R_PPC64_ADDR14 = 7,
    R_PPC64_REL24 = 10,
    R_PPC64_REL14 = 11,
    R_PPC64_GOT16 = 14,
    R_PPC64_GOT16_LO = 15,
    R_PPC64_GOT16_HI = 16,
    R_PPC64_GOT16_HA = 17,
    R_PPC64_COPY = 19,
    R_PPC64_GLOB_DAT = 20,
    R_PPC64_JMP_SLOT = 21,
    R_PPC64_RELATIVE = 22,
    R_PPC64_UADDR32 = 24,
    R_PPC64_UADDR16 = 25,
    R_PPC64_REL32 = 26,
    R_PPC64_PLT32 = 27,
    R_PPC64_PLTREL32 = 28,
    R_PPC64_SECTOFF = 33,
    R_PPC64_ADDR30 = 37,
    R_PPC64_ADDR64 = 38,
    R_PPC64_ADDR16_HIGHER = 39,
    R_PPC64_ADDR16_HIGHERA = 40,
    R_PPC64_ADDR16_HIGHEST = 41,
    R_PPC64_ADDR16_HIGHESTA = 42,
    R_PPC64_UADDR64 = 43,
    R_PPC64_REL64 = 44,
    R_PPC64_PLT64 = 45,
    R_PPC64_PLTREL64 = 46,
    R_PPC64_TOC16 = 47,
    R_PPC64_TOC16_LO = 48,
    R_PPC64_TOC16_HI = 49,
    R_PPC64_TOC16_HA = 50,
    R_PPC64_TOC = 51,
    R_PPC64_ADDR16_DS = 56,
    R_PPC64_ADDR16_LO_DS = 57,
    R_PPC64_GOT16_DS = 58,
    R_PPC64_GOT16_LO_DS = 59,
    R_PPC64_TOC16_DS = 63,
    R_PPC64_TOC16_LO_DS = 64,
    R_PPC64_TLS = 67,
    R_PPC64_DTPMOD64 = 68,
    R_PPC64_TPREL64 = 73,
    R_PPC64_DTPREL64 = 78,
    R_PPC64_TLSGD = 107,
    R_PPC64_TLSLD = 108,
    R_PPC64_TOCSAVE = 109,
    R_PPC64_ENTRY = 118,
    R_PPC64_PCREL34 = 132,
    R_PPC64_GOT_PCREL34 = 133,
    R_PPC64_JMP_IREL = 247,
    R_PPC64_IRELATIVE = 248,
    R_PPC64_REL16 = 249,
    R_PPC64_REL16_LO = 250,
    R_PPC64_REL16_HI = 251,
    R_PPC64_REL16_HA = 252,
    R_PPC64_GNU_VTINHERIT = 253,
    R_PPC64_GNU_VTENTRY = 254,
};

pub static PPC: MachineCaps = MachineCaps {
    machines: &[EM_PPC],
    relocs: PPC_RELOCS,
    reloc_effects: &[
        (0, RelocEffect::None),
        (1, RelocEffect::Abs(4)),
        (26, RelocEffect::PcRel(4)),
    ],
    section_types: &[],
    segment_types: &[],
    dynamic_tags: name_table! {
        PPC_GOT = 0x7000_0000,
        PPC_OPT = 0x7000_0001,
    },
    symbol_types: &[],
    section_indices: &[],
    symbol_other: &[],
    decode_flags: ppc_flags,
    quirks: &[],
};

pub static PPC64: MachineCaps = MachineCaps {
    machines: &[EM_PPC64],
    relocs: PPC64_RELOCS,
    reloc_effects: &[
        (0, RelocEffect::None),
        (1, RelocEffect::Abs(4)),
        (26, RelocEffect::PcRel(4)),
        (38, RelocEffect::Abs(8)),
        (44, RelocEffect::PcRel(8)),
    ],
    section_types: &[],
    segment_types: &[],
    dynamic_tags: name_table! {
        PPC64_GLINK = 0x7000_0000,
        PPC64_OPD = 0x7000_0001,
        PPC64_OPDSZ = 0x7000_0002,
        PPC64_OPT = 0x7000_0003,
    },
    symbol_types: &[],
    section_indices: &[],
    symbol_other: &[],
    decode_flags: ppc64_flags,
    quirks: &[],
};

const EF_PPC_EMB: u32 = 0x8000_0000;
const EF_PPC_RELOCATABLE: u32 = 0x0001_0000;
const EF_PPC_RELOCATABLE_LIB: u32 = 0x0000_8000;
const EF_PPC64_ABI: u32 = 0x3;

fn ppc_flags(flags: u32) -> Vec<String> {
    let mut out = Vec::new();
    for (bit, name) in [
        (EF_PPC_EMB, "emb"),
        (EF_PPC_RELOCATABLE, "relocatable"),
        (EF_PPC_RELOCATABLE_LIB, "relocatable-lib"),
    ] {
        if flags & bit != 0 {
            out.push(name.to_string());
        }
    }
    out
}

fn ppc64_flags(flags: u32) -> Vec<String> {
    match flags & EF_PPC64_ABI {
        0 => Vec::new(),
        abi => vec![format!("abiv{abi}")],
    }
}
