//! MIPS (both byte orders, 32 and 64-bit).

use super::{name_table, MachineCaps, RelocEffect, EM_MIPS, EM_MIPS_RS3_LE};

static MIPS_RELOCS: &[(u32, &str)] = name_table! {
    R_MIPS_NONE = 0,
    R_MIPS_16 = 1,
    R_MIPS_32 = 2,
    R_MIPS_REL32 = 3,
    R_MIPS_26 = 4,
    R_MIPS_HI16 = 5,
    R_MIPS_LO16 = 6,
    R_MIPS_GPREL16 = 7,
    R_MIPS_LITERAL = 8,
    R_MIPS_GOT16 = 9,
    R_MIPS_PC16 = 10,
    R_MIPS_CALL16 = 11,
    R_MIPS_GPREL32 = 12,
    R_MIPS_SHIFT5 = 16,
    R_MIPS_SHIFT6 = 17,
    R_MIPS_64 = 18,
    R_MIPS_GOT_DISP = 19,
    R_MIPS_GOT_PAGE = 20,
    R_MIPS_GOT_OFST = 21,
    R_MIPS_GOT_HI16 = 22,
    R_MIPS_GOT_LO16 = 23,
    R_MIPS_SUB = 24,
    R_MIPS_INSERT_A = 25,
    R_MIPS_INSERT_B = 26,
    R_MIPS_DELETE = 27,
    R_MIPS_HIGHER = 28,
    R_MIPS_HIGHEST = 29,
    R_MIPS_CALL_HI16 = 30,
    R_MIPS_CALL_LO16 = 31,
    R_MIPS_SCN_DISP = 32,
    R_MIPS_REL16 = 33,
    R_MIPS_ADD_IMMEDIATE = 34,
    R_MIPS_PJUMP = 35,
    R_MIPS_RELGOT = 36,
    R_MIPS_JALR = 37,
    R_MIPS_TLS_DTPMOD32 = 38,
    R_MIPS_TLS_DTPREL32 = 39,
    R_MIPS_TLS_DTPMOD64 = 40,
    R_MIPS_TLS_DTPREL64 = 41,
    R_MIPS_TLS_GD = 42,
    R_MIPS_TLS_LDM = 43,
    R_MIPS_TLS_DTPREL_HI16 = 44,
    R_MIPS_TLS_DTPREL_LO16 = 45,
    R_MIPS_TLS_GOTTPREL = 46,
    R_MIPS_TLS_TPREL32 = 47,
    R_MIPS_TLS_TPREL64 = 48,
    R_MIPS_TLS_TPREL_HI16 = 49,
    R_MIPS_TLS_TPREL_LO16 = 50,
    R_MIPS_GLOB_DAT = 51,
    R_MIPS_PC21_S2 = 60,
    R_MIPS_PC26_S2 = 61,
    R_MIPS_PC18_S3 = 62,
    R_MIPS_PC19_S2 = 63,
    R_MIPS_PCHI16 = 64,
    R_MIPS_PCLO16 = 65,
    R_MIPS_COPY = 126,
    R_MIPS_JUMP_SLOT = 127,
    R_MIPS_PC32 = 248,
    R_MIPS_EH = 249,
    R_MIPS_GNU_REL16_S2 = 250,
    R_MIPS_GNU_VTINHERIT = 253,
    R_MIPS_GNU_VTENTRY = 254,
};

pub static MIPS: MachineCaps = MachineCaps {
    machines: &[EM_MIPS, EM_MIPS_RS3_LE],
    relocs: MIPS_RELOCS,
    reloc_effects: &[
        (0, RelocEffect::None),
        (1, RelocEffect::Abs(2)),
        (2, RelocEffect::Abs(4)),
        (18, RelocEffect::Abs(8)),
        (248, RelocEffect::PcRel(4)),
    ],
    section_types: name_table! {
        MIPS_LIBLIST = 0x7000_0000,
        MIPS_MSYM = 0x7000_0001,
        MIPS_CONFLICT = 0x7000_0002,
        MIPS_GPTAB = 0x7000_0003,
        MIPS_UCODE = 0x7000_0004,
        MIPS_DEBUG = 0x7000_0005,
        MIPS_REGINFO = 0x7000_0006,
        MIPS_OPTIONS = 0x7000_000d,
        MIPS_DWARF = 0x7000_001e,
        MIPS_ABIFLAGS = 0x7000_002a,
        MIPS_XHASH = 0x7000_002b,
    },
    segment_types: name_table! {
        MIPS_REGINFO = 0x7000_0000,
        MIPS_RTPROC = 0x7000_0001,
        MIPS_OPTIONS = 0x7000_0002,
        MIPS_ABIFLAGS = 0x7000_0003,
    },
    dynamic_tags: name_table! {
        MIPS_RLD_VERSION = 0x7000_0001,
        MIPS_TIME_STAMP = 0x7000_0002,
        MIPS_ICHECKSUM = 0x7000_0003,
        MIPS_IVERSION = 0x7000_0004,
        MIPS_FLAGS = 0x7000_0005,
        MIPS_BASE_ADDRESS = 0x7000_0006,
        MIPS_CONFLICT = 0x7000_0008,
        MIPS_LIBLIST = 0x7000_0009,
        MIPS_LOCAL_GOTNO = 0x7000_000a,
        MIPS_CONFLICTNO = 0x7000_000b,
        MIPS_LIBLISTNO = 0x7000_0010,
        MIPS_SYMTABNO = 0x7000_0011,
        MIPS_UNREFEXTNO = 0x7000_0012,
        MIPS_GOTSYM = 0x7000_0013,
        MIPS_HIPAGENO = 0x7000_0014,
        MIPS_RLD_MAP = 0x7000_0016,
        MIPS_OPTIONS = 0x7000_0029,
        MIPS_PLTGOT = 0x7000_0032,
        MIPS_RWPLT = 0x7000_0034,
        MIPS_RLD_MAP_REL = 0x7000_0035,
        MIPS_XHASH = 0x7000_0036,
    },
    symbol_types: &[],
    section_indices: name_table! {
        ANSI_COM = 0xff00,
        TEXT = 0xff01,
        DATA = 0xff02,
        SCOM = 0xff03,
        SUND = 0xff04,
    },
    symbol_other: name_table! {
        OPTIONAL = 0x04,
        MICROMIPS = 0x80,
    },
    decode_flags: mips_flags,
    quirks: &[],
};

const EF_MIPS_NOREORDER: u32 = 0x0000_0001;
const EF_MIPS_PIC: u32 = 0x0000_0002;
const EF_MIPS_CPIC: u32 = 0x0000_0004;
const EF_MIPS_XGOT: u32 = 0x0000_0008;
const EF_MIPS_UCODE: u32 = 0x0000_0010;
const EF_MIPS_ABI2: u32 = 0x0000_0020;
const EF_MIPS_32BITMODE: u32 = 0x0000_0100;
const EF_MIPS_FP64: u32 = 0x0000_0200;
const EF_MIPS_NAN2008: u32 = 0x0000_0400;
const EF_MIPS_ABI: u32 = 0x0000_f000;
const EF_MIPS_ARCH: u32 = 0xf000_0000;

fn mips_flags(flags: u32) -> Vec<String> {
    let mut out = Vec::new();
    for (bit, name) in [
        (EF_MIPS_NOREORDER, "noreorder"),
        (EF_MIPS_PIC, "pic"),
        (EF_MIPS_CPIC, "cpic"),
        (EF_MIPS_XGOT, "xgot"),
        (EF_MIPS_UCODE, "ugen_reserved"),
        (EF_MIPS_ABI2, "abi2"),
        (EF_MIPS_32BITMODE, "32bitmode"),
        (EF_MIPS_FP64, "fp64"),
        (EF_MIPS_NAN2008, "nan2008"),
    ] {
        if flags & bit != 0 {
            out.push(name.to_string());
        }
    }

    match flags & EF_MIPS_ABI {
        0x1000 => out.push("o32".to_string()),
        0x2000 => out.push("o64".to_string()),
        0x3000 => out.push("eabi32".to_string()),
        0x4000 => out.push("eabi64".to_string()),
        0 => {}
        _ => out.push("unknown ABI".to_string()),
    }

    out.push(
        match (flags & EF_MIPS_ARCH) >> 28 {
            0 => "mips1",
            1 => "mips2",
            2 => "mips3",
            3 => "mips4",
            4 => "mips5",
            5 => "mips32",
            6 => "mips64",
            7 => "mips32r2",
            8 => "mips64r2",
            9 => "mips32r6",
            10 => "mips64r6",
            _ => "unknown ISA",
        }
        .to_string(),
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mips_flags() {
        let flags = mips_flags(0x7000_1007);
        assert_eq!(flags, ["noreorder", "pic", "cpic", "o32", "mips32r2"]);
    }
}
