//! RISC-V.

use super::{name_table, MachineCaps, RelocEffect, EM_RISCV};

static RISCV_RELOCS: &[(u32, &str)] = name_table! {
    R_RISCV_NONE = 0,
    R_RISCV_32 = 1,
    R_RISCV_64 = 2,
    R_RISCV_RELATIVE = 3,
    R_RISCV_COPY = 4,
    R_RISCV_JUMP_SLOT = 5,
    R_RISCV_TLS_DTPMOD32 = 6,
    R_RISCV_TLS_DTPMOD64 = 7,
    R_RISCV_TLS_DTPREL32 = 8,
    R_RISCV_TLS_DTPREL64 = 9,
    R_RISCV_TLS_TPREL32 = 10,
    R_RISCV_TLS_TPREL64 = 11,
    R_RISCV_TLSDESC = 12,
    R_RISCV_BRANCH = 16,
    R_RISCV_JAL = 17,
    R_RISCV_CALL = 18,
    R_RISCV_CALL_PLT = 19,
    R_RISCV_GOT_HI20 = 20,
    R_RISCV_TLS_GOT_HI20 = 21,
    R_RISCV_TLS_GD_HI20 = 22,
    R_RISCV_PCREL_HI20 = 23,
    R_RISCV_PCREL_LO12_I = 24,
    R_RISCV_PCREL_LO12_S = 25,
    R_RISCV_HI20 = 26,
    R_RISCV_LO12_I = 27,
    R_RISCV_LO12_S = 28,
    R_RISCV_TPREL_HI20 = 29,
    R_RISCV_TPREL_LO12_I = 30,
    R_RISCV_TPREL_LO12_S = 31,
    R_RISCV_TPREL_ADD = 32,
    R_RISCV_ADD8 = 33,
    R_RISCV_ADD16 = 34,
    R_RISCV_ADD32 = 35,
    R_RISCV_ADD64 = 36,
    R_RISCV_SUB8 = 37,
    R_RISCV_SUB16 = 38,
    R_RISCV_SUB32 = 39,
    R_RISCV_SUB64 = 40,
    R_RISCV_GOT32_PCREL = 41,
    R_RISCV_ALIGN = 43,
    R_RISCV_RVC_BRANCH = 44,
    R_RISCV_RVC_JUMP = 45,
    R_RISCV_RELAX = 51,
    R_RISCV_SUB6 = 52,
    R_RISCV_SET6 = 53,
    R_RISCV_SET8 = 54,
    R_RISCV_SET16 = 55,
    R_RISCV_SET32 = 56,
    R_RISCV_32_PCREL = 57,
    R_RISCV_IRELATIVE = 58,
    R_RISCV_PLT32 = 59,
    R_RISCV_SET_ULEB128 = 60,
    R_RISCV_SUB_ULEB128 = 61,
    R_RISCV_TLSDESC_HI20 = 62,
    R_RISCV_TLSDESC_LOAD_LO12 = 63,
    R_RISCV_TLSDESC_ADD_LO12 = 64,
    R_RISCV_TLSDESC_CALL = 65,
};

pub static RISCV: MachineCaps = MachineCaps {
    machines: &[EM_RISCV],
    relocs: RISCV_RELOCS,
    reloc_effects: &[
        (0, RelocEffect::None),
        (1, RelocEffect::Abs(4)),
        (2, RelocEffect::Abs(8)),
        (33, RelocEffect::Add(1)),
        (34, RelocEffect::Add(2)),
        (35, RelocEffect::Add(4)),
        (36, RelocEffect::Add(8)),
        (37, RelocEffect::Sub(1)),
        (38, RelocEffect::Sub(2)),
        (39, RelocEffect::Sub(4)),
        (40, RelocEffect::Sub(8)),
        (43, RelocEffect::None),
        (51, RelocEffect::None),
        (52, RelocEffect::Sub6),
        (53, RelocEffect::Set6),
        (54, RelocEffect::Set(1)),
        (55, RelocEffect::Set(2)),
        (56, RelocEffect::Set(4)),
        (57, RelocEffect::PcRel(4)),
        (60, RelocEffect::UlebSet),
        (61, RelocEffect::UlebSub),
    ],
    section_types: name_table! { RISCV_ATTRIBUTES = 0x7000_0003 },
    segment_types: name_table! { RISCV_ATTRIBUTES = 0x7000_0003 },
    dynamic_tags: name_table! { RISCV_VARIANT_CC = 0x7000_0001 },
    symbol_types: &[],
    section_indices: &[],
    symbol_other: name_table! { VARIANT_CC = 0x80 },
    decode_flags: riscv_flags,
    quirks: &[],
};

const EF_RISCV_RVC: u32 = 0x0001;
const EF_RISCV_FLOAT_ABI: u32 = 0x0006;
const EF_RISCV_RVE: u32 = 0x0008;
const EF_RISCV_TSO: u32 = 0x0010;

fn riscv_flags(flags: u32) -> Vec<String> {
    let mut out = Vec::new();
    if flags & EF_RISCV_RVC != 0 {
        out.push("RVC".to_string());
    }
    if flags & EF_RISCV_RVE != 0 {
        out.push("RVE".to_string());
    }
    if flags & EF_RISCV_TSO != 0 {
        out.push("TSO".to_string());
    }
    out.push(
        match flags & EF_RISCV_FLOAT_ABI {
            0 => "soft-float ABI",
            2 => "single-float ABI",
            4 => "double-float ABI",
            _ => "quad-float ABI",
        }
        .to_string(),
    );
    let unknown = flags & !(EF_RISCV_RVC | EF_RISCV_FLOAT_ABI | EF_RISCV_RVE | EF_RISCV_TSO);
    if unknown != 0 {
        out.push(format!("<unknown flags {unknown:#x}>"));
    }
    out
}
