//! # Per-machine capability registry
//!
//! Everything whose meaning depends on `e_machine` (relocation type names,
//! which relocations can be simulated when dumping a section, processor
//! specific section/segment/dynamic/symbol values, `e_flags` bits) is
//! described by one static [`MachineCaps`] per architecture family, looked up
//! through [`caps`]. Unknown machines get [`GENERIC`], under which every
//! processor-specific value is shown generically.

/// Build a `&[(value, "NAME")]` table from `NAME = value` pairs.
macro_rules! name_table {
    ($($name:ident = $value:expr),* $(,)?) => {
        &[$(($value, stringify!($name))),*]
    };
}
pub(crate) use name_table;

mod arm;
mod hppa;
mod ia64;
mod loongarch;
mod m68k;
pub mod machines;
mod mips;
mod power;
mod riscv;
mod s390;
mod sparc;
mod tic6x;
mod x86;

// ============================================================================
// Machine numbers (e_machine)
// ============================================================================

pub const EM_NONE: u16 = 0;
pub const EM_SPARC: u16 = 2;
pub const EM_386: u16 = 3;
pub const EM_68K: u16 = 4;
pub const EM_MIPS: u16 = 8;
pub const EM_MIPS_RS3_LE: u16 = 10;
pub const EM_PARISC: u16 = 15;
pub const EM_SPARC32PLUS: u16 = 18;
pub const EM_PPC: u16 = 20;
pub const EM_PPC64: u16 = 21;
pub const EM_S390: u16 = 22;
pub const EM_ARM: u16 = 40;
pub const EM_SPARCV9: u16 = 43;
pub const EM_IA_64: u16 = 50;
pub const EM_X86_64: u16 = 62;
pub const EM_TI_C6000: u16 = 140;
pub const EM_AARCH64: u16 = 183;
pub const EM_RISCV: u16 = 243;
pub const EM_LOONGARCH: u16 = 258;
pub const EM_S390_OLD: u16 = 0xa390;

// ============================================================================
// OS/ABI values that quirks are keyed on
// ============================================================================

pub const ELFOSABI_HPUX: u8 = 1;
pub const ELFOSABI_GNU: u8 = 3;
pub const ELFOSABI_FREEBSD: u8 = 9;

// ============================================================================
// Types
// ============================================================================

/// What applying a relocation does to the bytes it targets, for the purpose
/// of a simulated "dump with relocations applied".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocEffect {
    /// A no-op relocation (R_*_NONE, relaxation markers).
    None,
    /// Store `S + A` in the given number of bytes.
    Abs(u8),
    /// Store `S + A - P` in the given number of bytes.
    PcRel(u8),
    /// Add `S + A` to the bytes in place.
    Add(u8),
    /// Subtract `S + A` from the bytes in place.
    Sub(u8),
    /// Overwrite the bytes with `S + A` (linker-relaxation bookkeeping).
    Set(u8),
    /// Add to the low six bits of a byte.
    Add6,
    /// Subtract from the low six bits of a byte.
    Sub6,
    /// Overwrite the low six bits of a byte.
    Set6,
    /// Overwrite a ULEB128 value in place, keeping its encoded length.
    UlebSet,
    /// Add to a ULEB128 value in place.
    UlebAdd,
    /// Subtract from a ULEB128 value in place.
    UlebSub,
}

/// A named exception to the general decoding rules, keyed by `(machine, osabi)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quirk {
    /// A PT_DYNAMIC segment with zero file size is normal and not reported.
    ZeroSizeDynamicSegment,
}

/// Everything machine-specific the decoders need.
pub struct MachineCaps {
    /// `e_machine` values this entry describes.
    pub machines: &'static [u16],

    /// Relocation type names.
    pub relocs: &'static [(u32, &'static str)],

    /// Relocation types that can be simulated, and how.
    pub reloc_effects: &'static [(u32, RelocEffect)],

    /// Names for section types in `[SHT_LOPROC, SHT_HIPROC]`.
    pub section_types: &'static [(u32, &'static str)],

    /// Names for segment types in `[PT_LOPROC, PT_HIPROC]`.
    pub segment_types: &'static [(u32, &'static str)],

    /// Names for dynamic tags in `[DT_LOPROC, DT_HIPROC]`.
    pub dynamic_tags: &'static [(u64, &'static str)],

    /// Names for symbol types in `[STT_LOPROC, STT_HIPROC]`.
    pub symbol_types: &'static [(u8, &'static str)],

    /// Names for reserved section indices in `[SHN_LOPROC, SHN_HIPROC]`
    /// (and the machine-specific uses of `SHN_LORESERVE` ranges).
    pub section_indices: &'static [(u16, &'static str)],

    /// Processor-specific `st_other` bits: `(mask, name)`.
    pub symbol_other: &'static [(u8, &'static str)],

    /// Decode `e_flags` into display fragments.
    pub decode_flags: fn(u32) -> Vec<String>,

    /// Named `(osabi, quirk)` exceptions.
    pub quirks: &'static [(u8, Quirk)],
}

impl MachineCaps {
    pub fn reloc_name(&self, rtype: u32) -> Option<&'static str> {
        lookup(self.relocs, rtype)
    }

    /// How to simulate `rtype`; `None` if it is not one of the safe kinds.
    pub fn reloc_effect(&self, rtype: u32) -> Option<RelocEffect> {
        self.reloc_effects
            .iter()
            .find(|(t, _)| *t == rtype)
            .map(|&(_, e)| e)
    }

    pub fn has_quirk(&self, osabi: u8, quirk: Quirk) -> bool {
        self.quirks.iter().any(|&(o, q)| o == osabi && q == quirk)
    }
}

/// Find the name for `value` in a name table.
pub fn lookup<T: PartialEq + Copy>(
    table: &'static [(T, &'static str)],
    value: T,
) -> Option<&'static str> {
    table.iter().find(|(v, _)| *v == value).map(|&(_, n)| n)
}

fn no_flags(_: u32) -> Vec<String> {
    Vec::new()
}

/// Capabilities of a machine with no dedicated tables.
pub static GENERIC: MachineCaps = MachineCaps {
    machines: &[],
    relocs: &[],
    reloc_effects: &[],
    section_types: &[],
    segment_types: &[],
    dynamic_tags: &[],
    symbol_types: &[],
    section_indices: &[],
    symbol_other: &[],
    decode_flags: no_flags,
    quirks: &[],
};

static REGISTRY: &[&MachineCaps] = &[
    &x86::X86_64,
    &x86::I386,
    &arm::AARCH64,
    &arm::ARM,
    &riscv::RISCV,
    &loongarch::LOONGARCH,
    &mips::MIPS,
    &power::PPC,
    &power::PPC64,
    &sparc::SPARC,
    &s390::S390,
    &ia64::IA64,
    &hppa::HPPA,
    &tic6x::TIC6X,
    &m68k::M68K,
];

/// Look up the capabilities for `machine`.
pub fn caps(machine: u16) -> &'static MachineCaps {
    REGISTRY
        .iter()
        .copied()
        .find(|c| c.machines.contains(&machine))
        .unwrap_or(&GENERIC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        assert_eq!(caps(EM_X86_64).reloc_name(8), Some("R_X86_64_RELATIVE"));
        assert_eq!(caps(EM_386).reloc_name(1), Some("R_386_32"));
        assert_eq!(caps(EM_AARCH64).reloc_name(1027), Some("R_AARCH64_RELATIVE"));
        assert_eq!(caps(EM_SPARCV9).reloc_name(32), Some("R_SPARC_64"));
        assert_eq!(caps(EM_S390_OLD).reloc_name(22), Some("R_390_64"));
        assert!(std::ptr::eq(caps(0x1234), &GENERIC));
        assert_eq!(caps(0x1234).reloc_name(1), None);
    }

    #[test]
    fn test_tables_have_no_duplicate_values() {
        for c in REGISTRY {
            let mut seen: Vec<u32> = c.relocs.iter().map(|&(v, _)| v).collect();
            seen.sort_unstable();
            let before = seen.len();
            seen.dedup();
            assert_eq!(before, seen.len(), "duplicate relocation in {:?}", c.machines);
        }
    }

    #[test]
    fn test_effects_are_named() {
        for c in REGISTRY {
            for &(t, _) in c.reloc_effects {
                assert!(c.reloc_name(t).is_some(), "unnamed effect {t} in {:?}", c.machines);
            }
        }
    }

    #[test]
    fn test_hpux_quirk_is_scoped() {
        let hppa = caps(EM_PARISC);
        assert!(hppa.has_quirk(ELFOSABI_HPUX, Quirk::ZeroSizeDynamicSegment));
        assert!(!hppa.has_quirk(ELFOSABI_GNU, Quirk::ZeroSizeDynamicSegment));
        assert!(!caps(EM_X86_64).has_quirk(ELFOSABI_HPUX, Quirk::ZeroSizeDynamicSegment));
    }

    #[test]
    fn test_riscv_relaxation_effects() {
        let rv = caps(EM_RISCV);
        assert_eq!(rv.reloc_effect(35), Some(RelocEffect::Add(4)));
        assert_eq!(rv.reloc_effect(39), Some(RelocEffect::Sub(4)));
        assert_eq!(rv.reloc_effect(53), Some(RelocEffect::Set6));
        assert_eq!(rv.reloc_effect(61), Some(RelocEffect::UlebSub));
        assert_eq!(rv.reloc_effect(18), None);
    }
}
