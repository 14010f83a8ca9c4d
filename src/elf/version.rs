//! # Symbol Versioning
//!
//! GNU version definitions (`SHT_GNU_verdef`), version requirements
//! (`SHT_GNU_verneed`) and the per-symbol version index array
//! (`SHT_GNU_versym`).
//!
//! Definitions and requirements are chains linked by byte offsets relative
//! to each record. They are materialized up front into plain vectors. A walk
//! stops at the declared count, at a record that would not fit in the data,
//! or at a link that fails to move forward.

use crate::diag::Diagnostics;
use crate::utils::Codec;

use super::strtab::{resolve_or_placeholder, StringTable};

/// Version index of a local symbol.
pub const VER_NDX_LOCAL: u16 = 0;

/// Version index of an unversioned global symbol.
pub const VER_NDX_GLOBAL: u16 = 1;

/// Versym bit marking a hidden (non-default) version.
pub const VERSYM_HIDDEN: u16 = 0x8000;

/// Verdef flag: the definition names the object itself.
pub const VER_FLG_BASE: u16 = 0x1;
pub const VER_FLG_WEAK: u16 = 0x2;
pub const VER_FLG_INFO: u16 = 0x4;

const VERDEF_SIZE: usize = 20;
const VERDAUX_SIZE: usize = 8;
const VERNEED_SIZE: usize = 16;
const VERNAUX_SIZE: usize = 16;

// ============================================================================
// Types
// ============================================================================

/// One version definition and its names (the first is the version itself,
/// the rest are its parents).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDef {
    pub offset: usize,
    pub version: u16,
    pub flags: u16,
    pub index: u16,
    pub hash: u32,
    pub names: Vec<VersionName>,
}

/// An auxiliary name record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionName {
    pub offset: usize,
    pub name: String,
}

/// The versions required from one dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionNeed {
    pub offset: usize,
    pub version: u16,
    pub file: String,
    pub entries: Vec<VersionNeedAux>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionNeedAux {
    pub offset: usize,
    pub hash: u32,
    pub flags: u16,

    /// The version index symbols use to refer to this requirement.
    pub other: u16,
    pub name: String,
}

/// Display names of `vd_flags` / `vna_flags`.
pub fn flag_names(flags: u16) -> String {
    if flags == 0 {
        return "none".to_string();
    }
    let mut names = Vec::new();
    if flags & VER_FLG_BASE != 0 {
        names.push("BASE".to_string());
    }
    if flags & VER_FLG_WEAK != 0 {
        names.push("WEAK".to_string());
    }
    if flags & VER_FLG_INFO != 0 {
        names.push("INFO".to_string());
    }
    let unknown = flags & !(VER_FLG_BASE | VER_FLG_WEAK | VER_FLG_INFO);
    if unknown != 0 {
        names.push(format!("<unknown: {unknown:x}>"));
    }
    names.join(" | ")
}

// ============================================================================
// Chain walking
// ============================================================================

/// The offset reached by following `next` from `current`, if it makes
/// forward progress and leaves room for a `record`-byte entry.
///
/// Offsets are 32-bit quantities in the file format, so the addition wraps
/// as it would there; a wrapped link lands behind `current` and is refused.
fn follow(current: usize, next: u32, record: usize, limit: usize) -> Option<usize> {
    let target = (current as u32).wrapping_add(next) as usize;
    (target > current && target.checked_add(record).is_some_and(|end| end <= limit))
        .then_some(target)
}

/// Walk a version definition chain of up to `count` records.
pub fn walk_verdef(
    data: &[u8],
    codec: Codec,
    count: u64,
    strings: Option<&StringTable<'_>>,
    diag: &Diagnostics,
) -> Vec<VersionDef> {
    let mut defs = Vec::new();
    let mut offset = 0usize;
    let cap = count.min((data.len() / VERDEF_SIZE) as u64);
    if count > cap {
        diag.warn(format_args!(
            "version definition count {count} exceeds what the section can hold"
        ));
    }

    for n in 0..cap {
        let Some(record) = data.get(offset..offset + VERDEF_SIZE) else {
            diag.warn(format_args!("version definition {n} at {offset:#x} is truncated"));
            break;
        };
        let field16 = |at| codec.u16_at(record, at).unwrap_or(0);
        let field32 = |at| codec.u32_at(record, at).unwrap_or(0);
        let (aux_count, aux, next) = (field16(6), field32(12), field32(16));

        let mut names = Vec::new();
        let mut aux_offset = follow(offset, aux, VERDAUX_SIZE, data.len());
        for j in 0..aux_count {
            let Some(at) = aux_offset else {
                diag.warn(format_args!(
                    "version definition {n}: auxiliary entry {j} lies outside the section"
                ));
                break;
            };
            let name_offset = codec.u32_at(data, at).unwrap_or(u32::MAX);
            let aux_next = codec.u32_at(data, at + 4).unwrap_or(0);
            names.push(VersionName {
                offset: at,
                name: resolve_or_placeholder(strings, u64::from(name_offset)).into_owned(),
            });
            if j + 1 < aux_count {
                aux_offset = follow(at, aux_next, VERDAUX_SIZE, data.len());
            }
        }

        defs.push(VersionDef {
            offset,
            version: field16(0),
            flags: field16(2),
            index: field16(4),
            hash: field32(8),
            names,
        });

        if n + 1 < cap {
            match follow(offset, next, VERDEF_SIZE, data.len()) {
                Some(target) => offset = target,
                None => {
                    diag.warn(format_args!(
                        "version definition {n} at {offset:#x} has an invalid next link {next:#x}; the rest of the chain is malformed"
                    ));
                    break;
                }
            }
        }
    }
    defs
}

/// Walk a version requirement chain of up to `count` records.
pub fn walk_verneed(
    data: &[u8],
    codec: Codec,
    count: u64,
    strings: Option<&StringTable<'_>>,
    diag: &Diagnostics,
) -> Vec<VersionNeed> {
    let mut needs = Vec::new();
    let mut offset = 0usize;
    let cap = count.min((data.len() / VERNEED_SIZE) as u64);
    if count > cap {
        diag.warn(format_args!(
            "version requirement count {count} exceeds what the section can hold"
        ));
    }

    for n in 0..cap {
        let Some(record) = data.get(offset..offset + VERNEED_SIZE) else {
            diag.warn(format_args!("version requirement {n} at {offset:#x} is truncated"));
            break;
        };
        let version = codec.u16_at(record, 0).unwrap_or(0);
        let aux_count = codec.u16_at(record, 2).unwrap_or(0);
        let file = codec.u32_at(record, 4).unwrap_or(u32::MAX);
        let aux = codec.u32_at(record, 8).unwrap_or(0);
        let next = codec.u32_at(record, 12).unwrap_or(0);

        let mut entries = Vec::new();
        let mut aux_offset = follow(offset, aux, VERNAUX_SIZE, data.len());
        for j in 0..aux_count {
            let Some(at) = aux_offset else {
                diag.warn(format_args!(
                    "version requirement {n}: auxiliary entry {j} lies outside the section"
                ));
                break;
            };
            let Some(entry) = data.get(at..at + VERNAUX_SIZE) else {
                break;
            };
            let name_offset = codec.u32_at(entry, 8).unwrap_or(u32::MAX);
            entries.push(VersionNeedAux {
                offset: at,
                hash: codec.u32_at(entry, 0).unwrap_or(0),
                flags: codec.u16_at(entry, 4).unwrap_or(0),
                other: codec.u16_at(entry, 6).unwrap_or(0),
                name: resolve_or_placeholder(strings, u64::from(name_offset)).into_owned(),
            });
            if j + 1 < aux_count {
                let aux_next = codec.u32_at(entry, 12).unwrap_or(0);
                aux_offset = follow(at, aux_next, VERNAUX_SIZE, data.len());
            }
        }

        needs.push(VersionNeed {
            offset,
            version,
            file: resolve_or_placeholder(strings, u64::from(file)).into_owned(),
            entries,
        });

        if n + 1 < cap {
            match follow(offset, next, VERNEED_SIZE, data.len()) {
                Some(target) => offset = target,
                None => {
                    diag.warn(format_args!(
                        "version requirement {n} at {offset:#x} has an invalid next link {next:#x}; the rest of the chain is malformed"
                    ));
                    break;
                }
            }
        }
    }
    needs
}

/// Decode a versym array into one index per symbol.
pub fn parse_versym(data: &[u8], codec: Codec) -> Vec<u16> {
    data.chunks_exact(2)
        .filter_map(|c| codec.u16_at(c, 0).ok())
        .collect()
}

// ============================================================================
// Resolution
// ============================================================================

/// The version attached to one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolVersion {
    pub name: String,
    pub hidden: bool,

    /// True when the version comes from a requirement (the symbol is imported).
    pub needed: bool,
}

/// Both version chains of an object, for resolving versym indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionTables {
    pub defs: Vec<VersionDef>,
    pub needs: Vec<VersionNeed>,
    pub versym: Vec<u16>,
}

impl VersionTables {
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty() && self.needs.is_empty()
    }

    fn find_def(&self, index: u16) -> Option<SymbolVersion> {
        self.defs
            .iter()
            .find(|d| d.index == index)
            .and_then(|d| d.names.first())
            .map(|n| SymbolVersion {
                name: n.name.clone(),
                hidden: false,
                needed: false,
            })
    }

    fn find_need(&self, index: u16) -> Option<SymbolVersion> {
        self.needs
            .iter()
            .flat_map(|n| n.entries.iter())
            .find(|a| a.other == index)
            .map(|a| SymbolVersion {
                name: a.name.clone(),
                hidden: false,
                needed: true,
            })
    }

    /// Name of version index `raw` (hidden bit included), for listings.
    pub fn index_name(&self, raw: u16) -> Option<String> {
        match raw & !VERSYM_HIDDEN {
            VER_NDX_LOCAL => Some("*local*".to_string()),
            VER_NDX_GLOBAL => Some("*global*".to_string()),
            index => self
                .find_def(index)
                .or_else(|| self.find_need(index))
                .map(|v| v.name),
        }
    }

    /// The version of symbol `symbol`, searching definitions first for a
    /// defined symbol and requirements first for an undefined one, and then
    /// the other chain.
    pub fn symbol_version(&self, symbol: usize, defined: bool) -> Option<SymbolVersion> {
        let raw = *self.versym.get(symbol)?;
        let index = raw & !VERSYM_HIDDEN;
        if index == VER_NDX_LOCAL || index == VER_NDX_GLOBAL {
            return None;
        }
        let found = if defined {
            self.find_def(index).or_else(|| self.find_need(index))
        } else {
            self.find_need(index).or_else(|| self.find_def(index))
        };
        found.map(|v| SymbolVersion {
            hidden: raw & VERSYM_HIDDEN != 0,
            ..v
        })
    }
}

/// `name@@VERSION` for a default definition, `name@VERSION` otherwise.
pub fn decorate(name: &str, version: Option<&SymbolVersion>) -> String {
    match version {
        None => name.to_string(),
        Some(v) if v.hidden || v.needed => format!("{name}@{}", v.name),
        Some(v) => format!("{name}@@{}", v.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{ElfClass, Endianness};

    const LE: Codec = Codec::new(ElfClass::Elf64, Endianness::Little);
    const STRINGS: &[u8] = b"\0libc.so.6\0GLIBC_2.2.5\0GLIBC_2.34\0libfoo.so\0FOO_1\0";

    fn verdef(buf: &mut Vec<u8>, index: u16, flags: u16, name: u32, next: u32) {
        let at = buf.len();
        buf.resize(at + VERDEF_SIZE + VERDAUX_SIZE, 0);
        LE.put_u16(buf, at, 1).unwrap();
        LE.put_u16(buf, at + 2, flags).unwrap();
        LE.put_u16(buf, at + 4, index).unwrap();
        LE.put_u16(buf, at + 6, 1).unwrap();
        LE.put_u32(buf, at + 12, VERDEF_SIZE as u32).unwrap();
        LE.put_u32(buf, at + 16, next).unwrap();
        LE.put_u32(buf, at + VERDEF_SIZE, name).unwrap();
    }

    fn verneed(buf: &mut Vec<u8>, file: u32, names: &[(u32, u16)], next: u32) {
        let at = buf.len();
        buf.resize(at + VERNEED_SIZE + names.len() * VERNAUX_SIZE, 0);
        LE.put_u16(buf, at, 1).unwrap();
        LE.put_u16(buf, at + 2, names.len() as u16).unwrap();
        LE.put_u32(buf, at + 4, file).unwrap();
        LE.put_u32(buf, at + 8, VERNEED_SIZE as u32).unwrap();
        LE.put_u32(buf, at + 12, next).unwrap();
        for (i, &(name, other)) in names.iter().enumerate() {
            let aux = at + VERNEED_SIZE + i * VERNAUX_SIZE;
            LE.put_u16(buf, aux + 6, other).unwrap();
            LE.put_u32(buf, aux + 8, name).unwrap();
            let next = if i + 1 < names.len() { VERNAUX_SIZE as u32 } else { 0 };
            LE.put_u32(buf, aux + 12, next).unwrap();
        }
    }

    #[test]
    fn test_walk_verneed() {
        let strings = StringTable::new(STRINGS);
        let diag = Diagnostics::new();
        let mut buf = Vec::new();
        verneed(&mut buf, 1, &[(11, 2), (23, 3)], 48);
        verneed(&mut buf, 34, &[(44, 4)], 0);
        let needs = walk_verneed(&buf, LE, 2, Some(&strings), &diag);
        assert_eq!(needs.len(), 2);
        assert_eq!(needs[0].file, "libc.so.6");
        assert_eq!(needs[0].entries[1].name, "GLIBC_2.34");
        assert_eq!(needs[1].entries[0].name, "FOO_1");
        assert!(diag.is_empty());
    }

    #[test]
    fn test_cyclic_chain_terminates() {
        let strings = StringTable::new(STRINGS);
        let diag = Diagnostics::new();
        let mut buf = Vec::new();
        verdef(&mut buf, 1, VER_FLG_BASE, 34, 28);
        // Second record links back to the first.
        verdef(&mut buf, 2, 0, 11, (-28i32) as u32);
        verdef(&mut buf, 3, 0, 23, 0);
        let defs = walk_verdef(&buf, LE, 10, Some(&strings), &diag);
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[1].names[0].name, "GLIBC_2.2.5");
        assert!(diag.mentions("malformed"));

        let diag = Diagnostics::new();
        let mut buf = Vec::new();
        verdef(&mut buf, 1, 0, 34, 0);
        verdef(&mut buf, 2, 0, 11, 0);
        let defs = walk_verdef(&buf, LE, 2, Some(&strings), &diag);
        assert_eq!(defs.len(), 1);
        assert!(diag.mentions("invalid next link 0x0"));
    }

    #[test]
    fn test_resolution_searches_both_chains() {
        let strings = StringTable::new(STRINGS);
        let diag = Diagnostics::new();
        let mut defs = Vec::new();
        verdef(&mut defs, 1, VER_FLG_BASE, 34, 28);
        verdef(&mut defs, 2, 0, 44, 0);
        let mut needs = Vec::new();
        verneed(&mut needs, 1, &[(11, 3)], 0);

        let tables = VersionTables {
            defs: walk_verdef(&defs, LE, 2, Some(&strings), &diag),
            needs: walk_verneed(&needs, LE, 1, Some(&strings), &diag),
            versym: vec![0, 1, 2, 3, 0x8002, 3],
        };
        assert_eq!(tables.symbol_version(1, true), None);
        let v = tables.symbol_version(2, true).unwrap();
        assert_eq!(decorate("foo", Some(&v)), "foo@@FOO_1");
        let v = tables.symbol_version(3, false).unwrap();
        assert_eq!(decorate("puts", Some(&v)), "puts@GLIBC_2.2.5");
        let v = tables.symbol_version(4, true).unwrap();
        assert!(v.hidden);
        assert_eq!(decorate("old", Some(&v)), "old@FOO_1");
        // Defined symbol whose index only appears among the requirements.
        assert_eq!(tables.symbol_version(5, true).unwrap().name, "GLIBC_2.2.5");
        assert_eq!(tables.index_name(0), Some("*local*".to_string()));
        assert_eq!(tables.index_name(0x8003), Some("GLIBC_2.2.5".to_string()));
        assert_eq!(flag_names(VER_FLG_BASE | VER_FLG_WEAK), "BASE | WEAK");
        assert_eq!(flag_names(0), "none");
    }
}
