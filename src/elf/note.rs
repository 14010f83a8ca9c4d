//! # Notes
//!
//! The generic `(namesz, descsz, type)` record walk over SHT_NOTE sections
//! and PT_NOTE segments, plus the owner-specific description interpreters.
//! Interpretation is chosen by the owner name first and the type second,
//! since every vendor reuses the same small type numbers.

use crate::arch::{EM_386, EM_AARCH64, EM_X86_64};
use crate::diag::Diagnostics;
use crate::utils::{align_up, Codec, Cursor};

use super::symbol::{Symbol, SymbolIndex};

/// Size of the fixed note header.
const NOTE_HEADER_SIZE: u64 = 12;

/// One note record; `desc` borrows the file bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note<'a> {
    /// Offset of the record within the note area.
    pub offset: u64,
    pub name: String,
    /// The raw owner bytes, without the terminating NUL.
    pub owner: &'a [u8],
    pub note_type: u32,
    pub desc: &'a [u8],
}

/// Walk the notes in `data`, whose records are padded to `align` (4 or 8).
///
/// A record whose name or description does not fit in what remains is
/// reported and ends the walk; earlier records are still returned.
pub fn walk_notes<'a>(data: &'a [u8], codec: Codec, align: u64, diag: &Diagnostics) -> Vec<Note<'a>> {
    let align = match align {
        4 | 8 => align,
        0 | 1 | 2 => 4,
        other => {
            diag.warn(format_args!(
                "Corrupt note: alignment {other} is not 4 or 8, assuming 4"
            ));
            4
        }
    };
    let mut notes = Vec::new();
    let mut pos = 0u64;
    let len = data.len() as u64;

    while len - pos >= NOTE_HEADER_SIZE {
        let at = pos as usize;
        let (Ok(namesz), Ok(descsz), Ok(note_type)) = (
            codec.u32_at(data, at),
            codec.u32_at(data, at + 4),
            codec.u32_at(data, at + 8),
        ) else {
            break;
        };
        let remaining = len - pos;
        let name_end = NOTE_HEADER_SIZE + u64::from(namesz);
        let desc_start = align_up(name_end, align).unwrap_or(u64::MAX);
        let desc_end = desc_start.saturating_add(u64::from(descsz));
        if name_end > remaining || desc_end > remaining {
            diag.warn(format_args!(
                "Corrupt note at offset {pos:#x}: namesz {namesz:#x}, descsz {descsz:#x} exceed the {remaining:#x} remaining bytes"
            ));
            break;
        }

        let name_bytes = &data[at + NOTE_HEADER_SIZE as usize..at + name_end as usize];
        let name_bytes = name_bytes.strip_suffix(&[0]).unwrap_or(name_bytes);
        notes.push(Note {
            offset: pos,
            name: String::from_utf8_lossy(name_bytes).into_owned(),
            owner: name_bytes,
            note_type,
            desc: &data[at + desc_start as usize..at + desc_end as usize],
        });

        // Padding after the last description may be absent.
        let next = align_up(desc_end, align).unwrap_or(u64::MAX);
        if next >= remaining {
            break;
        }
        pos += next;
    }
    notes
}

// ============================================================================
// Interpretation
// ============================================================================

/// What the interpreters need to know about the containing object.
#[derive(Debug, Clone, Copy)]
pub struct NoteContext<'s> {
    pub codec: Codec,
    pub machine: u16,
    pub is_core: bool,
    /// Symbols by address, for naming the ranges build-attribute notes cover.
    pub symbols: Option<&'s SymbolIndex>,
}

/// A note's type name and its decoded description lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDescription {
    /// Decoded owner, when the raw owner is an encoded value.
    pub owner: Option<String>,
    pub type_name: String,
    pub lines: Vec<String>,
}

/// Describe `note`. `ranges` carries build-attribute state from one note to
/// the next, so callers keep a single value for the whole object.
pub fn describe(note: &Note<'_>, cx: &NoteContext<'_>, ranges: &mut BuildRanges) -> NoteDescription {
    let t = note.note_type;
    if note.owner.starts_with(b"GA")
        && matches!(t, NT_GNU_BUILD_ATTRIBUTE_OPEN | NT_GNU_BUILD_ATTRIBUTE_FUNC)
    {
        let owner = build_attribute_owner(note.owner);
        let lines = owner
            .as_ref()
            .and_then(|_| describe_build_range(note, cx, ranges))
            .unwrap_or_else(|| vec![format!("<corrupt {} note>", note.name)]);
        return NoteDescription {
            owner,
            type_name: generic_type_name(t),
            lines,
        };
    }

    let (type_name, lines) = match note.name.as_str() {
        "GNU" => (gnu_type_name(t), describe_gnu(note, cx)),
        "FreeBSD" if !cx.is_core => (freebsd_type_name(t), describe_freebsd(note, cx)),
        "NetBSD" => (netbsd_type_name(t), describe_netbsd(note, cx)),
        "PaX" if t == 3 => ("NT_NETBSD_PAX (PaX <version>)".to_string(), describe_pax(note, cx)),
        "OpenBSD" => (openbsd_type_name(t), Some(Vec::new())),
        "Go" if t == 4 => (
            "GO BUILDID".to_string(),
            Some(vec![format!("Build ID: {}", String::from_utf8_lossy(note.desc))]),
        ),
        "stapsdt" if t == 3 => (
            "NT_STAPSDT (SystemTap probe descriptors)".to_string(),
            describe_stapsdt(note, cx),
        ),
        name if name.starts_with("NetBSD-CORE") => (netbsd_core_type_name(t), Some(Vec::new())),
        _ if cx.is_core => (core_type_name(t), describe_core(note, cx)),
        _ => (generic_type_name(t), Some(Vec::new())),
    };
    let lines = lines.unwrap_or_else(|| vec![format!("<corrupt {} note>", note.name)]);
    NoteDescription {
        owner: None,
        type_name,
        lines,
    }
}

type Lines = Option<Vec<String>>;

fn unknown(t: u32) -> String {
    format!("Unknown note type: ({t:#010x})")
}

fn generic_type_name(t: u32) -> String {
    match t {
        1 => "NT_VERSION (version)".to_string(),
        2 => "NT_ARCH (architecture)".to_string(),
        NT_GNU_BUILD_ATTRIBUTE_OPEN => "OPEN".to_string(),
        NT_GNU_BUILD_ATTRIBUTE_FUNC => "func".to_string(),
        _ => unknown(t),
    }
}

// ----------------------------------------------------------------------------
// Build attributes ("GA" owners)
// ----------------------------------------------------------------------------

const NT_GNU_BUILD_ATTRIBUTE_OPEN: u32 = 0x100;
const NT_GNU_BUILD_ATTRIBUTE_FUNC: u32 = 0x101;

/// Address ranges of the most recent OPEN and FUNC build notes, as
/// `(start, end)`. A note with an empty description reuses the range of
/// the previous note of its kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildRanges {
    open: (u64, u64),
    func: (u64, u64),
}

/// Decode an owner of the form `GA<kind><attribute><value>`.
///
/// `None` when the kind is unknown or a numeric value does not fit in
/// 64 bits.
fn build_attribute_owner(owner: &[u8]) -> Option<String> {
    let rest = owner.strip_prefix(b"GA")?;
    let (&kind, rest) = rest.split_first()?;
    if !matches!(kind, b'$' | b'*' | b'+' | b'!') {
        return None;
    }
    let (&attr, value) = rest.split_first()?;
    let (label, value): (String, &[u8]) = match attr {
        1 => ("<version>".into(), value),
        2 => ("<stack prot>".into(), value),
        3 => ("<relro>".into(), value),
        4 => ("<stack size>".into(), value),
        5 => ("<tool>".into(), value),
        6 => ("<ABI>".into(), value),
        7 => ("<PIC>".into(), value),
        8 => ("<short enum>".into(), value),
        b if b.is_ascii_graphic() || b == b' ' => {
            // A text attribute name runs up to its own NUL.
            let end = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
            (
                format!("{}:", String::from_utf8_lossy(&rest[..end])),
                rest.get(end + 1..).unwrap_or(&[]),
            )
        }
        b => (format!("<unknown:_{b}>"), value),
    };

    let shown = match kind {
        b'*' => {
            if value.len() > 8 {
                return None;
            }
            let n = value
                .iter()
                .rev()
                .fold(0u64, |acc, &b| (acc << 8) | u64::from(b));
            let decoded = match (attr, n) {
                (2, 0) => Some("off"),
                (2, 1) => Some("on"),
                (2, 2) => Some("all"),
                (2, 3) => Some("strong"),
                (2, 4) => Some("explicit"),
                (7, 0) => Some("static"),
                (7, 1) => Some("pic"),
                (7, 2) => Some("PIC"),
                (7, 3) => Some("pie"),
                (7, 4) => Some("PIE"),
                _ => None,
            };
            match decoded {
                Some(text) => text.to_string(),
                None if n > 10000 => format!("{n:#x}"),
                None => n.to_string(),
            }
        }
        b'$' => {
            let end = value.iter().position(|&b| b == 0).unwrap_or(value.len());
            String::from_utf8_lossy(&value[..end]).into_owned()
        }
        b'+' => "true".to_string(),
        _ => "false".to_string(),
    };
    Some(format!("GA{}{label}{shown}", kind as char))
}

/// The "Applies to region" line of an OPEN or FUNC note.
fn describe_build_range(note: &Note<'_>, cx: &NoteContext<'_>, ranges: &mut BuildRanges) -> Lines {
    let open = note.note_type == NT_GNU_BUILD_ATTRIBUTE_OPEN;
    let last = if open { &mut ranges.open } else { &mut ranges.func };
    let codec = cx.codec;
    let (start, mut end) = match note.desc.len() {
        0 => {
            let (start, end) = *last;
            return Some(vec![region(start, end, None)]);
        }
        8 => (
            u64::from(codec.u32_at(note.desc, 0).ok()?),
            u64::from(codec.u32_at(note.desc, 4).ok()?),
        ),
        16 => (codec.u64_at(note.desc, 0).ok()?, codec.u64_at(note.desc, 8).ok()?),
        n => return Some(vec![format!("<invalid description size: {n:#x}>")]),
    };

    let sym = cx.symbols.and_then(|index| {
        if open {
            index.at(start)
        } else {
            index.function_containing(start)
        }
    });
    if end == 0 {
        if let Some(s) = sym.filter(|s| s.size > 0) {
            end = start.wrapping_add(s.size);
        }
    }
    last.0 = start;
    if end != 0 {
        last.1 = end;
    }
    Some(vec![region(start, end, sym)])
}

fn region(start: u64, end: u64, sym: Option<&Symbol>) -> String {
    let mut line = format!("Applies to region from {start:#x}");
    if end != 0 {
        line.push_str(&format!(" to {end:#x}"));
    }
    if let Some(sym) = sym {
        line.push_str(&format!(" ({})", sym.name));
    }
    line
}

// ----------------------------------------------------------------------------
// GNU
// ----------------------------------------------------------------------------

const NT_GNU_ABI_TAG: u32 = 1;
const NT_GNU_HWCAP: u32 = 2;
const NT_GNU_BUILD_ID: u32 = 3;
const NT_GNU_GOLD_VERSION: u32 = 4;
const NT_GNU_PROPERTY_TYPE_0: u32 = 5;

fn gnu_type_name(t: u32) -> String {
    match t {
        NT_GNU_ABI_TAG => "NT_GNU_ABI_TAG (ABI version tag)".to_string(),
        NT_GNU_HWCAP => "NT_GNU_HWCAP (DSO-supplied software HWCAP info)".to_string(),
        NT_GNU_BUILD_ID => "NT_GNU_BUILD_ID (unique build ID bitstring)".to_string(),
        NT_GNU_GOLD_VERSION => "NT_GNU_GOLD_VERSION (gold version)".to_string(),
        NT_GNU_PROPERTY_TYPE_0 => "NT_GNU_PROPERTY_TYPE_0".to_string(),
        NT_GNU_BUILD_ATTRIBUTE_OPEN => "NT_GNU_BUILD_ATTRIBUTE_OPEN".to_string(),
        NT_GNU_BUILD_ATTRIBUTE_FUNC => "NT_GNU_BUILD_ATTRIBUTE_FUNC".to_string(),
        _ => unknown(t),
    }
}

fn describe_gnu(note: &Note<'_>, cx: &NoteContext) -> Lines {
    let codec = cx.codec;
    let mut c = Cursor::new(note.desc);
    match note.note_type {
        NT_GNU_ABI_TAG => {
            let os = match c.u32(codec)? {
                0 => "Linux".to_string(),
                1 => "Hurd".to_string(),
                2 => "Solaris".to_string(),
                3 => "FreeBSD".to_string(),
                4 => "NetBSD".to_string(),
                5 => "Syllable".to_string(),
                6 => "NaCl".to_string(),
                other => format!("Unknown ({other})"),
            };
            let (major, minor, sub) = (c.u32(codec)?, c.u32(codec)?, c.u32(codec)?);
            Some(vec![format!("OS: {os}, ABI: {major}.{minor}.{sub}")])
        }
        NT_GNU_BUILD_ID => Some(vec![format!("Build ID: {}", hex(note.desc))]),
        NT_GNU_GOLD_VERSION => Some(vec![format!(
            "Version: {}",
            String::from_utf8_lossy(note.desc.split(|&b| b == 0).next().unwrap_or(&[]))
        )]),
        NT_GNU_HWCAP => {
            let count = c.u32(codec)?;
            let mask = c.u32(codec)?;
            let mut lines = vec![format!(
                "Hardware Capabilities: num entries: {count}, enabled mask: {mask:x}"
            )];
            for _ in 0..count.min(note.desc.len() as u32) {
                let bit = c.u8()?;
                let name = c.cstr()?;
                lines.push(format!("{bit:>2}: {}", String::from_utf8_lossy(name)));
            }
            Some(lines)
        }
        NT_GNU_PROPERTY_TYPE_0 => Some(describe_properties(note.desc, cx)),
        _ => Some(Vec::new()),
    }
}

const GNU_PROPERTY_STACK_SIZE: u32 = 1;
const GNU_PROPERTY_NO_COPY_ON_PROTECTED: u32 = 2;
const GNU_PROPERTY_1_NEEDED: u32 = 0xb000_8000;
const GNU_PROPERTY_X86_FEATURE_1_AND: u32 = 0xc000_0002;
const GNU_PROPERTY_X86_ISA_1_NEEDED: u32 = 0xc000_8002;
const GNU_PROPERTY_X86_ISA_1_USED: u32 = 0xc001_0002;
const GNU_PROPERTY_X86_FEATURE_2_NEEDED: u32 = 0xc000_8001;
const GNU_PROPERTY_X86_FEATURE_2_USED: u32 = 0xc001_0001;
const GNU_PROPERTY_AARCH64_FEATURE_1_AND: u32 = 0xc000_0000;

fn bit_names(value: u32, names: &[(u32, &str)]) -> String {
    let mut out: Vec<String> = names
        .iter()
        .filter(|&&(bit, _)| value & bit != 0)
        .map(|&(_, n)| n.to_string())
        .collect();
    let known = names.iter().fold(0, |acc, &(bit, _)| acc | bit);
    if value & !known != 0 {
        out.push(format!("<unknown: {:x}>", value & !known));
    }
    if out.is_empty() {
        "<None>".to_string()
    } else {
        out.join(", ")
    }
}

/// Decode a `NT_GNU_PROPERTY_TYPE_0` array. Each property is padded to the
/// word size.
fn describe_properties(desc: &[u8], cx: &NoteContext) -> Vec<String> {
    let codec = cx.codec;
    let align = codec.word_size() as u64;
    let mut lines = Vec::new();
    let mut c = Cursor::new(desc);
    let x86 = cx.machine == EM_X86_64 || cx.machine == EM_386;

    while !c.is_empty() {
        let (Some(pr_type), Some(size)) = (c.u32(codec), c.u32(codec)) else {
            lines.push(format!("<corrupt GNU_PROPERTY_TYPE, size = {:#x}>", desc.len()));
            break;
        };
        let padded = align_up(u64::from(size), align).unwrap_or(u64::MAX);
        let Some(data) = c.bytes(size as usize) else {
            lines.push(format!("<corrupt length: {size:#x}>"));
            break;
        };
        let word = || codec.u32_at(data, 0).ok();
        let line = match pr_type {
            GNU_PROPERTY_STACK_SIZE => codec
                .uint_at(data, 0, data.len().min(8))
                .ok()
                .map(|v| format!("stack size: {v:#x}")),
            GNU_PROPERTY_NO_COPY_ON_PROTECTED => Some("no copy on protected".to_string()),
            GNU_PROPERTY_1_NEEDED => {
                word().map(|v| format!("1_needed: {}", bit_names(v, &[(1, "indirect external access")])))
            }
            GNU_PROPERTY_X86_FEATURE_1_AND if x86 => word().map(|v| {
                format!(
                    "x86 feature: {}",
                    bit_names(v, &[(1, "IBT"), (2, "SHSTK"), (4, "LAM_U48"), (8, "LAM_U57")])
                )
            }),
            GNU_PROPERTY_X86_ISA_1_NEEDED | GNU_PROPERTY_X86_ISA_1_USED if x86 => word().map(|v| {
                let kind = if pr_type == GNU_PROPERTY_X86_ISA_1_USED { "used" } else { "needed" };
                format!(
                    "x86 ISA {kind}: {}",
                    bit_names(
                        v,
                        &[(1, "x86-64-baseline"), (2, "x86-64-v2"), (4, "x86-64-v3"), (8, "x86-64-v4")]
                    )
                )
            }),
            GNU_PROPERTY_X86_FEATURE_2_NEEDED | GNU_PROPERTY_X86_FEATURE_2_USED if x86 => word().map(|v| {
                let kind = if pr_type == GNU_PROPERTY_X86_FEATURE_2_USED { "used" } else { "needed" };
                format!(
                    "x86 feature {kind}: {}",
                    bit_names(
                        v,
                        &[
                            (0x1, "x86"),
                            (0x2, "x87"),
                            (0x4, "MMX"),
                            (0x8, "XMM"),
                            (0x10, "YMM"),
                            (0x20, "ZMM"),
                            (0x40, "FXSR"),
                            (0x80, "XSAVE"),
                            (0x100, "XSAVEOPT"),
                            (0x200, "XSAVEC"),
                            (0x400, "TMM"),
                            (0x800, "MASK"),
                        ]
                    )
                )
            }),
            GNU_PROPERTY_AARCH64_FEATURE_1_AND if cx.machine == EM_AARCH64 => word().map(|v| {
                format!(
                    "AArch64 feature: {}",
                    bit_names(v, &[(1, "BTI"), (2, "PAC"), (4, "GCS")])
                )
            }),
            0xc000_0000..=0xdfff_ffff => Some(format!("<processor-specific type {pr_type:#x} data: {}>", hex(data))),
            0xe000_0000..=0xffff_ffff => Some(format!("<application-specific type {pr_type:#x} data: {}>", hex(data))),
            _ => Some(format!("<unknown type {pr_type:#x} data: {}>", hex(data))),
        };
        lines.push(line.unwrap_or_else(|| format!("<corrupt length: {size:#x}>")));
        if c.skip((padded - u64::from(size)) as usize).is_none() {
            break;
        }
    }
    if let Some(first) = lines.first_mut() {
        *first = format!("Properties: {first}");
    }
    lines
}

// ----------------------------------------------------------------------------
// FreeBSD
// ----------------------------------------------------------------------------

fn freebsd_type_name(t: u32) -> String {
    match t {
        1 => "NT_FREEBSD_ABI_TAG".to_string(),
        2 => "NT_FREEBSD_NOINIT_TAG".to_string(),
        3 => "NT_FREEBSD_ARCH_TAG".to_string(),
        4 => "NT_FREEBSD_FEATURE_CTL".to_string(),
        _ => unknown(t),
    }
}

fn describe_freebsd(note: &Note<'_>, cx: &NoteContext) -> Lines {
    match note.note_type {
        1 => Some(vec![format!("Version: {}", cx.codec.u32_at(note.desc, 0).ok()?)]),
        3 => Some(vec![format!("Arch: {}", cstring(note.desc))]),
        4 => {
            let v = cx.codec.u32_at(note.desc, 0).ok()?;
            Some(vec![format!(
                "Features: {}",
                bit_names(
                    v,
                    &[
                        (0x1, "ASLR_DISABLE"),
                        (0x2, "PROTMAX_DISABLE"),
                        (0x4, "STKGAP_DISABLE"),
                        (0x8, "WXNEEDED"),
                        (0x10, "LA48"),
                        (0x20, "ASG_DISABLE"),
                    ]
                )
            )])
        }
        _ => Some(Vec::new()),
    }
}

// ----------------------------------------------------------------------------
// NetBSD / PaX / OpenBSD
// ----------------------------------------------------------------------------

fn netbsd_type_name(t: u32) -> String {
    match t {
        1 => "NT_NETBSD_IDENT".to_string(),
        2 => "NT_NETBSD_EMULATION".to_string(),
        5 => "NT_NETBSD_MARCH".to_string(),
        _ => unknown(t),
    }
}

fn describe_netbsd(note: &Note<'_>, cx: &NoteContext) -> Lines {
    match note.note_type {
        1 => {
            let version = cx.codec.u32_at(note.desc, 0).ok()?;
            let major = version / 100_000_000;
            let minor = (version % 100_000_000) / 1_000_000;
            let patch = (version % 10_000) / 100;
            let mut text = format!("version: {major}.{minor}");
            if patch != 0 {
                text.push_str(&format!(".{patch}"));
            }
            Some(vec![format!("NetBSD {text} ({version:#x})")])
        }
        2 | 5 => Some(vec![format!(
            "{}: {}",
            if note.note_type == 5 { "Arch" } else { "Emulation" },
            cstring(note.desc)
        )]),
        _ => Some(Vec::new()),
    }
}

fn describe_pax(note: &Note<'_>, cx: &NoteContext) -> Lines {
    let flags = cx.codec.u32_at(note.desc, 0).ok()?;
    Some(vec![format!(
        "Flags: {}",
        bit_names(
            flags,
            &[
                (0x01, "+mprotect"),
                (0x02, "-mprotect"),
                (0x04, "+segvguard"),
                (0x08, "-segvguard"),
                (0x10, "+ASLR"),
                (0x20, "-ASLR"),
            ]
        )
    )])
}

fn openbsd_type_name(t: u32) -> String {
    match t {
        1 => "NT_OPENBSD_IDENT".to_string(),
        10 => "NT_OPENBSD_PROCINFO".to_string(),
        11 => "NT_OPENBSD_AUXV".to_string(),
        20 => "NT_OPENBSD_REGS".to_string(),
        21 => "NT_OPENBSD_FPREGS".to_string(),
        22 => "NT_OPENBSD_XFPREGS".to_string(),
        23 => "NT_OPENBSD_WCOOKIE".to_string(),
        _ => unknown(t),
    }
}

fn netbsd_core_type_name(t: u32) -> String {
    match t {
        1 => "NetBSD procinfo structure".to_string(),
        2 => "NetBSD ELF auxiliary vector data".to_string(),
        3 => "NetBSD lwp status structure".to_string(),
        _ => format!("PT_GETREGS (reg structure) or machine type {t:#x}"),
    }
}

// ----------------------------------------------------------------------------
// SystemTap
// ----------------------------------------------------------------------------

fn describe_stapsdt(note: &Note<'_>, cx: &NoteContext) -> Lines {
    let mut c = Cursor::new(note.desc);
    let pc = c.word(cx.codec)?;
    let base = c.word(cx.codec)?;
    let semaphore = c.word(cx.codec)?;
    let provider = String::from_utf8_lossy(c.cstr()?).into_owned();
    let name = String::from_utf8_lossy(c.cstr()?).into_owned();
    let args = String::from_utf8_lossy(c.cstr()?).into_owned();
    Some(vec![
        format!("Provider: {provider}"),
        format!("Name: {name}"),
        format!("Location: {pc:#x}, Base: {base:#x}, Semaphore: {semaphore:#x}"),
        format!("Arguments: {args}"),
    ])
}

// ----------------------------------------------------------------------------
// Core files
// ----------------------------------------------------------------------------

const NT_FILE: u32 = 0x4649_4c45;

fn core_type_name(t: u32) -> String {
    let name = match t {
        1 => "NT_PRSTATUS (prstatus structure)",
        2 => "NT_FPREGSET (floating point registers)",
        3 => "NT_PRPSINFO (prpsinfo structure)",
        4 => "NT_TASKSTRUCT (task structure)",
        6 => "NT_AUXV (auxiliary vector)",
        10 => "NT_PSTATUS (pstatus structure)",
        12 => "NT_FPREGS (floating point registers)",
        13 => "NT_PSINFO (psinfo structure)",
        16 => "NT_LWPSTATUS (lwpstatus_t structure)",
        17 => "NT_LWPSINFO (lwpsinfo_t structure)",
        18 => "NT_WIN32PSTATUS (win32_pstatus structure)",
        0x200 => "NT_386_TLS (x86 TLS information)",
        0x201 => "NT_386_IOPERM (x86 I/O permissions)",
        0x202 => "NT_X86_XSTATE (x86 XSAVE extended state)",
        0x300 => "NT_S390_HIGH_GPRS (s390 upper register halves)",
        0x400 => "NT_ARM_VFP (arm VFP registers)",
        0x401 => "NT_ARM_TLS (AArch TLS registers)",
        0x402 => "NT_ARM_HW_BREAK (AArch hardware breakpoint registers)",
        0x403 => "NT_ARM_HW_WATCH (AArch hardware watchpoint registers)",
        0x406 => "NT_ARM_SVE (AArch SVE registers)",
        0x407 => "NT_ARM_PAC_MASK (AArch pointer authentication code masks)",
        0x46e6_2b7f => "NT_PRXFPREG (user_xfpregs structure)",
        NT_FILE => "NT_FILE (mapped files)",
        0x5349_4749 => "NT_SIGINFO (siginfo_t data)",
        _ => return unknown(t),
    };
    name.to_string()
}

/// Decode the NT_FILE mapping table: a count, a page size, `count`
/// `(start, end, page offset)` triples, then `count` file names.
fn describe_core(note: &Note<'_>, cx: &NoteContext) -> Lines {
    if note.note_type != NT_FILE {
        return Some(Vec::new());
    }
    let codec = cx.codec;
    let word = codec.word_size() as u64;
    let mut c = Cursor::new(note.desc);
    let count = c.word(codec)?;
    let page_size = c.word(codec)?;
    if count.checked_mul(3 * word)? > c.remaining() as u64 {
        return None;
    }
    let mut ranges = Vec::new();
    for _ in 0..count {
        ranges.push((c.word(codec)?, c.word(codec)?, c.word(codec)?));
    }
    let mut lines = vec![
        format!("Page size: {page_size}"),
        format!("{:>18} {:>18} {:>18}", "Start", "End", "Page Offset"),
    ];
    for (start, end, page) in ranges {
        let file = c.cstr().map(String::from_utf8_lossy).unwrap_or_default();
        lines.push(format!("{start:#018x} {end:#018x} {page:#018x}"));
        lines.push(format!("    {file}"));
    }
    Some(lines)
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn cstring(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes.split(|&b| b == 0).next().unwrap_or(&[])).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elf::symbol::{SymbolTable, STT_FUNC};
    use crate::utils::{ElfClass, Endianness};

    const LE64: Codec = Codec::new(ElfClass::Elf64, Endianness::Little);

    fn note(buf: &mut Vec<u8>, name: &[u8], ntype: u32, desc: &[u8], align: usize) {
        let start = buf.len();
        buf.extend_from_slice(&(name.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(desc.len() as u32).to_le_bytes());
        buf.extend_from_slice(&ntype.to_le_bytes());
        buf.extend_from_slice(name);
        while (buf.len() - start) % align != 0 {
            buf.push(0);
        }
        buf.extend_from_slice(desc);
        while (buf.len() - start) % align != 0 {
            buf.push(0);
        }
    }

    fn cx() -> NoteContext<'static> {
        NoteContext {
            codec: LE64,
            machine: EM_X86_64,
            is_core: false,
            symbols: None,
        }
    }

    #[test]
    fn test_walk_and_describe_gnu() {
        let diag = Diagnostics::new();
        let mut buf = Vec::new();
        let abi: Vec<u8> = [0u32, 3, 2, 0].iter().flat_map(|v| v.to_le_bytes()).collect();
        note(&mut buf, b"GNU\0", NT_GNU_ABI_TAG, &abi, 4);
        note(&mut buf, b"GNU\0", NT_GNU_BUILD_ID, &[0xde, 0xad, 0xbe, 0xef, 0x01], 4);
        let notes = walk_notes(&buf, LE64, 4, &diag);
        assert_eq!(notes.len(), 2);
        assert!(diag.is_empty());

        let d = describe(&notes[0], &cx(), &mut BuildRanges::default());
        assert_eq!(d.type_name, "NT_GNU_ABI_TAG (ABI version tag)");
        assert_eq!(d.lines, vec!["OS: Linux, ABI: 3.2.0"]);
        let d = describe(&notes[1], &cx(), &mut BuildRanges::default());
        assert_eq!(d.lines, vec!["Build ID: deadbeef01"]);
    }

    #[test]
    fn test_properties_with_eight_byte_alignment() {
        let diag = Diagnostics::new();
        let mut desc = Vec::new();
        desc.extend_from_slice(&GNU_PROPERTY_X86_FEATURE_1_AND.to_le_bytes());
        desc.extend_from_slice(&4u32.to_le_bytes());
        desc.extend_from_slice(&3u32.to_le_bytes());
        desc.extend_from_slice(&[0; 4]);
        desc.extend_from_slice(&GNU_PROPERTY_X86_ISA_1_NEEDED.to_le_bytes());
        desc.extend_from_slice(&4u32.to_le_bytes());
        desc.extend_from_slice(&1u32.to_le_bytes());
        desc.extend_from_slice(&[0; 4]);
        let mut buf = Vec::new();
        note(&mut buf, b"GNU\0", NT_GNU_PROPERTY_TYPE_0, &desc, 8);
        let notes = walk_notes(&buf, LE64, 8, &diag);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].desc.len(), 32);
        let d = describe(&notes[0], &cx(), &mut BuildRanges::default());
        assert_eq!(
            d.lines,
            vec!["Properties: x86 feature: IBT, SHSTK", "x86 ISA needed: x86-64-baseline"]
        );
    }

    #[test]
    fn test_oversized_note_stops_walk() {
        let diag = Diagnostics::new();
        let mut buf = Vec::new();
        note(&mut buf, b"GNU\0", NT_GNU_BUILD_ID, &[1, 2, 3, 4], 4);
        let bad_start = buf.len();
        note(&mut buf, b"GNU\0", NT_GNU_BUILD_ID, &[1, 2, 3, 4], 4);
        buf[bad_start + 4..bad_start + 8].copy_from_slice(&0xffff_fff0u32.to_le_bytes());
        let notes = walk_notes(&buf, LE64, 4, &diag);
        assert_eq!(notes.len(), 1);
        assert!(diag.mentions("Corrupt note"));

        // A name size that wraps when padded.
        let mut buf = vec![0u8; 12];
        buf[0..4].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(walk_notes(&buf, LE64, 4, &diag).is_empty());
    }

    #[test]
    fn test_core_file_mappings_and_stapsdt() {
        let mut desc = Vec::new();
        for v in [1u64, 4096, 0x400000, 0x401000, 0] {
            desc.extend_from_slice(&v.to_le_bytes());
        }
        desc.extend_from_slice(b"/bin/true\0");
        let n = Note {
            offset: 0,
            name: "CORE".to_string(),
            owner: "CORE".as_bytes(),
            note_type: NT_FILE,
            desc: &desc,
        };
        let core = NoteContext {
            is_core: true,
            ..cx()
        };
        let d = describe(&n, &core, &mut BuildRanges::default());
        assert_eq!(d.type_name, "NT_FILE (mapped files)");
        assert_eq!(d.lines[0], "Page size: 4096");
        assert_eq!(d.lines[3], "    /bin/true");

        let mut desc = Vec::new();
        for v in [0x1130u64, 0x2000, 0] {
            desc.extend_from_slice(&v.to_le_bytes());
        }
        desc.extend_from_slice(b"libc\0setjmp\0-8@%rdi\0");
        let n = Note {
            offset: 0,
            name: "stapsdt".to_string(),
            owner: "stapsdt".as_bytes(),
            note_type: 3,
            desc: &desc,
        };
        let d = describe(&n, &cx(), &mut BuildRanges::default());
        assert_eq!(d.lines[1], "Name: setjmp");
        assert_eq!(d.lines[2], "Location: 0x1130, Base: 0x2000, Semaphore: 0x0");

        let truncated = Note {
            desc: &desc[..10],
            ..n
        };
        let d = describe(&truncated, &cx(), &mut BuildRanges::default());
        assert_eq!(d.lines, vec!["<corrupt stapsdt note>"]);
    }

    #[test]
    fn test_build_attribute_owners() {
        assert_eq!(build_attribute_owner(b"GA$\x013p1").as_deref(), Some("GA$<version>3p1"));
        assert_eq!(build_attribute_owner(b"GA*\x02\x03").as_deref(), Some("GA*<stack prot>strong"));
        assert_eq!(build_attribute_owner(b"GA*\x07\x04").as_deref(), Some("GA*<PIC>PIE"));
        assert_eq!(build_attribute_owner(b"GA*\x04\x11\x27").as_deref(), Some("GA*<stack size>0x2711"));
        assert_eq!(build_attribute_owner(b"GA*\x04\x10\x27").as_deref(), Some("GA*<stack size>10000"));
        assert_eq!(build_attribute_owner(b"GA+\x03").as_deref(), Some("GA+<relro>true"));
        assert_eq!(build_attribute_owner(b"GA!\x08").as_deref(), Some("GA!<short enum>false"));
        assert_eq!(
            build_attribute_owner(b"GA*GOW\0\x05").as_deref(),
            Some("GA*GOW:5")
        );
        assert_eq!(build_attribute_owner(b"GA*\x04123456789"), None);
        assert_eq!(build_attribute_owner(b"GA?\x01"), None);
    }

    #[test]
    fn test_build_attribute_ranges() {
        let diag = Diagnostics::new();
        let mut range = Vec::new();
        range.extend_from_slice(&0x1000u64.to_le_bytes());
        range.extend_from_slice(&0x1080u64.to_le_bytes());
        let mut buf = Vec::new();
        note(&mut buf, b"GA$\x013p1\0", NT_GNU_BUILD_ATTRIBUTE_OPEN, &range, 4);
        note(&mut buf, b"GA*\x02\x01\0", NT_GNU_BUILD_ATTRIBUTE_OPEN, &[], 4);
        note(&mut buf, b"GA+\x03\0", NT_GNU_BUILD_ATTRIBUTE_FUNC, &[0x30, 0x10, 0, 0, 0, 0, 0, 0], 4);
        note(&mut buf, b"GA!\x08\0", NT_GNU_BUILD_ATTRIBUTE_FUNC, &[0; 5], 4);
        let notes = walk_notes(&buf, LE64, 4, &diag);
        assert_eq!(notes.len(), 4);

        let table = SymbolTable {
            section: Some(5),
            symbols: vec![func_symbol("", 0, 0), func_symbol("main", 0x1030, 0x20)],
        };
        let index = SymbolIndex::new(&table);
        let with_symbols = NoteContext {
            symbols: Some(&index),
            ..cx()
        };
        let mut ranges = BuildRanges::default();

        let d = describe(&notes[0], &with_symbols, &mut ranges);
        assert_eq!(d.owner.as_deref(), Some("GA$<version>3p1"));
        assert_eq!(d.type_name, "OPEN");
        assert_eq!(d.lines, vec!["Applies to region from 0x1000 to 0x1080"]);

        let d = describe(&notes[1], &with_symbols, &mut ranges);
        assert_eq!(d.owner.as_deref(), Some("GA*<stack prot>on"));
        assert_eq!(d.lines, vec!["Applies to region from 0x1000 to 0x1080"]);

        let d = describe(&notes[2], &with_symbols, &mut ranges);
        assert_eq!(d.type_name, "func");
        assert_eq!(d.lines, vec!["Applies to region from 0x1030 to 0x1050 (main)"]);

        let d = describe(&notes[3], &with_symbols, &mut ranges);
        assert_eq!(d.lines, vec!["<invalid description size: 0x5>"]);
    }

    fn func_symbol(name: &str, value: u64, size: u64) -> Symbol {
        Symbol {
            index: 1,
            name_offset: 0,
            name: name.to_string(),
            value,
            size,
            info: STT_FUNC,
            other: 0,
            shndx: 1,
            extended_shndx: None,
        }
    }
}
