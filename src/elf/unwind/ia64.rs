//! IA-64 unwind tables.
//!
//! `.IA_64.unwind` holds `(start, end, info)` address triples. Each `info`
//! points into `.IA_64.unwind_info` at a header word (version, handler
//! flags, length in words) followed by a stream of region and descriptor
//! records.

use crate::utils::Cursor;

use super::super::section::{find_by_name, SectionHeader, SHT_PROC_UNWIND};
use super::super::ElfFile;
use super::{format_addr, relocated, AbsAddr, UnwindEntry, UnwindTable};

const UNW_FLAG_EHANDLER: u64 = 0x1;
const UNW_FLAG_UHANDLER: u64 = 0x2;

/// One `(start, end, info)` triple.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TableEntry {
    start: AbsAddr,
    end: AbsAddr,
    info: AbsAddr,
}

pub fn decode(file: &ElfFile<'_>) -> Vec<UnwindTable> {
    file.sections()
        .iter()
        .filter(|s| s.sh_type == SHT_PROC_UNWIND)
        .filter_map(|sec| decode_table(file, sec))
        .collect()
}

fn decode_table(file: &ElfFile<'_>, sec: &SectionHeader) -> Option<UnwindTable> {
    let diag = file.diag();
    let data = file.section_data(sec).ok()?;
    let codec = file.codec;
    let ws = codec.word_size();
    let stride = 3 * ws;

    let mut entries: Vec<TableEntry> = data
        .chunks_exact(stride)
        .map(|chunk| {
            let word = |i: usize| AbsAddr::raw(codec.word_at(chunk, i * ws).unwrap_or(0));
            TableEntry {
                start: word(0),
                end: word(1),
                info: word(2),
            }
        })
        .collect();

    if file.is_relocatable() {
        for (rel, sym) in file.relocations_against(sec.index) {
            let name = file.caps.reloc_name(rel.rtype).unwrap_or("");
            if !name.contains("SEGREL") {
                diag.warn(format_args!(
                    "Skipping unexpected relocation type {} in the IA-64 unwind table",
                    if name.is_empty() { format!("{:#x}", rel.rtype) } else { name.to_string() }
                ));
                continue;
            }
            let index = (rel.offset / stride as u64) as usize;
            let field = ((rel.offset % stride as u64) / ws as u64) as usize;
            let Some(entry) = entries.get_mut(index) else {
                diag.warn(format_args!(
                    "Skipping IA-64 unwind relocation with invalid offset {:#x}",
                    rel.offset
                ));
                continue;
            };
            let slot = match field {
                0 => &mut entry.start,
                1 => &mut entry.end,
                _ => &mut entry.info,
            };
            *slot = relocated(&rel, sym, slot.offset);
        }
    }

    let info_name = sec
        .name
        .strip_prefix(".IA_64.unwind")
        .map(|suffix| format!(".IA_64.unwind_info{suffix}"));
    let named_info = info_name
        .as_deref()
        .and_then(|n| find_by_name(file.sections(), file.section_names.as_ref(), n, file.diag()));

    let symbols = file.address_symbols();
    let entries = entries
        .iter()
        .map(|e| {
            let mut entry = UnwindEntry {
                heading: format!(
                    "{}: [{:#x}-{:#x}], info at +{:#x}",
                    format_addr(e.start, symbols),
                    e.start.offset,
                    e.end.offset,
                    e.info.offset
                ),
                lines: Vec::new(),
            };
            let info_sec = match e.info.section {
                Some(idx) => file.sections().get(idx),
                None => named_info.or_else(|| file.section_containing(e.info.offset)),
            };
            match info_sec.and_then(|s| Some((s, file.section_data(s).ok()?))) {
                Some((s, info)) => {
                    let base = if e.info.section.is_some() { 0 } else { s.addr };
                    match e.info.offset.checked_sub(base) {
                        Some(off) => describe_info(file, info, off, &mut entry.lines),
                        None => entry.lines.push("\t<info address outside its section>".into()),
                    }
                }
                None => entry.lines.push("\t<unwind info not found>".into()),
            }
            entry
        })
        .collect();

    Some(UnwindTable {
        section: sec.index,
        name: sec.name.clone(),
        offset: sec.offset,
        entries,
    })
}

fn describe_info(file: &ElfFile<'_>, data: &[u8], offset: u64, lines: &mut Vec<String>) {
    let codec = file.codec;
    let Some(off) = usize::try_from(offset).ok().filter(|&o| o < data.len()) else {
        lines.push(format!("\t<info offset {offset:#x} is outside the unwind info>"));
        return;
    };
    let Ok(header) = codec.u64_at(data, off) else {
        lines.push("\t<truncated unwind info header>".into());
        return;
    };
    let version = header >> 48;
    let flags = (header >> 32) & 0xffff;
    let len = (header & 0xffff_ffff).saturating_mul(codec.word_size() as u64);

    let mut handlers = Vec::new();
    if flags & UNW_FLAG_EHANDLER != 0 {
        handlers.push("ehandler");
    }
    if flags & UNW_FLAG_UHANDLER != 0 {
        handlers.push("uhandler");
    }
    lines.push(format!(
        "\tv{version}, flags={flags:#x} ({}), len={len} bytes",
        handlers.join(", ")
    ));
    if version != 1 {
        lines.push("\tUnknown version.".into());
        return;
    }

    let start = off + 8;
    let available = (data.len() - start.min(data.len())) as u64;
    if len > available {
        file.diag().warn(format_args!(
            "Invalid unwind descriptor length {len:#x}: only {available:#x} bytes remain"
        ));
    }
    let end = start + len.min(available) as usize;
    lines.extend(descriptors(&data[start.min(end)..end]).into_iter().map(|l| format!("\t{l}")));

    if flags & (UNW_FLAG_EHANDLER | UNW_FLAG_UHANDLER) != 0 {
        match codec.word_at(data, end) {
            Ok(personality) => lines.push(format!("\tPersonality routine: {personality:#x}")),
            Err(_) => lines.push("\t<personality routine past the end of the section>".into()),
        }
    }
}

// ============================================================================
// Descriptor records
// ============================================================================

/// Decoder state: which kind of region the records belong to.
#[derive(Debug, Default)]
struct Region {
    body: bool,
    rlen: u64,
}

enum Record {
    Known(String),
    /// An encoding with no meaning; nothing after it can be decoded.
    Unknown(String),
}

/// Decode a descriptor stream into one line per record.
fn descriptors(data: &[u8]) -> Vec<String> {
    let mut c = Cursor::new(data);
    let mut region = Region::default();
    let mut out = Vec::new();
    while !c.is_empty() {
        match record(&mut c, &mut region) {
            Some(Record::Known(text)) => out.push(text),
            Some(Record::Unknown(text)) => {
                out.push(text);
                break;
            }
            None => {
                out.push("<truncated descriptor>".into());
                break;
            }
        }
    }
    out
}

fn record(c: &mut Cursor<'_>, region: &mut Region) -> Option<Record> {
    let b0 = c.u8()?;
    if b0 & 0x80 == 0 {
        return region_header(b0, c, region);
    }
    match b0 {
        0xf9..=0xfc => spill_record(b0, c).map(Record::Known),
        _ if region.body => body_record(b0, c),
        _ => prologue_record(b0, c, region),
    }
}

fn region_kind(body: bool) -> &'static str {
    if body {
        "body"
    } else {
        "prologue"
    }
}

fn region_header(b0: u8, c: &mut Cursor<'_>, region: &mut Region) -> Option<Record> {
    let text = if b0 & 0x40 == 0 {
        region.body = b0 & 0x20 != 0;
        region.rlen = u64::from(b0 & 0x1f);
        format!("R1:{}(rlen={})", region_kind(region.body), region.rlen)
    } else if b0 & 0xf8 == 0x40 {
        let b1 = c.u8()?;
        let mask = ((b0 & 0x7) << 1) | (b1 >> 7);
        let grsave = b1 & 0x7f;
        region.body = false;
        region.rlen = c.uleb128()?;
        format!(
            "R2:prologue_gr(mask=[{}], grsave=r{grsave}, rlen={})",
            save_mask(mask),
            region.rlen
        )
    } else if b0 & 0xfc == 0x60 {
        region.body = b0 & 0x3 == 1;
        region.rlen = c.uleb128()?;
        format!("R3:{}(rlen={})", region_kind(region.body), region.rlen)
    } else {
        return Some(Record::Unknown(format!("<unknown region header {b0:#04x}>")));
    };
    Some(Record::Known(text))
}

/// The `rp, ar.pfs, psp, pr` save mask of an R2 header.
fn save_mask(mask: u8) -> String {
    [(8, "rp"), (4, "ar.pfs"), (2, "psp"), (1, "pr")]
        .iter()
        .filter(|&&(bit, _)| mask & bit != 0)
        .map(|&(_, name)| name)
        .collect::<Vec<_>>()
        .join(",")
}

fn bit_list(mask: u32, prefix: &str, first: u32) -> String {
    (0..32)
        .filter(|i| mask & (1 << i) != 0)
        .map(|i| format!("{prefix}{}", i + first))
        .collect::<Vec<_>>()
        .join(",")
}

const P3_NAMES: [&str; 12] = [
    "psp_gr", "rp_gr", "pfs_gr", "preds_gr", "unat_gr", "lc_gr", "rp_br", "rnat_gr", "bsp_gr",
    "bspstore_gr", "fpsr_gr", "priunat_gr",
];

const P7_NAMES: [&str; 16] = [
    "mem_stack_f", "mem_stack_v", "spill_base", "psp_sprel", "rp_when", "rp_psprel", "pfs_when",
    "pfs_psprel", "preds_when", "preds_psprel", "lc_when", "lc_psprel", "unat_when",
    "unat_psprel", "fpsr_when", "fpsr_psprel",
];

const P8_NAMES: [&str; 20] = [
    "", "rp_sprel", "pfs_sprel", "preds_sprel", "lc_sprel", "unat_sprel", "fpsr_sprel",
    "bsp_when", "bsp_psprel", "bsp_sprel", "bspstore_when", "bspstore_psprel", "bspstore_sprel",
    "rnat_when", "rnat_psprel", "rnat_sprel", "priunat_when_gr", "priunat_psprel",
    "priunat_sprel", "priunat_when_mem",
];

/// Render the operand of a P7/P8 record according to its name's suffix.
fn operand(name: &str, value: u64) -> String {
    if name.ends_with("_when") || name.contains("_when_") {
        format!("t={value}")
    } else if name.ends_with("_psprel") || name == "spill_base" {
        format!("pspoff=0x10-{:#x}", value.wrapping_mul(4))
    } else {
        format!("spoff={:#x}", value.wrapping_mul(4))
    }
}

fn prologue_record(b0: u8, c: &mut Cursor<'_>, region: &Region) -> Option<Record> {
    let text = match b0 {
        0x80..=0x9f => format!("P1:br_mem(brmask=[{}])", bit_list(u32::from(b0 & 0x1f), "b", 1)),
        0xa0..=0xaf => {
            let b1 = c.u8()?;
            let brmask = (u32::from(b0 & 0xf) << 1) | u32::from(b1 >> 7);
            format!("P2:br_gr(brmask=[{}], gr=r{})", bit_list(brmask, "b", 1), b1 & 0x7f)
        }
        0xb0..=0xb7 => {
            let b1 = c.u8()?;
            let r = usize::from(((b0 & 0x7) << 1) | (b1 >> 7));
            let reg = b1 & 0x7f;
            match P3_NAMES.get(r) {
                Some(&"rp_br") => format!("P3:rp_br(reg=b{reg})"),
                Some(name) => format!("P3:{name}(reg=r{reg})"),
                None => return Some(Record::Unknown(format!("<unknown P3 register {r}>"))),
            }
        }
        0xb8 => {
            let len = usize::try_from(region.rlen.saturating_mul(2).saturating_add(7) / 8).ok()?;
            let imask = c.bytes(len)?;
            let bits: String = imask.iter().map(|b| format!("{b:02x}")).collect();
            format!("P4:spill_mask(imask=[{bits}])")
        }
        0xb9 => {
            let b = c.bytes(3)?;
            let grmask = b[0] >> 4;
            let frmask = (u32::from(b[0] & 0xf) << 16) | (u32::from(b[1]) << 8) | u32::from(b[2]);
            format!("P5:frgr_mem(grmask={grmask:#x}, frmask={frmask:#x})")
        }
        0xc0..=0xdf => {
            let kind = if b0 & 0x10 != 0 { "gr_mem" } else { "fr_mem" };
            format!("P6:{kind}(rmask={:#x})", b0 & 0xf)
        }
        0xe0..=0xef => {
            let name = P7_NAMES[usize::from(b0 & 0xf)];
            let value = c.uleb128()?;
            if name == "mem_stack_f" {
                let size = c.uleb128()?;
                format!("P7:mem_stack_f(t={value}, size={})", size.wrapping_mul(16))
            } else {
                format!("P7:{name}({})", operand(name, value))
            }
        }
        0xf0 => {
            let r = usize::from(c.u8()?);
            let value = c.uleb128()?;
            match P8_NAMES.get(r).filter(|n| !n.is_empty()) {
                Some(name) => format!("P8:{name}({})", operand(name, value)),
                None => return Some(Record::Unknown(format!("<unknown P8 record {r}>"))),
            }
        }
        0xf1 => {
            let grmask = c.u8()? & 0xf;
            let gr = c.u8()? & 0x7f;
            format!("P9:gr_gr(grmask={grmask:#x}, r{gr})")
        }
        0xff => {
            let abi = c.u8()?;
            let context = c.u8()?;
            let abi_name = match abi {
                0 => "@svr4".to_string(),
                1 => "@hpux".to_string(),
                2 => "@nt".to_string(),
                other => format!("{other}"),
            };
            format!("P10:unwabi(abi={abi_name}, context={context:#x})")
        }
        _ => return Some(Record::Unknown(format!("<unknown prologue descriptor {b0:#04x}>"))),
    };
    Some(Record::Known(text))
}

fn body_record(b0: u8, c: &mut Cursor<'_>) -> Option<Record> {
    let state = |copy: bool| if copy { "copy_state" } else { "label_state" };
    let text = match b0 {
        0x80..=0xbf => format!("B1:{}(label={})", state(b0 & 0x20 != 0), b0 & 0x1f),
        0xc0..=0xdf => {
            let t = c.uleb128()?;
            format!("B2:epilogue(t={t}, ecount={})", b0 & 0x1f)
        }
        0xe0 => {
            let t = c.uleb128()?;
            let ecount = c.uleb128()?;
            format!("B3:epilogue(t={t}, ecount={ecount})")
        }
        0xf0 | 0xf8 => {
            let label = c.uleb128()?;
            format!("B4:{}(label={label})", state(b0 & 0x08 != 0))
        }
        _ => return Some(Record::Unknown(format!("<unknown body descriptor {b0:#04x}>"))),
    };
    Some(Record::Known(text))
}

const SPECIAL_REGS: [&str; 11] = [
    "pr", "psp", "@priunat", "rp", "ar.bsp", "ar.bspstore", "ar.rnat", "ar.unat", "ar.fpsr",
    "ar.pfs", "ar.lc",
];

/// Name of a 7-bit `abreg` operand.
fn abreg(value: u8) -> String {
    let reg = value & 0x1f;
    match (value >> 5) & 0x3 {
        0 => format!("r{reg}"),
        1 => format!("f{reg}"),
        2 => format!("b{reg}"),
        _ => SPECIAL_REGS
            .get(usize::from(reg))
            .map_or_else(|| format!("<special {reg}>"), |s| s.to_string()),
    }
}

fn target_reg(x: bool, y: bool, treg: u8) -> String {
    match (x, y) {
        (true, _) => format!("f{treg}"),
        (false, true) => format!("b{treg}"),
        (false, false) => format!("r{treg}"),
    }
}

/// X1 through X4, valid in both region kinds.
fn spill_record(b0: u8, c: &mut Cursor<'_>) -> Option<String> {
    let place = |sprel: bool, off: u64| {
        if sprel {
            format!("spoff={:#x}", off.wrapping_mul(4))
        } else {
            format!("pspoff=0x10-{:#x}", off.wrapping_mul(4))
        }
    };
    Some(match b0 {
        0xf9 => {
            let b1 = c.u8()?;
            let t = c.uleb128()?;
            let off = c.uleb128()?;
            let sprel = b1 & 0x80 != 0;
            format!(
                "X1:spill_{}(reg={}, t={t}, {})",
                if sprel { "sprel" } else { "psprel" },
                abreg(b1 & 0x7f),
                place(sprel, off)
            )
        }
        0xfa => {
            let b1 = c.u8()?;
            let b2 = c.u8()?;
            let t = c.uleb128()?;
            let (x, y, treg) = (b1 & 0x80 != 0, b2 & 0x80 != 0, b2 & 0x7f);
            if !x && !y && treg == 0 {
                format!("X2:restore(t={t}, reg={})", abreg(b1 & 0x7f))
            } else {
                format!(
                    "X2:spill_reg(t={t}, reg={}, treg={})",
                    abreg(b1 & 0x7f),
                    target_reg(x, y, treg)
                )
            }
        }
        0xfb => {
            let b1 = c.u8()?;
            let b2 = c.u8()?;
            let t = c.uleb128()?;
            let off = c.uleb128()?;
            let sprel = b1 & 0x80 != 0;
            format!(
                "X3:spill_{}_p(qp=p{}, reg={}, t={t}, {})",
                if sprel { "sprel" } else { "psprel" },
                b1 & 0x3f,
                abreg(b2 & 0x7f),
                place(sprel, off)
            )
        }
        _ => {
            let b1 = c.u8()?;
            let b2 = c.u8()?;
            let b3 = c.u8()?;
            let t = c.uleb128()?;
            let (x, y, treg) = (b2 & 0x80 != 0, b3 & 0x80 != 0, b3 & 0x7f);
            if !x && !y && treg == 0 {
                format!("X4:restore_p(qp=p{}, t={t}, reg={})", b1 & 0x3f, abreg(b2 & 0x7f))
            } else {
                format!(
                    "X4:spill_reg_p(qp=p{}, t={t}, reg={}, treg={})",
                    b1 & 0x3f,
                    abreg(b2 & 0x7f),
                    target_reg(x, y, treg)
                )
            }
        }
    })
}
