//! # `ar` Archives
//!
//! Regular (`!<arch>`) and thin (`!<thin>`) archives. The special members
//! at the front (the symbol index `/` or `/SYM64/`, and the GNU long name
//! table `//`) are decoded up front; the remaining members are walked on
//! request. Regular members are handed to the decoder as a window over the
//! archive bytes, thin members name an external file.

use crate::diag::Diagnostics;
use crate::errors::{ElfError, Result};

/// Magic of a regular archive.
pub const ARMAG: &[u8; 8] = b"!<arch>\n";

/// Magic of a thin archive.
pub const THINMAG: &[u8; 8] = b"!<thin>\n";

/// Size of a member header.
const HEADER_SIZE: u64 = 60;

/// Terminator of every member header.
const FMAG: &[u8; 2] = b"`\n";

/// One symbol of the archive index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub name: String,

    /// Offset of the defining member's header.
    pub member_offset: u64,
}

/// A member other than the special ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,

    /// Offset of the member header within the archive.
    pub header_offset: u64,

    /// Offset of the member bytes. Meaningless for thin members.
    pub data_offset: u64,
    pub size: u64,

    /// Set for thin-archive members, whose bytes live in the file `name`.
    pub external: bool,
}

/// A raw member header.
#[derive(Debug, Clone, Copy)]
struct RawHeader<'a> {
    name: &'a [u8],
    size: u64,
}

#[derive(Debug, Clone)]
pub struct Archive<'a> {
    data: &'a [u8],
    pub thin: bool,

    /// Symbol index, in table order.
    pub index: Vec<IndexEntry>,

    /// Size in bytes of the symbol index member, when there is one.
    pub index_size: Option<u64>,
    long_names: Option<&'a [u8]>,

    /// Offset of the first ordinary member.
    first_member: u64,
}

impl<'a> Archive<'a> {
    /// True if `data` starts with either archive magic.
    pub fn is_archive(data: &[u8]) -> bool {
        data.starts_with(ARMAG) || data.starts_with(THINMAG)
    }

    /// Parse the archive magic and its special members.
    pub fn parse(data: &'a [u8], diag: &Diagnostics) -> Result<Self> {
        let thin = if data.starts_with(ARMAG) {
            false
        } else if data.starts_with(THINMAG) {
            true
        } else {
            return Err(ElfError::corrupt("archive", "missing archive magic"));
        };
        let mut archive = Archive {
            data,
            thin,
            index: Vec::new(),
            index_size: None,
            long_names: None,
            first_member: ARMAG.len() as u64,
        };

        let mut offset = archive.first_member;
        while let Some(header) = archive.header_at(offset)? {
            if !is_special(header.name) && !header.name.starts_with(b"__.SYMDEF") {
                break;
            }
            let body_start = offset + HEADER_SIZE;
            let body = archive.body(body_start, header.size)?;
            if header.name.starts_with(b"// ") {
                archive.long_names = Some(body);
            } else if header.name.starts_with(b"/") {
                let wide = header.name.starts_with(b"/SYM64/");
                archive.index = parse_index(body, wide, diag);
                archive.index_size = Some(header.size);
            }
            offset = next_header(body_start, header.size);
        }
        archive.first_member = offset;
        Ok(archive)
    }

    /// Decode the header at `offset`; `None` at the end of the archive.
    fn header_at(&self, offset: u64) -> Result<Option<RawHeader<'a>>> {
        let len = self.data.len() as u64;
        if offset >= len {
            return Ok(None);
        }
        let Some(raw) = offset
            .checked_add(HEADER_SIZE)
            .filter(|&end| end <= len)
            .map(|end| &self.data[offset as usize..end as usize])
        else {
            return Err(ElfError::corrupt(
                "archive",
                format!("truncated member header at offset {offset:#x}"),
            ));
        };
        if &raw[58..60] != FMAG {
            return Err(ElfError::corrupt(
                "archive",
                format!("bad member header terminator at offset {offset:#x}"),
            ));
        }
        let size_field = std::str::from_utf8(&raw[48..58]).unwrap_or("").trim_end();
        let size = size_field.parse::<u64>().map_err(|_| {
            ElfError::corrupt(
                "archive",
                format!("member size {size_field:?} at offset {offset:#x} is not a decimal number"),
            )
        })?;
        Ok(Some(RawHeader {
            name: &raw[..16],
            size,
        }))
    }

    /// The `size` bytes at `offset`, refusing sizes past the archive end.
    fn body(&self, offset: u64, size: u64) -> Result<&'a [u8]> {
        offset
            .checked_add(size)
            .filter(|&end| end <= self.data.len() as u64)
            .map(|end| &self.data[offset as usize..end as usize])
            .ok_or_else(|| {
                ElfError::corrupt(
                    "archive",
                    format!("member at {:#x} claims {size:#x} bytes, past the end of the archive", offset - HEADER_SIZE),
                )
            })
    }

    /// Walk the ordinary members. A malformed header ends the walk with an
    /// error report; the members before it are still returned.
    pub fn members(&self, diag: &Diagnostics) -> Vec<Member> {
        let mut members = Vec::new();
        let mut offset = self.first_member;
        loop {
            let header = match self.header_at(offset) {
                Ok(Some(h)) => h,
                Ok(None) => break,
                Err(e) => {
                    diag.error(e);
                    break;
                }
            };
            let mut data_offset = offset + HEADER_SIZE;
            let mut size = header.size;
            let name = match self.member_name(header.name) {
                Ok(MemberName::Plain(name)) => name,
                Ok(MemberName::Bsd(len)) => {
                    if len > size {
                        diag.error(format_args!(
                            "BSD member name length {len} at {offset:#x} exceeds the member size"
                        ));
                        break;
                    }
                    let raw = self.body(data_offset, len).unwrap_or(&[]);
                    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
                    data_offset += len;
                    size -= len;
                    String::from_utf8_lossy(&raw[..end]).into_owned()
                }
                Err(e) => {
                    diag.error(e);
                    break;
                }
            };

            let external = self.thin && !is_special(header.name);
            if !external {
                if let Err(e) = self.body(data_offset, size) {
                    diag.error(e);
                    break;
                }
            }
            members.push(Member {
                name,
                header_offset: offset,
                data_offset,
                size,
                external,
            });
            offset = if external {
                offset + HEADER_SIZE
            } else {
                next_header(offset + HEADER_SIZE, header.size)
            };
        }
        members
    }

    fn member_name(&self, raw: &[u8]) -> Result<MemberName> {
        let text = String::from_utf8_lossy(raw);
        let trimmed = text.trim_end();
        if let Some(len) = trimmed.strip_prefix("#1/") {
            return len.parse().map(MemberName::Bsd).map_err(|_| {
                ElfError::corrupt("archive", format!("bad BSD name length {len:?}"))
            });
        }
        if let Some(Ok(offset)) = trimmed
            .strip_prefix('/')
            .filter(|rest| !rest.is_empty())
            .map(str::parse::<usize>)
        {
            let table = self
                .long_names
                .ok_or_else(|| ElfError::corrupt("archive", "long member name without a name table"))?;
            let tail = table.get(offset..).ok_or(ElfError::BadStringOffset {
                offset: offset as u64,
                size: table.len() as u64,
            })?;
            let end = tail
                .windows(2)
                .position(|w| w == b"/\n")
                .or_else(|| tail.iter().position(|&b| b == b'\n' || b == 0))
                .unwrap_or(tail.len());
            return Ok(MemberName::Plain(String::from_utf8_lossy(&tail[..end]).into_owned()));
        }
        Ok(MemberName::Plain(
            trimmed.strip_suffix('/').unwrap_or(trimmed).to_string(),
        ))
    }

    /// The bytes of a regular member.
    pub fn member_data(&self, member: &Member) -> &'a [u8] {
        self.body(member.data_offset, member.size).unwrap_or(&[])
    }

    /// The whole archive.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// The name of the member whose header is at `offset`, for the index listing.
    pub fn name_at(&self, offset: u64) -> Option<String> {
        let header = self.header_at(offset).ok()??;
        match self.member_name(header.name).ok()? {
            MemberName::Plain(name) => Some(name),
            MemberName::Bsd(len) => {
                let raw = self.body(offset + HEADER_SIZE, len).ok()?;
                let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
                Some(String::from_utf8_lossy(&raw[..end]).into_owned())
            }
        }
    }
}

enum MemberName {
    Plain(String),
    /// `#1/N`: the name is the first N bytes of the member.
    Bsd(u64),
}

fn is_special(name: &[u8]) -> bool {
    name.starts_with(b"/ ") || name.starts_with(b"// ") || name.starts_with(b"/SYM64/")
}

/// Members start on even offsets.
fn next_header(body_start: u64, size: u64) -> u64 {
    let end = body_start.saturating_add(size);
    end.saturating_add(end & 1)
}

/// Decode a symbol index: a big-endian count, that many member offsets,
/// then the NUL-terminated names.
fn parse_index(body: &[u8], wide: bool, diag: &Diagnostics) -> Vec<IndexEntry> {
    let width = if wide { 8 } else { 4 };
    let read = |at: usize| -> Option<u64> {
        let bytes = body.get(at..at + width)?;
        Some(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
    };
    let Some(count) = read(0) else {
        diag.warn("The archive index is too small to hold its symbol count");
        return Vec::new();
    };
    let max = (body.len() / width).saturating_sub(1) as u64;
    if count > max {
        diag.warn(format_args!(
            "The archive index claims {count} symbols but has room for {max}"
        ));
    }
    let count = count.min(max) as usize;
    let mut names = body[width * (count + 1)..].split(|&b| b == 0);
    let mut entries = Vec::with_capacity(count);
    for i in 0..count {
        let Some(member_offset) = read(width * (i + 1)) else {
            break;
        };
        let Some(name) = names.next() else {
            diag.warn(format_args!(
                "The archive index has {count} offsets but only {i} names"
            ));
            break;
        };
        entries.push(IndexEntry {
            name: String::from_utf8_lossy(name).into_owned(),
            member_offset,
        });
    }
    entries
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Append a member with header name `name` and body `body`.
    pub(crate) fn push_member(out: &mut Vec<u8>, name: &str, body: &[u8]) {
        out.extend_from_slice(format!("{name:<16}{:<12}{:<6}{:<6}{:<8}{:<10}`\n", 0, 0, 0, 644, body.len()).as_bytes());
        out.extend_from_slice(body);
        if out.len() % 2 == 1 {
            out.push(b'\n');
        }
    }

    fn sample() -> Vec<u8> {
        let mut index = Vec::new();
        index.extend(2u32.to_be_bytes());
        index.extend(0u32.to_be_bytes());
        index.extend(0u32.to_be_bytes());
        index.extend(b"alpha\0beta\0");

        let mut out = ARMAG.to_vec();
        push_member(&mut out, "/", &index);
        push_member(&mut out, "//", b"a_very_long_member_name.o/\n");
        push_member(&mut out, "short.o/", b"abc");
        push_member(&mut out, "/0", b"long body");
        push_member(&mut out, "#1/8", b"bsd.o\0\0\0payload");
        out
    }

    #[test]
    fn test_members_and_names() {
        let data = sample();
        let diag = Diagnostics::new();
        let archive = Archive::parse(&data, &diag).unwrap();
        assert!(!archive.thin);
        let members = archive.members(&diag);
        let names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["short.o", "a_very_long_member_name.o", "bsd.o"]);
        assert_eq!(archive.member_data(&members[0]), b"abc");
        assert_eq!(archive.member_data(&members[1]), b"long body");
        assert_eq!(archive.member_data(&members[2]), b"payload");
        assert!(diag.is_empty());

        assert_eq!(archive.index.len(), 2);
        assert_eq!(archive.index[1].name, "beta");
        assert_eq!(archive.name_at(members[0].header_offset).as_deref(), Some("short.o"));
    }

    #[test]
    fn test_bad_size_stops_walk() {
        let mut data = ARMAG.to_vec();
        push_member(&mut data, "ok.o/", b"xy");
        let bad = data.len();
        push_member(&mut data, "bad.o/", b"zz");
        data[bad + 48..bad + 58].copy_from_slice(b"12x       ");
        let diag = Diagnostics::new();
        let archive = Archive::parse(&data, &diag).unwrap();
        let members = archive.members(&diag);
        assert_eq!(members.len(), 1);
        assert!(diag.has_errors());
        assert!(diag.mentions("not a decimal number"));
    }

    #[test]
    fn test_oversized_member() {
        let mut data = ARMAG.to_vec();
        push_member(&mut data, "big.o/", b"1234");
        data[8 + 48..8 + 58].copy_from_slice(b"999       ");
        let diag = Diagnostics::new();
        let archive = Archive::parse(&data, &diag).unwrap();
        assert!(archive.members(&diag).is_empty());
        assert!(diag.mentions("past the end of the archive"));
    }

    #[test]
    fn test_thin_members_are_external() {
        let mut data = THINMAG.to_vec();
        push_member(&mut data, "//", b"dir/long_object_name.o/\n");
        // Thin member headers carry the external file's size but no body.
        data.extend_from_slice(format!("{:<16}{:<12}{:<6}{:<6}{:<8}{:<10}`\n", "/0", 0, 0, 0, 644, 4096).as_bytes());
        data.extend_from_slice(format!("{:<16}{:<12}{:<6}{:<6}{:<8}{:<10}`\n", "b.o/", 0, 0, 0, 644, 100).as_bytes());
        let diag = Diagnostics::new();
        let archive = Archive::parse(&data, &diag).unwrap();
        assert!(archive.thin);
        let members = archive.members(&diag);
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].name, "dir/long_object_name.o");
        assert!(members[0].external);
        assert_eq!(members[0].size, 4096);
        assert_eq!(members[1].name, "b.o");
        assert!(diag.is_empty());
    }
}
