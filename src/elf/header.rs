//! ELF header parsing.

use crate::arch::machines::{machine_name, osabi_name};
use crate::errors::{ElfError, Result};
use crate::utils::{Codec, ElfClass, Endianness};

use super::view::FileView;

// ============================================================================
// ELF Identification Constants (e_ident indices)
// ============================================================================

/// Size of the e_ident array at the start of every ELF file.
/// This is the minimum size an ELF file can be.
pub const EI_NIDENT: usize = 16;

/// Index of the ELF class byte (32-bit vs 64-bit).
const EI_CLASS: usize = 4;

/// Index of the data encoding byte (endianness).
const EI_DATA: usize = 5;

/// Index of the ELF version byte.
const EI_VERSION: usize = 6;

/// Index of the OS/ABI byte.
const EI_OSABI: usize = 7;

/// Index of the ABI version byte.
const EI_ABIVERSION: usize = 8;

// ============================================================================
// ELF Magic Number
// ============================================================================

/// ELF magic number bytes.
pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

// ============================================================================
// ELF Class Values
// ============================================================================

/// 32-bit ELF objects.
const ELFCLASS32: u8 = 1;

/// 64-bit ELF objects.
const ELFCLASS64: u8 = 2;

// ============================================================================
// ELF Data Encoding Values
// ============================================================================

/// Little-endian encoding (LSB first).
const ELFDATA2LSB: u8 = 1;

/// Big-endian encoding (MSB first).
const ELFDATA2MSB: u8 = 2;

// ============================================================================
// ELF Type Values
// ============================================================================

/// No file type.
const ET_NONE: u16 = 0;

/// Relocatable file (object file, .o).
pub const ET_REL: u16 = 1;

/// Executable file.
pub const ET_EXEC: u16 = 2;

/// Shared object file (also used for PIE executables).
pub const ET_DYN: u16 = 3;

/// Core dump file.
pub const ET_CORE: u16 = 4;

const ET_LOOS: u16 = 0xfe00;
const ET_HIOS: u16 = 0xfeff;
const ET_LOPROC: u16 = 0xff00;

// ============================================================================
// Types
// ============================================================================

/// ELF file type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElfType {
    /// No file type.
    None,
    /// Relocatable file (.o).
    Relocatable,
    /// Traditional executable (fixed load address).
    Executable,
    /// Shared object or PIE executable.
    SharedObject,
    /// Core dump.
    Core,
    /// Unknown or OS/processor-specific type.
    Other(u16),
}

impl ElfType {
    /// Converts a raw u16 e_type value to an ElfType.
    pub fn from_raw(value: u16) -> Self {
        match value {
            ET_NONE => ElfType::None,
            ET_REL => ElfType::Relocatable,
            ET_EXEC => ElfType::Executable,
            ET_DYN => ElfType::SharedObject,
            ET_CORE => ElfType::Core,
            other => ElfType::Other(other),
        }
    }

    pub fn raw(self) -> u16 {
        match self {
            ElfType::None => ET_NONE,
            ElfType::Relocatable => ET_REL,
            ElfType::Executable => ET_EXEC,
            ElfType::SharedObject => ET_DYN,
            ElfType::Core => ET_CORE,
            ElfType::Other(v) => v,
        }
    }

    /// Display form, e.g. `EXEC (Executable file)`.
    pub fn describe(self) -> String {
        match self {
            ElfType::None => "NONE (None)".to_string(),
            ElfType::Relocatable => "REL (Relocatable file)".to_string(),
            ElfType::Executable => "EXEC (Executable file)".to_string(),
            ElfType::SharedObject => "DYN (Shared object file)".to_string(),
            ElfType::Core => "CORE (Core file)".to_string(),
            ElfType::Other(v) if (ET_LOOS..=ET_HIOS).contains(&v) => {
                format!("OS Specific: ({v:x})")
            }
            ElfType::Other(v) if v >= ET_LOPROC => format!("Processor Specific: ({v:x})"),
            ElfType::Other(v) => format!("<unknown>: {v:x}"),
        }
    }
}

/// Parsed ELF header fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElfHeader {
    /// The identification bytes exactly as stored, padding included.
    pub ident: [u8; EI_NIDENT],

    /// ELF class (32-bit or 64-bit).
    pub class: ElfClass,

    /// File data encoding (endianness).
    pub endianness: Endianness,

    /// Object file type.
    pub elf_type: ElfType,

    /// Target machine architecture.
    pub machine: u16,

    /// `e_version` (1 for current ELF).
    pub version: u32,

    /// Entry point virtual address.
    pub entry_point: u64,

    /// Program header table file offset.
    pub program_header_offset: u64,

    /// Section header table file offset.
    pub section_header_offset: u64,

    /// Processor-specific flags.
    pub flags: u32,

    /// ELF header size in bytes.
    pub header_size: u16,

    /// Size of one program header entry.
    pub program_header_entry_size: u16,

    /// Number of program header entries.
    pub program_header_count: u16,

    /// Size of one section header entry.
    pub section_header_entry_size: u16,

    /// Number of section header entries.
    pub section_header_count: u16,

    /// Section name string table index.
    pub section_name_string_table_index: u16,
}

impl ElfHeader {
    /// Size of the file header for `class`.
    pub const fn size_for(class: ElfClass) -> usize {
        match class {
            ElfClass::Elf32 => 52,
            ElfClass::Elf64 => 64,
        }
    }

    /// Decode the file header at the start of `view`.
    pub fn parse(view: &FileView<'_>) -> Result<Self> {
        if view.size() < EI_NIDENT as u64 {
            return Err(ElfError::FileTooSmall {
                expected: EI_NIDENT,
                actual: view.size() as usize,
            });
        }
        let ident = view.read_bytes(0, EI_NIDENT as u64, "ELF identification")?;
        check_magic(ident)?;

        let class = class_of(ident[EI_CLASS])?;
        let size = Self::size_for(class);
        if view.size() < size as u64 {
            return Err(ElfError::FileTooSmall {
                expected: size,
                actual: view.size() as usize,
            });
        }
        let bytes = view.read_bytes(0, size as u64, "ELF file header")?;
        Self::parse_bytes(bytes)
    }

    /// Decode a file header from a byte slice starting at the header.
    pub fn parse_bytes(data: &[u8]) -> Result<Self> {
        // ====================================================================
        // Step 1: Validate minimum size and magic number
        // ====================================================================

        let ident: [u8; EI_NIDENT] = data
            .get(..EI_NIDENT)
            .and_then(|s| s.try_into().ok())
            .ok_or(ElfError::FileTooSmall {
                expected: EI_NIDENT,
                actual: data.len(),
            })?;
        check_magic(&ident)?;

        // ====================================================================
        // Step 2: Parse class and endianness
        // ====================================================================

        // These determine how to read everything else
        let class = class_of(ident[EI_CLASS])?;
        let endian = match ident[EI_DATA] {
            ELFDATA2LSB => Endianness::Little,
            ELFDATA2MSB => Endianness::Big,
            other => return Err(ElfError::UnsupportedEndianness(other)),
        };
        let codec = Codec::new(class, endian);

        let expected_header_size = Self::size_for(class);
        if data.len() < expected_header_size {
            return Err(ElfError::FileTooSmall {
                expected: expected_header_size,
                actual: data.len(),
            });
        }

        // ====================================================================
        // Step 3: Parse remaining fields
        // ====================================================================

        // Everything after e_entry shifts by the word size.
        let w = codec.word_size();
        let tail = 24 + 3 * w;
        Ok(ElfHeader {
            ident,
            class,
            endianness: endian,
            elf_type: ElfType::from_raw(codec.u16_at(data, 16)?),
            machine: codec.u16_at(data, 18)?,
            version: codec.u32_at(data, 20)?,
            entry_point: codec.word_at(data, 24)?,
            program_header_offset: codec.word_at(data, 24 + w)?,
            section_header_offset: codec.word_at(data, 24 + 2 * w)?,
            flags: codec.u32_at(data, tail)?,
            header_size: codec.u16_at(data, tail + 4)?,
            program_header_entry_size: codec.u16_at(data, tail + 6)?,
            program_header_count: codec.u16_at(data, tail + 8)?,
            section_header_entry_size: codec.u16_at(data, tail + 10)?,
            section_header_count: codec.u16_at(data, tail + 12)?,
            section_name_string_table_index: codec.u16_at(data, tail + 14)?,
        })
    }

    /// Re-encode the header with its own class and byte order.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let codec = self.codec();
        let w = codec.word_size();
        let tail = 24 + 3 * w;
        let mut out = vec![0u8; Self::size_for(self.class)];
        out[..EI_NIDENT].copy_from_slice(&self.ident);
        codec.put_u16(&mut out, 16, self.elf_type.raw())?;
        codec.put_u16(&mut out, 18, self.machine)?;
        codec.put_u32(&mut out, 20, self.version)?;
        codec.put_word(&mut out, 24, self.entry_point)?;
        codec.put_word(&mut out, 24 + w, self.program_header_offset)?;
        codec.put_word(&mut out, 24 + 2 * w, self.section_header_offset)?;
        codec.put_u32(&mut out, tail, self.flags)?;
        codec.put_u16(&mut out, tail + 4, self.header_size)?;
        codec.put_u16(&mut out, tail + 6, self.program_header_entry_size)?;
        codec.put_u16(&mut out, tail + 8, self.program_header_count)?;
        codec.put_u16(&mut out, tail + 10, self.section_header_entry_size)?;
        codec.put_u16(&mut out, tail + 12, self.section_header_count)?;
        codec.put_u16(&mut out, tail + 14, self.section_name_string_table_index)?;
        Ok(out)
    }

    /// The numeric codec every other read of this object uses.
    pub fn codec(&self) -> Codec {
        Codec::new(self.class, self.endianness)
    }

    pub fn ident_version(&self) -> u8 {
        self.ident[EI_VERSION]
    }

    pub fn os_abi(&self) -> u8 {
        self.ident[EI_OSABI]
    }

    pub fn abi_version(&self) -> u8 {
        self.ident[EI_ABIVERSION]
    }

    pub fn class_name(&self) -> &'static str {
        match self.class {
            ElfClass::Elf32 => "ELF32",
            ElfClass::Elf64 => "ELF64",
        }
    }

    pub fn data_name(&self) -> &'static str {
        match self.endianness {
            Endianness::Little => "2's complement, little endian",
            Endianness::Big => "2's complement, big endian",
        }
    }

    pub fn machine_name(&self) -> String {
        machine_name(self.machine)
            .map(str::to_string)
            .unwrap_or_else(|| format!("<unknown>: 0x{:x}", self.machine))
    }

    pub fn os_abi_name(&self) -> String {
        osabi_name(self.os_abi())
            .map(str::to_string)
            .unwrap_or_else(|| format!("<unknown: {:x}>", self.os_abi()))
    }
}

fn class_of(byte: u8) -> Result<ElfClass> {
    match byte {
        ELFCLASS32 => Ok(ElfClass::Elf32),
        ELFCLASS64 => Ok(ElfClass::Elf64),
        other => Err(ElfError::UnsupportedClass(other)),
    }
}

fn check_magic(ident: &[u8]) -> Result<()> {
    let mut found = [0u8; 4];
    let n = ident.len().min(4);
    found[..n].copy_from_slice(&ident[..n]);
    if found == ELF_MAGIC {
        return Ok(());
    }
    Err(ElfError::InvalidMagic {
        found,
        hint: foreign_format(ident),
    })
}

/// Best-effort recognition of other object formats, for the error message.
fn foreign_format(data: &[u8]) -> Option<&'static str> {
    const KNOWN: &[(&[u8], &str)] = &[
        (b"BC\xc0\xde", "this is an LLVM bitcode file"),
        (b"\xde\xc0\x17\x0b", "this is an LLVM bitcode wrapper file"),
        (b"\xcf\xfa\xed\xfe", "this is a 64-bit Mach-O file"),
        (b"\xce\xfa\xed\xfe", "this is a 32-bit Mach-O file"),
        (b"\xca\xfe\xba\xbe", "this is a Mach-O universal binary or Java class file"),
        (b"MZ", "this is a PE/COFF (Windows) executable"),
        (b"!<arch>\n", "this is an archive"),
        (b"\x00asm", "this is a WebAssembly module"),
    ];
    KNOWN
        .iter()
        .find(|(magic, _)| data.starts_with(magic))
        .map(|&(_, hint)| hint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Diagnostics;

    fn header_bytes(class: ElfClass, endian: Endianness) -> Vec<u8> {
        let codec = Codec::new(class, endian);
        let size = ElfHeader::size_for(class);
        let mut h = vec![0u8; size];
        h[..4].copy_from_slice(&ELF_MAGIC);
        h[4] = if class.is_64() { 2 } else { 1 };
        h[5] = if endian == Endianness::Little { 1 } else { 2 };
        h[6] = 1;
        h[7] = 3;
        h[8] = 0;
        h[12] = 0xaa; // padding must survive a round trip
        let w = codec.word_size();
        codec.put_u16(&mut h, 16, ET_EXEC).unwrap();
        codec.put_u16(&mut h, 18, 62).unwrap();
        codec.put_u32(&mut h, 20, 1).unwrap();
        codec.put_word(&mut h, 24, 0x401000).unwrap();
        codec.put_word(&mut h, 24 + w, size as u64).unwrap();
        codec.put_word(&mut h, 24 + 2 * w, 0x2000).unwrap();
        let t = 24 + 3 * w;
        codec.put_u32(&mut h, t, 0x1234_5678).unwrap();
        codec.put_u16(&mut h, t + 4, size as u16).unwrap();
        codec.put_u16(&mut h, t + 6, if class.is_64() { 56 } else { 32 }).unwrap();
        codec.put_u16(&mut h, t + 8, 2).unwrap();
        codec.put_u16(&mut h, t + 10, if class.is_64() { 64 } else { 40 }).unwrap();
        codec.put_u16(&mut h, t + 12, 7).unwrap();
        codec.put_u16(&mut h, t + 14, 6).unwrap();
        h
    }

    #[test]
    fn test_round_trip_all_layouts() {
        for class in [ElfClass::Elf32, ElfClass::Elf64] {
            for endian in [Endianness::Little, Endianness::Big] {
                let bytes = header_bytes(class, endian);
                let header = ElfHeader::parse_bytes(&bytes).unwrap();
                assert_eq!(header.entry_point, 0x401000);
                assert_eq!(header.flags, 0x1234_5678);
                assert_eq!(header.section_header_count, 7);
                assert_eq!(header.encode().unwrap(), bytes);
            }
        }
    }

    #[test]
    fn test_names() {
        let header = ElfHeader::parse_bytes(&header_bytes(ElfClass::Elf64, Endianness::Little)).unwrap();
        assert_eq!(header.class_name(), "ELF64");
        assert_eq!(header.data_name(), "2's complement, little endian");
        assert_eq!(header.os_abi_name(), "UNIX - GNU");
        assert_eq!(header.elf_type.describe(), "EXEC (Executable file)");
        assert_eq!(ElfType::Other(0xff10).describe(), "Processor Specific: (ff10)");
        assert_eq!(ElfType::Other(0x42).describe(), "<unknown>: 42");
    }

    #[test]
    fn test_bad_magic_hints() {
        let mut bytes = vec![0u8; 64];
        bytes[..4].copy_from_slice(b"BC\xc0\xde");
        match ElfHeader::parse_bytes(&bytes) {
            Err(ElfError::InvalidMagic { hint: Some(h), .. }) => assert!(h.contains("bitcode")),
            other => panic!("unexpected {other:?}"),
        }
        bytes[..4].copy_from_slice(b"JUNK");
        assert!(matches!(
            ElfHeader::parse_bytes(&bytes),
            Err(ElfError::InvalidMagic { hint: None, .. })
        ));
    }

    #[test]
    fn test_truncated_header() {
        let diag = Diagnostics::new();
        let bytes = header_bytes(ElfClass::Elf64, Endianness::Big);
        let view = FileView::new(&bytes[..40], &diag);
        assert!(matches!(
            ElfHeader::parse(&view),
            Err(ElfError::FileTooSmall { expected: 64, .. })
        ));
        let tiny = FileView::new(&bytes[..8], &diag);
        assert!(matches!(ElfHeader::parse(&tiny), Err(ElfError::FileTooSmall { .. })));
    }

    #[test]
    fn test_bad_class() {
        let mut bytes = header_bytes(ElfClass::Elf32, Endianness::Little);
        bytes[4] = 9;
        assert!(matches!(
            ElfHeader::parse_bytes(&bytes),
            Err(ElfError::UnsupportedClass(9))
        ));
    }
}
