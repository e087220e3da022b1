//! Fixed-layout ELF32 records read from a byte stream.
//!
//! This module only decodes bytes into fields, little-endian throughout; all
//! semantic validation lives in the loader.

use std::io::{Read, Seek, SeekFrom};

/// ELF magic number: 0x7f 'E' 'L' 'F'
pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// ELF class: 32-bit
pub const ELF_CLASS_32: u8 = 1;

/// ELF data encoding: little-endian
pub const ELF_DATA_LSB: u8 = 1;

/// The only ELF version ever defined
pub const ELF_VERSION: u32 = 1;

/// ELF object type: executable file
pub const ET_EXEC: u16 = 2;

/// ELF machine code: RISC-V
pub const EM_RISCV: u16 = 243;

/// Program header type: loadable segment
pub const PT_LOAD: u32 = 1;

/// Size of an ELF32 header on disk, in bytes
pub const ELF_HEADER_SIZE: usize = 52;

/// Size of an ELF32 program header on disk, in bytes
pub const PROGRAM_HEADER_SIZE: usize = 32;

fn u16_at(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes(buf[offset..offset + 2].try_into().unwrap())
}

fn u32_at(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap())
}

/// ELF32 file header, all 52 bytes decoded field by field.  Immutable once
/// parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElfHeader {
    /// e_ident[0..4], expected to be `ELF_MAGIC`
    pub magic: [u8; 4],
    /// e_ident[4], word-size class
    pub class: u8,
    /// e_ident[5], byte order
    pub data: u8,
    /// e_ident[6], first of the two redundant version fields
    pub ident_version: u8,
    /// e_type, object file type
    pub e_type: u16,
    /// e_machine, target architecture
    pub machine: u16,
    /// e_version, second of the two redundant version fields
    pub version: u32,
    /// e_entry, program entry address
    pub entry: u32,
    /// e_phoff, program header table file offset
    pub ph_offset: u32,
    /// e_shoff, section header table file offset
    pub sh_offset: u32,
    /// e_flags, architecture-specific flags
    pub flags: u32,
    /// e_ehsize, declared ELF header size
    pub eh_size: u16,
    /// e_phentsize, declared program header record size
    pub ph_entry_size: u16,
    /// e_phnum, number of program headers
    pub ph_count: u16,
    /// e_shentsize, declared section header record size
    pub sh_entry_size: u16,
    /// e_shnum, number of section headers
    pub sh_count: u16,
    /// e_shstrndx, section name string table index
    pub sh_str_index: u16,
}

impl ElfHeader {
    /// Reads one 52-byte ELF32 header from the stream's current position.
    /// Fails with `UnexpectedEof` if the stream is shorter than that.
    pub fn read_from(stream: &mut impl Read) -> std::io::Result<ElfHeader> {
        let mut buf = [0u8; ELF_HEADER_SIZE];
        stream.read_exact(&mut buf)?;

        Ok(ElfHeader {
            magic: buf[0..4].try_into().unwrap(),
            class: buf[4],
            data: buf[5],
            ident_version: buf[6],
            e_type: u16_at(&buf, 16),
            machine: u16_at(&buf, 18),
            version: u32_at(&buf, 20),
            entry: u32_at(&buf, 24),
            ph_offset: u32_at(&buf, 28),
            sh_offset: u32_at(&buf, 32),
            flags: u32_at(&buf, 36),
            eh_size: u16_at(&buf, 40),
            ph_entry_size: u16_at(&buf, 42),
            ph_count: u16_at(&buf, 44),
            sh_entry_size: u16_at(&buf, 46),
            sh_count: u16_at(&buf, 48),
            sh_str_index: u16_at(&buf, 50),
        })
    }
}

/// ELF32 program header describing one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramHeader {
    /// p_type, segment type; only `PT_LOAD` segments are materialized
    pub p_type: u32,
    /// p_offset, segment data file offset
    pub offset: u32,
    /// p_vaddr, segment virtual address
    pub vaddr: u32,
    /// p_paddr, segment physical address (decoded, not interpreted)
    pub paddr: u32,
    /// p_filesz, bytes of segment data present in the file
    pub file_size: u32,
    /// p_memsz, bytes the segment occupies in memory
    pub mem_size: u32,
    /// p_flags, segment permission flags
    pub flags: u32,
    /// p_align, segment alignment
    pub align: u32,
}

impl ProgramHeader {
    fn read_from(buf: &[u8; PROGRAM_HEADER_SIZE]) -> ProgramHeader {
        ProgramHeader {
            p_type: u32_at(buf, 0),
            offset: u32_at(buf, 4),
            vaddr: u32_at(buf, 8),
            paddr: u32_at(buf, 12),
            file_size: u32_at(buf, 16),
            mem_size: u32_at(buf, 20),
            flags: u32_at(buf, 24),
            align: u32_at(buf, 28),
        }
    }

    /// Seeks to `offset` and reads exactly `count` 32-byte program headers.
    /// Fails with `UnexpectedEof` if the table extends past the end of the
    /// stream.
    pub fn read_table(
        stream: &mut (impl Read + Seek),
        offset: u32,
        count: u16,
    ) -> std::io::Result<Vec<ProgramHeader>> {
        stream.seek(SeekFrom::Start(offset as u64))?;

        let mut table = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let mut buf = [0u8; PROGRAM_HEADER_SIZE];
            stream.read_exact(&mut buf)?;
            table.push(ProgramHeader::read_from(&buf));
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_header_bytes() -> Vec<u8> {
        let mut buf = Vec::with_capacity(ELF_HEADER_SIZE);
        buf.extend_from_slice(&ELF_MAGIC);
        buf.push(ELF_CLASS_32);
        buf.push(ELF_DATA_LSB);
        buf.push(1); // e_ident version
        buf.push(0); // OS/ABI
        buf.extend_from_slice(&[0u8; 8]); // padding
        buf.extend_from_slice(&ET_EXEC.to_le_bytes());
        buf.extend_from_slice(&EM_RISCV.to_le_bytes());
        buf.extend_from_slice(&1u32.to_le_bytes()); // e_version
        buf.extend_from_slice(&0x1000u32.to_le_bytes()); // e_entry
        buf.extend_from_slice(&52u32.to_le_bytes()); // e_phoff
        buf.extend_from_slice(&0u32.to_le_bytes()); // e_shoff
        buf.extend_from_slice(&0u32.to_le_bytes()); // e_flags
        buf.extend_from_slice(&52u16.to_le_bytes()); // e_ehsize
        buf.extend_from_slice(&32u16.to_le_bytes()); // e_phentsize
        buf.extend_from_slice(&3u16.to_le_bytes()); // e_phnum
        buf.extend_from_slice(&40u16.to_le_bytes()); // e_shentsize
        buf.extend_from_slice(&0u16.to_le_bytes()); // e_shnum
        buf.extend_from_slice(&0u16.to_le_bytes()); // e_shstrndx
        buf
    }

    #[test]
    fn test_header_fields_decode_little_endian() {
        let bytes = sample_header_bytes();
        let header = ElfHeader::read_from(&mut Cursor::new(bytes)).unwrap();

        assert_eq!(header.magic, ELF_MAGIC);
        assert_eq!(header.class, ELF_CLASS_32);
        assert_eq!(header.data, ELF_DATA_LSB);
        assert_eq!(header.ident_version, 1);
        assert_eq!(header.e_type, ET_EXEC);
        assert_eq!(header.machine, EM_RISCV);
        assert_eq!(header.version, 1);
        assert_eq!(header.entry, 0x1000);
        assert_eq!(header.ph_offset, 52);
        assert_eq!(header.ph_count, 3);
    }

    #[test]
    fn test_truncated_header_is_unexpected_eof() {
        let mut bytes = sample_header_bytes();
        bytes.truncate(40);
        let err = ElfHeader::read_from(&mut Cursor::new(bytes)).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_program_header_table_reads_exact_count() {
        let mut bytes = vec![0u8; 8]; // table does not have to start at 0
        for index in 0u32..2 {
            bytes.extend_from_slice(&PT_LOAD.to_le_bytes());
            bytes.extend_from_slice(&0x100u32.to_le_bytes());
            bytes.extend_from_slice(&(0x2000 + index * 0x1000).to_le_bytes());
            bytes.extend_from_slice(&0u32.to_le_bytes());
            bytes.extend_from_slice(&16u32.to_le_bytes());
            bytes.extend_from_slice(&32u32.to_le_bytes());
            bytes.extend_from_slice(&5u32.to_le_bytes());
            bytes.extend_from_slice(&4u32.to_le_bytes());
        }

        let table = ProgramHeader::read_table(&mut Cursor::new(bytes), 8, 2).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[0].vaddr, 0x2000);
        assert_eq!(table[1].vaddr, 0x3000);
        assert_eq!(table[1].file_size, 16);
        assert_eq!(table[1].mem_size, 32);
    }

    #[test]
    fn test_truncated_table_is_unexpected_eof() {
        let bytes = vec![0u8; PROGRAM_HEADER_SIZE + 10];
        let err = ProgramHeader::read_table(&mut Cursor::new(bytes), 0, 2).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }
}
