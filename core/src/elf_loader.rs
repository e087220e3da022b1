//! Trusted loader turning an untrusted RISC-V ELF into the deterministic
//! initial machine state consumed by the proving pipeline.
//!
//! The loader is the sole trust boundary between an attacker-controlled file
//! and the prover/verifier pair, which must agree bit for bit on the guest's
//! initial memory and entry point.  Validation is strict and ordered; the
//! first failure aborts the whole load and no partial image ever escapes.

use std::{
    fs::File,
    io::{BufReader, Cursor, Read, Seek, SeekFrom},
    path::Path,
};

use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    ElfHeader, MemImage, ProgramHeader, ELF_CLASS_32, ELF_DATA_LSB, ELF_MAGIC, ELF_VERSION,
    EM_RISCV, ET_EXEC, MAX_SEGMENTS, PT_LOAD, WORD_SIZE,
};

/// Reason a guest ELF was rejected.  Every variant is fatal to the load; the
/// proving pipeline must halt on any of them.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed reading {0}: {1}")]
    Io(String, #[source] std::io::Error),
    #[error("Invalid ELF format: {0}")]
    InvalidFormat(&'static str),
    #[error("Invalid entry point 0x{0:08x}")]
    InvalidEntryPoint(u32),
    #[error("Too many segments: {0}")]
    TooManySegments(usize),
    #[error("Segment {index} memory size 0x{mem_size:x} exceeds the memory limit")]
    SegmentTooLarge { index: usize, mem_size: u32 },
    #[error("Segment {index} at 0x{vaddr:08x} with memory size 0x{mem_size:x} ends outside the address space")]
    SegmentOutOfRange { index: usize, vaddr: u32, mem_size: u32 },
    #[error("Segment {index} virtual address 0x{vaddr:08x} is not word-aligned")]
    SegmentMisaligned { index: usize, vaddr: u32 },
    #[error("Segment {index} file size 0x{file_size:x} exceeds its memory size 0x{mem_size:x}")]
    SegmentFileTooLarge { index: usize, file_size: u32, mem_size: u32 },
    #[error("Segments overlap at address 0x{0:08x}")]
    OverlappingSegments(u32),
}

/// A validated guest program: entry address plus initial memory image.  The
/// only artifact the execution-trace and proving subsystem consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestProgram {
    /// Address of the first instruction to execute
    pub entry: u32,
    /// Initial memory contents, one little-endian word per loaded address
    pub image: MemImage,
}

/// Loads and validates a guest ELF from an open stream.
///
/// `max_mem` is the exclusive upper bound of the emulated address space,
/// supplied by the caller and never discovered from the file.  Identical
/// stream bytes and `max_mem` always produce an identical result.
pub fn load_elf(
    stream: &mut (impl Read + Seek),
    max_mem: u32,
) -> Result<GuestProgram, LoadError> {
    stream
        .seek(SeekFrom::Start(0))
        .map_err(|e| LoadError::Io("ELF stream".to_string(), e))?;

    let header = ElfHeader::read_from(stream)
        .map_err(|e| LoadError::Io("ELF header".to_string(), e))?;

    if header.magic != ELF_MAGIC {
        return Err(LoadError::InvalidFormat("bad magic signature"));
    }
    if header.class != ELF_CLASS_32 {
        return Err(LoadError::InvalidFormat("not a 32-bit image"));
    }
    if header.data != ELF_DATA_LSB {
        return Err(LoadError::InvalidFormat("not a little-endian image"));
    }
    // Both redundant version fields must agree on the only defined version
    if header.ident_version as u32 != ELF_VERSION || header.version != ELF_VERSION {
        return Err(LoadError::InvalidFormat("unsupported ELF version"));
    }
    if header.e_type != ET_EXEC {
        return Err(LoadError::InvalidFormat("not an executable image"));
    }
    if header.machine != EM_RISCV {
        return Err(LoadError::InvalidFormat("not a RISC-V image"));
    }

    // The top word of the address space is unusable on purpose: the bound is
    // strict for the entry point and for segment ends alike
    if header.entry >= max_mem || header.entry % WORD_SIZE as u32 != 0 {
        return Err(LoadError::InvalidEntryPoint(header.entry));
    }

    // Resource bound, enforced before the table buffer is allocated
    if header.ph_count as usize > MAX_SEGMENTS {
        return Err(LoadError::TooManySegments(header.ph_count as usize));
    }

    debug!("Accepted guest ELF header entry=0x{:08x} segments={}", header.entry, header.ph_count);

    let table = ProgramHeader::read_table(stream, header.ph_offset, header.ph_count)
        .map_err(|e| LoadError::Io("program header table".to_string(), e))?;

    let mut image = MemImage::new();

    for (index, ph) in table.iter().enumerate() {
        if ph.p_type != PT_LOAD {
            trace!("Skipping non-loadable segment {} type={}", index, ph.p_type);
            continue;
        }

        if ph.mem_size > max_mem {
            return Err(LoadError::SegmentTooLarge { index, mem_size: ph.mem_size });
        }
        // 64-bit arithmetic so a hostile vaddr/mem_size pair cannot wrap
        if ph.vaddr as u64 + ph.mem_size as u64 >= max_mem as u64 {
            return Err(LoadError::SegmentOutOfRange {
                index,
                vaddr: ph.vaddr,
                mem_size: ph.mem_size,
            });
        }
        if ph.vaddr % WORD_SIZE as u32 != 0 {
            return Err(LoadError::SegmentMisaligned { index, vaddr: ph.vaddr });
        }
        if ph.file_size > ph.mem_size {
            return Err(LoadError::SegmentFileTooLarge {
                index,
                file_size: ph.file_size,
                mem_size: ph.mem_size,
            });
        }

        trace!(
            "Loading segment {} vaddr=0x{:08x} file_size={} mem_size={}",
            index,
            ph.vaddr,
            ph.file_size,
            ph.mem_size
        );

        stream
            .seek(SeekFrom::Start(ph.offset as u64))
            .map_err(|e| LoadError::Io(format!("segment {index} data"), e))?;

        let mut i = 0u32;
        while i < ph.mem_size {
            let addr = ph.vaddr + i;
            if image.contains(addr) {
                return Err(LoadError::OverlappingSegments(addr));
            }

            let word = if i >= ph.file_size {
                // Zero-fill ("BSS") region past the on-disk content
                0
            } else {
                let len = (ph.file_size - i).min(WORD_SIZE as u32) as usize;
                let mut buf = [0u8; WORD_SIZE];
                stream
                    .read_exact(&mut buf[..len])
                    .map_err(|e| LoadError::Io(format!("segment {index} data"), e))?;
                u32::from_le_bytes(buf)
            };

            image.insert(addr, word);
            i += WORD_SIZE as u32;
        }
    }

    debug!("Guest program loaded with {} initialized words", image.len());

    Ok(GuestProgram { entry: header.entry, image })
}

/// Loads a guest ELF from an in-memory byte buffer.
pub fn load_elf_bytes(bytes: &[u8], max_mem: u32) -> Result<GuestProgram, LoadError> {
    load_elf(&mut Cursor::new(bytes), max_mem)
}

/// Loads a guest ELF from a file on disk.
pub fn load_elf_file(path: &Path, max_mem: u32) -> Result<GuestProgram, LoadError> {
    let file =
        File::open(path).map_err(|e| LoadError::Io(path.display().to_string(), e))?;
    load_elf(&mut BufReader::new(file), max_mem)
}
