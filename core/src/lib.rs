//! Contains the trusted guest-program loader and the data model shared with the
//! proving and verification pipeline: ELF parsing, the sparse initial memory
//! image, and the method identifier naming a guest program per proof-size tier.
pub mod definitions;
mod elf_format;
mod elf_loader;
mod mem_image;
mod method_id;

pub use definitions::*;
pub use elf_format::*;
pub use elf_loader::*;
pub use mem_image::*;
pub use method_id::*;
