//! Binary container formats

pub mod elf;
