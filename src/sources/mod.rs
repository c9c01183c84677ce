pub mod file;
pub mod memory;

pub use file::FileSource;
pub use memory::MemorySource;
