//! Buffer backend implementations
//!
//! Contains MemoryBuffer and FileBuffer plus the backend factory.

mod file;
mod memory;

pub use self::file::FileBuffer;
pub use self::memory::MemoryBuffer;

use contracts::{BufferBackend, BufferOptions, RecordBuffer};

use crate::error::DispatcherError;

/// Create a buffer backend from configuration
pub fn create_buffer(
    name: &str,
    options: &BufferOptions,
) -> Result<Box<dyn RecordBuffer>, DispatcherError> {
    if options.capacity == 0 {
        return Err(DispatcherError::engine_creation(
            name,
            "buffer capacity must be > 0",
        ));
    }

    match options.backend {
        BufferBackend::Memory => Ok(Box::new(MemoryBuffer::new(name, options.capacity))),
        BufferBackend::File => {
            let path = options.path.as_ref().ok_or_else(|| {
                DispatcherError::engine_creation(name, "file buffer backend requires a path")
            })?;
            let buffer = FileBuffer::open(name, options.capacity, path)
                .map_err(|e| DispatcherError::engine_creation(name, e.to_string()))?;
            Ok(Box::new(buffer))
        }
    }
}
