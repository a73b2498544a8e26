//! Files as the engine sees them: an ownership pair of project root and
//! normalized relative path, an async I/O seam, and the filename resolution
//! cascade that maps model-supplied names onto real files.

pub mod io;
pub mod project;
pub mod resolve;

pub use io::{DiskIo, FileIo};
pub use project::ProjectFile;
pub use resolve::{resolve_filename, Resolution};
