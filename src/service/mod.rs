//! Operations spanning more than one repository.

pub mod documents;
pub mod library;

pub use documents::DocumentService;
pub use library::LibraryService;
