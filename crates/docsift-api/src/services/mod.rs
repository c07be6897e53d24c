pub mod document_index;
pub mod document_service;

pub use document_index::{DocumentIndex, IndexedDocument};
pub use document_service::{DocumentAccess, DocumentService, UploadedFile};
