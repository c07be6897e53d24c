pub mod analyze;
pub mod document_delete;
pub mod document_get;
pub mod document_list;
pub mod document_stream;
pub mod document_upload;
