//! Request extractors shared by the handlers.

pub mod caller;

pub use caller::{CallerContext, CollectionContext, COLLECTION_ID_HEADER, OWNER_ID_HEADER};
