//! OCI image access for modelcar extraction.
//!
//! ```text
//!  reference ──► ImageFetcher ──► manifest, config blob, layers
//!                                        │
//!                     locator ◄──────────┘  (annotation match)
//!                        │
//!                  fetch_blob ──► BlobCache
//!                        │
//!                scan_doc_archive ──► DocFile
//! ```

pub mod archive;
pub mod fetch;
pub mod locator;
pub mod reference;
pub mod registry;
pub mod timestamps;

pub use archive::{resolve_within, sanitize_entry_path, scan_doc_archive, DocFile};
pub use fetch::{FetchedImage, ImageFetcher};
pub use locator::{doc_layer_candidates, fetch_blob, is_doc_layer, locate_doc_layer, BlobCache};
pub use reference::{sanitize_reference, ImageReference};
pub use registry::{
    LayerDescriptor, OciRegistry, Registry, RegistryAuth, RegistrySession, SessionGuard,
};
pub use timestamps::{parse_timestamp, ImageTimestamps};
