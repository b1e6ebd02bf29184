//! Generated Protocol Buffer code for the `SymbolSearchService` gRPC service.
//!
//! It is generated from `src/proto/codesearch.proto`.

pub mod codesearch {
    include!(concat!(env!("OUT_DIR"), "/codesearch.rs"));
}

pub use codesearch::symbol_search_service_client;
pub use codesearch::symbol_search_service_server;

/// Encoded file descriptor set, registered with the reflection service.
pub const FILE_DESCRIPTOR_SET: &[u8] = include_bytes!(concat!(
    env!("OUT_DIR"),
    "/codesearch_descriptor.bin"
));
