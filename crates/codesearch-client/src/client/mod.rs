//! Client module for the code search service.

pub mod grpc;
