//! Concrete implementations of the [`jitw_core::PlatformClient`] facade:
//! a real gRPC client (component A) and an in-memory test double.

#![deny(unsafe_code)]

mod convert;
mod identity;

pub mod grpc;
pub mod mock;

/// Generated wire types for the `jitwatcher.v1.AccessPlatform` service.
pub mod proto {
    tonic::include_proto!("jitwatcher.v1");
}

pub use grpc::GrpcPlatformClient;
pub use mock::MockPlatformClient;
pub use jitw_core::{Lock, PlatformClient, PlatformError, SettableState};
