//! Wire messages of the `blog.BlogService` gRPC service and their mapping to the models

pub mod mapping;

#[allow(clippy::all)]
pub mod blog {
    include!(concat!(env!("OUT_DIR"), "/blog.rs"));
}

/// Encoded descriptors of `proto/blog.proto`, served by the reflection service
pub const FILE_DESCRIPTOR_SET: &[u8] =
    include_bytes!(concat!(env!("OUT_DIR"), "/blog_descriptor.bin"));
