// lib.rs

//! Normalizes the geometry of a parsed glTF-style document so that every mesh
//! primitive references plain, byte-addressable vertex and index data.
//!
//! Primitives that store their geometry through a mesh-compression extension
//! (canonically `KHR_draco_mesh_compression`) are decoded and the document's
//! buffer → buffer-view → accessor indirection graph is rewritten in place:
//! each decoded stream becomes a freshly appended buffer, a buffer view
//! spanning it exactly, and a repointed accessor with a zero byte offset.
//! Downstream scene construction never learns that compression was involved.
//!
//! Document parsing (file and GLB unpacking, URI resolution) and scene-graph
//! construction are collaborators, not part of this crate; the entry point
//! takes an already-parsed [`document::Document`] plus a
//! [`document::BufferStore`] seeded with the resolved buffer bytes.

/// Typed in-memory mirror of the document: buffers, buffer views, accessors,
/// meshes and their primitives, plus the buffer-index → bytes store.
pub mod document;

/// The codec seam: traits for decoding a compressed blob into index and
/// per-attribute vertex streams.
pub mod decoder;

/// Extension dispatch and the handlers that rewrite the indirection graph.
pub mod extensions;

pub use extensions::decompress_document;

/// Contains the most commonly used traits, types, and objects.
pub mod prelude {
    pub use crate::document::{
        Accessor, Buffer, BufferStore, BufferView, ComponentType, Dimensions, Document, Mesh,
        Primitive,
    };
    pub use crate::decoder::{DecodedMesh, MeshDecoder};
    pub use crate::extensions::{decompress_document, draco::DracoHandler, ExtensionRegistry};
}
