use indexmap::IndexMap;
use serde::Deserialize;

use super::{Err, ExtensionRegistry, PrimitiveHandler};
use crate::decoder::MeshDecoder;
use crate::document::{BufferStore, BufferView, Document};

/// Canonical name of the Draco mesh-compression extension.
pub const EXTENSION_NAME: &str = "KHR_draco_mesh_compression";

/// The extension payload carried by a compressed primitive: the view holding
/// the compressed blob, and a map from the primitive's semantic attribute
/// names to the codec-internal ids addressing the decoded data. The map keeps
/// the document's declaration order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompressedMeshInfo {
    buffer_view: usize,
    #[serde(default)]
    attributes: IndexMap<String, u32>,
}

/// Handles `KHR_draco_mesh_compression`.
///
/// Moves decoded index and vertex data into new buffers and buffer views and
/// repoints the accessors of the given primitive, so the document becomes
/// self-consistent with no remaining trace of compression at the accessor
/// level. The codec itself is injected through [`MeshDecoder`].
pub struct DracoHandler<D> {
    decoder: D,
}

impl<D: MeshDecoder> DracoHandler<D> {
    pub fn new(decoder: D) -> Self {
        Self { decoder }
    }
}

impl<D: MeshDecoder + 'static> DracoHandler<D> {
    /// Registers this handler under the canonical extension name.
    pub fn register(decoder: D, registry: &mut ExtensionRegistry) {
        registry.register(EXTENSION_NAME, Box::new(Self::new(decoder)));
    }
}

impl<D: MeshDecoder> PrimitiveHandler for DracoHandler<D> {
    fn decompress(
        &self,
        document: &mut Document,
        store: &mut BufferStore,
        mesh: usize,
        primitive: usize,
    ) -> Result<(), Err> {
        let info = parse_payload(document, mesh, primitive)?;

        // Everything the rewrite will touch is validated before the first
        // mutation, so inconsistency failures leave the document as it was.
        let indices_accessor_index = validate(document, mesh, primitive, &info)?;

        // Decode the compressed blob sliced out of the referenced buffer.
        // The session owns its decoded state; the borrow of the store ends
        // here and the rewrite below is free to append to it.
        let mut decoded = {
            let view = document
                .buffer_view(info.buffer_view)
                .ok_or_else(|| inconsistent(mesh, primitive, "buffer view vanished"))?;
            let blob = store.slice(view).ok_or_else(|| {
                inconsistent(
                    mesh,
                    primitive,
                    format!(
                        "buffer view {} is outside buffer {}",
                        info.buffer_view, view.buffer
                    ),
                )
            })?;
            self.decoder
                .decode(blob)
                .map_err(|source| decode_failure(mesh, primitive, source))?
        };

        // Indices. The decoded geometry is authoritative over the document's
        // stated count.
        let index_component_type = {
            let accessor = document
                .accessor_mut(indices_accessor_index)
                .ok_or_else(|| inconsistent(mesh, primitive, "indices accessor vanished"))?;
            if accessor.count != decoded.index_count() {
                accessor.count = decoded.index_count();
            }
            accessor.component_type
        };

        decoded
            .read_indices(index_component_type)
            .map_err(|source| decode_failure(mesh, primitive, source))?;
        let mut index_bytes = vec![0u8; decoded.index_byte_length()];
        decoded.copy_indices(&mut index_bytes);

        splice_stream(
            document,
            store,
            indices_accessor_index,
            index_bytes,
            "index buffer view".to_string(),
        );

        // Attributes, in the payload's declaration order.
        for (semantic, &codec_id) in &info.attributes {
            let accessor_index = document.meshes[mesh].primitives[primitive]
                .attributes
                .get(semantic)
                .copied()
                .ok_or_else(|| {
                    inconsistent(
                        mesh,
                        primitive,
                        format!("attribute {} vanished from the primitive", semantic),
                    )
                })?;

            let (component_type, dimensions) = {
                let accessor = document.accessor_mut(accessor_index).ok_or_else(|| {
                    inconsistent(
                        mesh,
                        primitive,
                        format!("accessor {} for attribute {} vanished", accessor_index, semantic),
                    )
                })?;
                if accessor.count != decoded.vertex_count() {
                    accessor.count = decoded.vertex_count();
                }
                (accessor.component_type, accessor.dimensions)
            };

            decoded
                .read_attribute(codec_id, component_type, dimensions)
                .map_err(|source| decode_failure(mesh, primitive, source))?;
            let mut attribute_bytes = vec![0u8; decoded.attribute_byte_length(codec_id)];
            decoded.copy_attribute(codec_id, &mut attribute_bytes);

            splice_stream(
                document,
                store,
                accessor_index,
                attribute_bytes,
                format!("{} buffer view", semantic),
            );
        }

        Ok(())
    }
}

/// Appends one decoded stream as a new buffer plus a view spanning it
/// exactly, and repoints the accessor at the view's start.
fn splice_stream(
    document: &mut Document,
    store: &mut BufferStore,
    accessor_index: usize,
    bytes: Vec<u8>,
    view_name: String,
) {
    let byte_length = bytes.len();
    let buffer_index = document.push_buffer(store, bytes);
    let view_index =
        document.push_buffer_view(BufferView::spanning(buffer_index, byte_length, view_name));
    if let Some(accessor) = document.accessor_mut(accessor_index) {
        accessor.repoint(view_index);
    }
}

fn parse_payload(
    document: &Document,
    mesh: usize,
    primitive: usize,
) -> Result<CompressedMeshInfo, Err> {
    let prim = document
        .meshes
        .get(mesh)
        .and_then(|m| m.primitives.get(primitive))
        .ok_or_else(|| inconsistent(mesh, primitive, "primitive index out of range"))?;

    let value = prim.extensions.get(EXTENSION_NAME).ok_or_else(|| {
        inconsistent(
            mesh,
            primitive,
            format!("primitive does not declare {}", EXTENSION_NAME),
        )
    })?;

    serde_json::from_value(value.clone()).map_err(|e| {
        inconsistent(
            mesh,
            primitive,
            format!("malformed {} payload: {}", EXTENSION_NAME, e),
        )
    })
}

/// Checks every index the rewrite will follow: the compressed blob's view
/// and range, the indices accessor, and each extension attribute against the
/// primitive's own attribute map. Returns the indices accessor index.
fn validate(
    document: &Document,
    mesh: usize,
    primitive: usize,
    info: &CompressedMeshInfo,
) -> Result<usize, Err> {
    let prim = &document.meshes[mesh].primitives[primitive];

    let view = document.buffer_view(info.buffer_view).ok_or_else(|| {
        inconsistent(
            mesh,
            primitive,
            format!("extension references missing buffer view {}", info.buffer_view),
        )
    })?;
    if view.buffer >= document.buffers.len() {
        return Err(inconsistent(
            mesh,
            primitive,
            format!("buffer view {} references missing buffer {}", info.buffer_view, view.buffer),
        ));
    }

    let indices_accessor_index = prim.indices.ok_or_else(|| {
        inconsistent(mesh, primitive, "compressed primitive has no indices accessor")
    })?;
    if document.accessor(indices_accessor_index).is_none() {
        return Err(inconsistent(
            mesh,
            primitive,
            format!("missing indices accessor {}", indices_accessor_index),
        ));
    }

    for semantic in info.attributes.keys() {
        let accessor_index = prim.attributes.get(semantic).copied().ok_or_else(|| {
            inconsistent(
                mesh,
                primitive,
                format!("extension attribute {} is not in the primitive's attributes", semantic),
            )
        })?;
        if document.accessor(accessor_index).is_none() {
            return Err(inconsistent(
                mesh,
                primitive,
                format!("attribute {} references missing accessor {}", semantic, accessor_index),
            ));
        }
    }

    Ok(indices_accessor_index)
}

fn inconsistent(mesh: usize, primitive: usize, detail: impl Into<String>) -> Err {
    Err::InconsistentExtension {
        mesh,
        primitive,
        detail: detail.into(),
    }
}

fn decode_failure(mesh: usize, primitive: usize, source: crate::decoder::Err) -> Err {
    Err::DecodeFailure {
        mesh,
        primitive,
        source,
    }
}
