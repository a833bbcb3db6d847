use indexmap::IndexMap;
use serde::Deserialize;

mod accessor;
mod buffers;

pub use accessor::{Accessor, BufferView, ComponentType, Dimensions};
pub use buffers::BufferStore;

#[remain::sorted]
#[derive(Debug, thiserror::Error)]
pub enum Err {
    /// Invalid component type code
    #[error("invalid component type code: {0}")]
    InvalidComponentType(u32),
    /// Invalid accessor type name
    #[error("invalid accessor type: {0}")]
    InvalidDimensions(String),
    /// The JSON shape does not match the document schema
    #[error("document does not match schema: {0}")]
    Schema(#[from] serde_json::Error),
}

/// Metadata for one buffer. The bytes themselves live in the
/// [`BufferStore`]; buffers synthesized during decompression have no URI.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buffer {
    pub byte_length: usize,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Buffer {
    /// Metadata for a buffer created by the rewriter rather than the source
    /// document.
    pub fn synthetic(byte_length: usize) -> Self {
        Self {
            byte_length,
            uri: None,
            name: None,
        }
    }
}

/// One drawable unit inside a mesh: semantic attribute name → accessor
/// index, an optional indices accessor, and per-extension payloads keyed by
/// extension name. Attribute maps keep insertion order so a decompression
/// pass numbers its new buffers deterministically.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Primitive {
    #[serde(default)]
    pub attributes: IndexMap<String, usize>,
    #[serde(default)]
    pub indices: Option<usize>,
    #[serde(default)]
    pub material: Option<usize>,
    #[serde(default = "default_mode")]
    pub mode: u32,
    #[serde(default)]
    pub extensions: IndexMap<String, serde_json::Value>,
    /// Set once a compression handler has rewritten this primitive, so a
    /// second pass over the same document is a no-op. Not part of the
    /// document schema.
    #[serde(skip)]
    pub(crate) decompressed: bool,
}

fn default_mode() -> u32 {
    4 // triangles
}

impl Primitive {
    /// Whether a decompression handler has already rewritten this primitive.
    pub fn is_decompressed(&self) -> bool {
        self.decompressed
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Mesh {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub primitives: Vec<Primitive>,
}

/// Typed mirror of the parsed document. Owns every buffer, buffer view,
/// accessor, and mesh; collection indices are assigned at parse time and
/// change only by append.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub buffers: Vec<Buffer>,
    #[serde(default)]
    pub buffer_views: Vec<BufferView>,
    #[serde(default)]
    pub accessors: Vec<Accessor>,
    #[serde(default)]
    pub meshes: Vec<Mesh>,
    #[serde(default)]
    pub extensions_used: Vec<String>,
    #[serde(default)]
    pub extensions_required: Vec<String>,
}

impl Document {
    /// Validates an already-parsed JSON value into the typed document. This
    /// is the single ingestion boundary; everything past it operates on
    /// typed structures. Fields outside the geometry schema are ignored.
    pub fn from_value(value: serde_json::Value) -> Result<Self, Err> {
        Ok(serde_json::from_value(value)?)
    }

    /// Validates raw document JSON into the typed document.
    pub fn from_slice(json: &[u8]) -> Result<Self, Err> {
        Ok(serde_json::from_slice(json)?)
    }

    pub fn accessor(&self, index: usize) -> Option<&Accessor> {
        self.accessors.get(index)
    }

    pub fn accessor_mut(&mut self, index: usize) -> Option<&mut Accessor> {
        self.accessors.get_mut(index)
    }

    pub fn buffer_view(&self, index: usize) -> Option<&BufferView> {
        self.buffer_views.get(index)
    }

    /// Appends a buffer view and returns its index.
    pub fn push_buffer_view(&mut self, view: BufferView) -> usize {
        self.buffer_views.push(view);
        self.buffer_views.len() - 1
    }

    /// Appends the bytes of a synthesized buffer to `store` and mirrors its
    /// metadata here, keeping the two collections in lock step. Returns the
    /// new buffer index.
    pub fn push_buffer(&mut self, store: &mut BufferStore, bytes: Vec<u8>) -> usize {
        let byte_length = bytes.len();
        let index = store.push(bytes);
        self.buffers.push(Buffer::synthetic(byte_length));
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_a_minimal_document() {
        let doc = Document::from_value(json!({
            "asset": {"version": "2.0"},
            "buffers": [{"byteLength": 16}],
            "bufferViews": [
                {"buffer": 0, "byteOffset": 4, "byteLength": 12}
            ],
            "accessors": [
                {"bufferView": 0, "componentType": 5126, "count": 1, "type": "VEC3"}
            ],
            "meshes": [
                {"name": "tri", "primitives": [
                    {"attributes": {"POSITION": 0}, "indices": 0}
                ]}
            ],
            "extensionsUsed": ["KHR_draco_mesh_compression"]
        }))
        .unwrap();

        assert_eq!(doc.buffers[0].byte_length, 16);
        assert_eq!(doc.buffer_views[0].byte_offset, 4);
        assert_eq!(doc.accessors[0].component_type, ComponentType::Float);
        assert_eq!(doc.accessors[0].dimensions, Dimensions::Vec3);
        assert_eq!(doc.accessors[0].byte_offset, 0);
        assert_eq!(doc.meshes[0].primitives[0].attributes["POSITION"], 0);
        assert_eq!(doc.meshes[0].primitives[0].mode, 4);
        assert!(!doc.meshes[0].primitives[0].is_decompressed());
    }

    #[test]
    fn rejects_unknown_component_type() {
        let result = Document::from_value(json!({
            "accessors": [
                {"componentType": 9999, "count": 1, "type": "SCALAR"}
            ]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn push_buffer_keeps_metadata_and_bytes_aligned() {
        let mut doc = Document::default();
        let mut store = BufferStore::new();
        store.push(vec![0u8; 8]);
        doc.buffers.push(Buffer::synthetic(8));

        let index = doc.push_buffer(&mut store, vec![1, 2, 3, 4]);
        assert_eq!(index, 1);
        assert_eq!(doc.buffers.len(), store.len());
        assert_eq!(doc.buffers[1].byte_length, 4);
        assert!(doc.buffers[1].uri.is_none());
    }
}
