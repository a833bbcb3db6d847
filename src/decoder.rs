use crate::document::{ComponentType, Dimensions};

#[remain::sorted]
#[derive(Debug, thiserror::Error)]
pub enum Err {
    /// The codec decoded the blob but holds no attribute under this id
    #[error("no decoded attribute with codec id {0}")]
    AttributeNotDecoded(u32),
    /// The decoded data cannot be materialized at the requested layout
    #[error("attribute {codec_id} cannot be read as {component_type:?} {dimensions:?}")]
    IncompatibleLayout {
        codec_id: u32,
        component_type: ComponentType,
        dimensions: Dimensions,
    },
    /// The blob is not valid for this codec
    #[error("malformed compressed blob: {0}")]
    MalformedBlob(String),
    /// Indices cannot be produced at the requested integer width
    #[error("indices cannot be read as {0:?}")]
    UnsupportedIndexWidth(ComponentType),
}

/// Entry point of the codec wrapped by the decompression pipeline.
///
/// The pipeline never looks inside the compressed bitstream itself; it hands
/// the blob sliced from the document's buffers to `decode` and works with the
/// returned session. Handlers receive their decoder by injection so tests
/// can substitute fakes.
pub trait MeshDecoder {
    /// Parses codec-specific framing and decodes the blob into a scoped
    /// session. Fails if the blob is malformed or the codec signature does
    /// not match.
    fn decode(&self, data: &[u8]) -> Result<Box<dyn DecodedMesh>, Err>;
}

/// One decoded mesh, alive only while its streams are copied out.
///
/// Streams are materialized in two steps mirroring the codec binding this
/// design wraps: a `read_*` call fixes the output layout, then the byte
/// length and copy accessors size and fill the destination buffer. `copy_*`
/// callers must pass a destination whose length equals the corresponding
/// byte length. The session holds no references into the document and is
/// dropped once every needed stream has been copied.
pub trait DecodedMesh {
    /// Number of vertices in the decoded geometry.
    fn vertex_count(&self) -> usize;

    /// Number of indices in the decoded geometry.
    fn index_count(&self) -> usize;

    /// Materializes the index stream at the requested integer width.
    fn read_indices(&mut self, component_type: ComponentType) -> Result<(), Err>;

    /// Byte length of the index stream materialized by `read_indices`.
    fn index_byte_length(&self) -> usize;

    /// Copies the materialized index stream into `out`.
    fn copy_indices(&self, out: &mut [u8]);

    /// Materializes one attribute's vertex data at the requested layout.
    fn read_attribute(
        &mut self,
        codec_id: u32,
        component_type: ComponentType,
        dimensions: Dimensions,
    ) -> Result<(), Err>;

    /// Byte length of the attribute stream materialized by `read_attribute`.
    fn attribute_byte_length(&self, codec_id: u32) -> usize;

    /// Copies the materialized attribute stream into `out`.
    fn copy_attribute(&self, codec_id: u32, out: &mut [u8]);
}
