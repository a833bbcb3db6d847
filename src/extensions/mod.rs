use indexmap::IndexMap;

use crate::decoder;
use crate::document::{BufferStore, Document};

pub mod draco;

#[remain::sorted]
#[derive(Debug, thiserror::Error)]
pub enum Err {
    /// The codec rejected the blob or could not produce a stream at the
    /// requested layout. Fatal for the load; no partial mesh is emitted.
    #[error("mesh {mesh} primitive {primitive}: {source}")]
    DecodeFailure {
        mesh: usize,
        primitive: usize,
        source: decoder::Err,
    },
    /// The extension payload contradicts the primitive's own declarations
    /// or references entities the document does not have.
    #[error("mesh {mesh} primitive {primitive}: {detail}")]
    InconsistentExtension {
        mesh: usize,
        primitive: usize,
        detail: String,
    },
    /// A required extension has no registered handler, or one primitive
    /// declares more than one compression extension.
    #[error("unsupported extension: {0}")]
    UnsupportedExtension(String),
}

/// Rewrites one compressed primitive so its accessors reference plain,
/// uncompressed buffers. Implementations mutate the document and buffer
/// store in place and leave both untouched on inconsistency errors raised
/// before decoding starts.
pub trait PrimitiveHandler {
    fn decompress(
        &self,
        document: &mut Document,
        store: &mut BufferStore,
        mesh: usize,
        primitive: usize,
    ) -> Result<(), Err>;
}

/// Explicit table of extension-name → decompression handler.
///
/// The registry is passed into [`decompress_document`] rather than living in
/// process-wide state, so callers control exactly which extensions are
/// handled and tests can supply fakes. Extensions the caller supports
/// outside this crate (materials, quantization, ...) are declared with
/// [`ExtensionRegistry::allow`] so the required-extension gate accepts them.
#[derive(Default)]
pub struct ExtensionRegistry {
    handlers: IndexMap<String, Box<dyn PrimitiveHandler>>,
    allowed: Vec<String>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a decompression handler under an extension name.
    pub fn register(&mut self, name: impl Into<String>, handler: Box<dyn PrimitiveHandler>) {
        self.handlers.insert(name.into(), handler);
    }

    /// Declares an extension as supported by a downstream collaborator, so
    /// its presence in `extensionsRequired` is not an error here.
    pub fn allow(&mut self, name: impl Into<String>) {
        self.allowed.push(name.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn handler(&self, name: &str) -> Option<&dyn PrimitiveHandler> {
        self.handlers.get(name).map(|handler| handler.as_ref())
    }

    fn is_allowed(&self, name: &str) -> bool {
        self.allowed.iter().any(|a| a == name)
    }
}

/// Decompresses every compressed primitive in the document, in place.
///
/// After a successful pass every affected accessor references a freshly
/// appended buffer through a view spanning it exactly, with a zero byte
/// offset. `extensionsUsed`/`extensionsRequired` bookkeeping is left for the
/// caller to strip if desired. Primitives already rewritten by an earlier
/// pass are skipped, so running the pass twice over one document is a no-op.
pub fn decompress_document(
    document: &mut Document,
    store: &mut BufferStore,
    registry: &ExtensionRegistry,
) -> Result<(), Err> {
    check_required_extensions(document, registry)?;

    for mesh_index in 0..document.meshes.len() {
        for primitive_index in 0..document.meshes[mesh_index].primitives.len() {
            let primitive = &document.meshes[mesh_index].primitives[primitive_index];
            if primitive.decompressed {
                continue;
            }

            let matching: Vec<String> = primitive
                .extensions
                .keys()
                .filter(|name| registry.contains(name))
                .cloned()
                .collect();

            match matching.as_slice() {
                [] => continue,
                [name] => {
                    if let Some(handler) = registry.handler(name) {
                        handler.decompress(document, store, mesh_index, primitive_index)?;
                        document.meshes[mesh_index].primitives[primitive_index].decompressed =
                            true;
                    }
                }
                names => {
                    return Err(Err::UnsupportedExtension(format!(
                        "mesh {} primitive {} declares more than one compression extension: {}",
                        mesh_index,
                        primitive_index,
                        names.join(", ")
                    )));
                }
            }
        }
    }

    Ok(())
}

/// Fails if the document requires an extension this load cannot honor:
/// neither a registered handler nor an allowance from the caller.
fn check_required_extensions(
    document: &Document,
    registry: &ExtensionRegistry,
) -> Result<(), Err> {
    for name in &document.extensions_required {
        if !registry.contains(name) && !registry.is_allowed(name) {
            return Err(Err::UnsupportedExtension(format!(
                "required extension {} has no registered handler",
                name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingHandler {
        calls: Rc<Cell<usize>>,
    }

    impl PrimitiveHandler for CountingHandler {
        fn decompress(
            &self,
            _document: &mut Document,
            _store: &mut BufferStore,
            _mesh: usize,
            _primitive: usize,
        ) -> Result<(), Err> {
            self.calls.set(self.calls.get() + 1);
            Ok(())
        }
    }

    fn document_with_extensions(extensions: serde_json::Value) -> Document {
        Document::from_value(json!({
            "meshes": [{"primitives": [{"attributes": {}, "extensions": extensions}]}]
        }))
        .unwrap()
    }

    #[test]
    fn dispatches_to_the_registered_handler_once() {
        let calls = Rc::new(Cell::new(0));
        let mut registry = ExtensionRegistry::new();
        registry.register(
            "FAKE_compression",
            Box::new(CountingHandler {
                calls: Rc::clone(&calls),
            }),
        );

        let mut document = document_with_extensions(json!({"FAKE_compression": {}}));
        let mut store = BufferStore::new();

        decompress_document(&mut document, &mut store, &registry).unwrap();
        assert_eq!(calls.get(), 1);
        assert!(document.meshes[0].primitives[0].is_decompressed());

        // Second pass must not re-trigger the handler.
        decompress_document(&mut document, &mut store, &registry).unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn primitives_without_compression_are_left_alone() {
        let calls = Rc::new(Cell::new(0));
        let mut registry = ExtensionRegistry::new();
        registry.register(
            "FAKE_compression",
            Box::new(CountingHandler {
                calls: Rc::clone(&calls),
            }),
        );

        let mut document = document_with_extensions(json!({"OTHER_extension": {}}));
        let mut store = BufferStore::new();

        decompress_document(&mut document, &mut store, &registry).unwrap();
        assert_eq!(calls.get(), 0);
        assert!(!document.meshes[0].primitives[0].is_decompressed());
    }

    #[test]
    fn conflicting_compression_extensions_fail() {
        let calls = Rc::new(Cell::new(0));
        let mut registry = ExtensionRegistry::new();
        for name in ["FAKE_compression_a", "FAKE_compression_b"] {
            registry.register(
                name,
                Box::new(CountingHandler {
                    calls: Rc::clone(&calls),
                }),
            );
        }

        let mut document = document_with_extensions(json!({
            "FAKE_compression_a": {},
            "FAKE_compression_b": {}
        }));
        let mut store = BufferStore::new();

        let err = decompress_document(&mut document, &mut store, &registry).unwrap_err();
        assert!(matches!(err, Err::UnsupportedExtension(_)));
        // Failed before any handler ran.
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn required_extension_without_handler_fails() {
        let mut document = Document::from_value(json!({
            "extensionsRequired": ["EXT_unknown"]
        }))
        .unwrap();
        let mut store = BufferStore::new();
        let registry = ExtensionRegistry::new();

        let err = decompress_document(&mut document, &mut store, &registry).unwrap_err();
        assert!(matches!(err, Err::UnsupportedExtension(_)));
    }

    #[test]
    fn allowed_required_extension_passes_the_gate() {
        let mut document = Document::from_value(json!({
            "extensionsRequired": ["KHR_mesh_quantization"]
        }))
        .unwrap();
        let mut store = BufferStore::new();
        let mut registry = ExtensionRegistry::new();
        registry.allow("KHR_mesh_quantization");

        decompress_document(&mut document, &mut store, &registry).unwrap();
    }
}
