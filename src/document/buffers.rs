use super::BufferView;

/// Mapping from buffer index to the raw bytes resolved for that buffer.
///
/// The store is seeded by the ingestion collaborator (embedded data,
/// file-relative URIs, or a binary-container chunk) and grows only by
/// appending the synthetic buffers produced during decompression. Stored
/// bytes are never mutated in place.
#[derive(Debug, Clone, Default)]
pub struct BufferStore {
    buffers: Vec<Vec<u8>>,
}

impl BufferStore {
    pub fn new() -> Self {
        Self {
            buffers: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Raw bytes of the buffer at `index`, if resolved.
    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.buffers.get(index).map(Vec::as_slice)
    }

    /// Appends a new buffer and returns its index. The new index always
    /// equals the buffer count before the append.
    pub fn push(&mut self, bytes: Vec<u8>) -> usize {
        self.buffers.push(bytes);
        self.buffers.len() - 1
    }

    /// Resolves a view to its byte range, checking that the range lies
    /// within the referenced buffer.
    pub fn slice(&self, view: &BufferView) -> Option<&[u8]> {
        let buffer = self.get(view.buffer)?;
        let end = view.byte_offset.checked_add(view.byte_length)?;
        buffer.get(view.byte_offset..end)
    }
}

impl From<Vec<Vec<u8>>> for BufferStore {
    fn from(buffers: Vec<Vec<u8>>) -> Self {
        Self { buffers }
    }
}

impl FromIterator<Vec<u8>> for BufferStore {
    fn from_iter<I: IntoIterator<Item = Vec<u8>>>(iter: I) -> Self {
        Self {
            buffers: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_returns_prior_count() {
        let mut store = BufferStore::new();
        assert_eq!(store.push(vec![1, 2, 3]), 0);
        assert_eq!(store.push(vec![4]), 1);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(1), Some(&[4u8][..]));
    }

    #[test]
    fn slice_checks_range() {
        let store = BufferStore::from(vec![vec![0u8; 8]]);

        let inside = BufferView::spanning(0, 8, "whole");
        assert_eq!(store.slice(&inside).unwrap().len(), 8);

        let mut past_end = BufferView::spanning(0, 4, "tail");
        past_end.byte_offset = 6;
        assert!(store.slice(&past_end).is_none());

        let missing_buffer = BufferView::spanning(3, 1, "missing");
        assert!(store.slice(&missing_buffer).is_none());
    }
}
