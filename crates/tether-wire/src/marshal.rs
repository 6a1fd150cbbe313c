use crate::channel::TypeDesc;
use crate::error::WireError;

/// Shared-allocator upcall exposed by the destination runtime.
///
/// Buffers handed out here end up owned by whoever receives the message
/// built from them; the destination runtime is responsible for eventual
/// reclamation. The bridge performs none itself.
pub trait SharedAlloc: Send + Sync {
    /// Allocate `nbytes` of zeroed memory, optionally tagged with the type
    /// descriptor the destination side will decode it as. `None` signals
    /// exhaustion; callers must not build or send anything from it.
    fn alloc_zeroed(&self, nbytes: usize, tydesc: Option<&TypeDesc>) -> Option<Box<[u8]>>;
}

/// Process-heap allocator, the default when the destination runtime shares
/// the host heap.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapAlloc;

impl SharedAlloc for HeapAlloc {
    fn alloc_zeroed(&self, nbytes: usize, _tydesc: Option<&TypeDesc>) -> Option<Box<[u8]>> {
        Some(vec![0u8; nbytes].into_boxed_slice())
    }
}

/// Header of a marshaled string: length and padding, both 64-bit LE.
const STR_HEADER_LEN: usize = 16;

/// A text payload marshaled for the runtime boundary.
///
/// Buffer layout: `len: u64 LE | pad: u64 = 0 | bytes | NUL`. One
/// allocation per value, no pooling; every `SharedStr` is independently
/// owned by whoever ends up holding the message that carries it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedStr {
    buf: Box<[u8]>,
}

impl SharedStr {
    /// Marshal `text` through the destination runtime's allocator.
    pub fn marshal(alloc: &dyn SharedAlloc, text: &str) -> Result<SharedStr, WireError> {
        let bytes = text.as_bytes();
        let nbytes = STR_HEADER_LEN + bytes.len() + 1;
        let mut buf = alloc
            .alloc_zeroed(nbytes, None)
            .ok_or(WireError::AllocFailed { requested: nbytes })?;
        buf[..8].copy_from_slice(&(bytes.len() as u64).to_le_bytes());
        // pad word and trailing NUL are already zero
        buf[STR_HEADER_LEN..STR_HEADER_LEN + bytes.len()].copy_from_slice(bytes);
        Ok(SharedStr { buf })
    }

    pub fn len(&self) -> usize {
        let header: [u8; 8] = self.buf[..8].try_into().expect("length header");
        u64::from_le_bytes(header) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The marshaled text bytes, without header or trailing NUL.
    pub fn text_bytes(&self) -> &[u8] {
        &self.buf[STR_HEADER_LEN..STR_HEADER_LEN + self.len()]
    }

    /// Decode back to text. Marshaling only ever starts from valid UTF-8,
    /// so this cannot fail on a value this crate produced.
    pub fn text(&self) -> &str {
        std::str::from_utf8(self.text_bytes()).expect("marshaled text is UTF-8")
    }

    /// The raw buffer in allocator layout, header and NUL included.
    pub fn as_raw(&self) -> &[u8] {
        &self.buf
    }
}
