//! String interning.
//!
//! The interner maps content to the one canonical string object for that
//! content. It holds its entries weakly: the collector drops entries whose
//! string was not reached before sweeping.

use std::collections::HashMap;

use core_types::ObjRef;

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// 32-bit FNV-1a hash of `bytes`.
///
/// # Examples
///
/// ```
/// use memory_manager::fnv1a;
///
/// assert_eq!(fnv1a(b""), 2_166_136_261);
/// assert_eq!(fnv1a(b"a"), 0xe40c_292c);
/// ```
pub fn fnv1a(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Hash-keyed set of canonical string handles.
#[derive(Debug, Default)]
pub struct Interner {
    buckets: HashMap<u32, Vec<ObjRef>>,
    len: usize,
}

impl Interner {
    /// Create an empty interner
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the handle whose content equals `chars`.
    ///
    /// `content` resolves a handle to its string; entries sharing the hash
    /// are compared through it.
    pub fn find<'h, F>(&self, hash: u32, chars: &str, content: F) -> Option<ObjRef>
    where
        F: Fn(ObjRef) -> Option<&'h str>,
    {
        self.buckets
            .get(&hash)?
            .iter()
            .copied()
            .find(|candidate| content(*candidate) == Some(chars))
    }

    /// Register a freshly allocated string.
    pub fn insert(&mut self, hash: u32, string: ObjRef) {
        self.buckets.entry(hash).or_default().push(string);
        self.len += 1;
    }

    /// Keep only the entries for which `keep` holds.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(ObjRef) -> bool,
    {
        let mut len = 0;
        self.buckets.retain(|_, bucket| {
            bucket.retain(|string| keep(*string));
            len += bucket.len();
            !bucket.is_empty()
        });
        self.len = len;
    }

    /// Number of interned strings.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if nothing is interned.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
