/*!
 * Inline String Optimization
 * Zero-allocation strings for map keys and diagnostic labels
 */

use serde::{Deserialize, Serialize};
use smartstring::alias::String as SmartString;
use std::fmt;

/// Inline-optimized string that stores short strings (≤23 bytes) without heap allocation
///
/// # Performance
///
/// - **Small strings** (≤23 bytes): Stored inline, zero allocation
/// - **Large strings** (>23 bytes): Heap allocated like regular String
///
/// Counter keys (`"a"`, `"b"`) and error labels always fit inline, so hashing
/// a key inside a critical section never chases a heap pointer.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct InlineString {
    inner: SmartString,
}

impl InlineString {
    /// Create new inline string
    #[inline]
    pub fn new() -> Self {
        Self {
            inner: SmartString::new(),
        }
    }

    /// Get string slice
    #[inline(always)]
    pub fn as_str(&self) -> &str {
        self.inner.as_str()
    }

    /// Check if string is stored inline (no heap allocation)
    #[inline]
    pub fn is_inline(&self) -> bool {
        self.inner.is_inline()
    }

    /// Get length
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if empty
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for InlineString {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for InlineString {
    #[inline]
    fn from(s: &str) -> Self {
        Self {
            inner: SmartString::from(s),
        }
    }
}

impl From<String> for InlineString {
    #[inline]
    fn from(s: String) -> Self {
        Self {
            inner: SmartString::from(s),
        }
    }
}

impl From<InlineString> for String {
    #[inline]
    fn from(s: InlineString) -> Self {
        s.inner.into()
    }
}

impl AsRef<str> for InlineString {
    #[inline(always)]
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::ops::Deref for InlineString {
    type Target = str;

    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl fmt::Display for InlineString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_keys_inline() {
        for key in ["a", "b", "counter", "structural fault"] {
            let inline = InlineString::from(key);
            assert!(inline.is_inline(), "Key '{}' should be inline", key);
            assert_eq!(inline.as_str(), key);
        }
    }

    #[test]
    fn test_long_string_heap_allocated() {
        let long = InlineString::from(
            "a diagnostic label long enough to spill past the inline threshold",
        );
        assert!(!long.is_inline(), "Long strings should use heap");
    }

    #[test]
    fn test_ordering_matches_str() {
        let a = InlineString::from("a");
        let b = InlineString::from("b");
        assert!(a < b);
        assert_eq!(String::from(b), "b");
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let key = InlineString::from("a");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"a\"");
        let back: InlineString = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
