/// Nesting limit applied by [`ParseOptions::default`].
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Knobs for [`parse_with`](crate::parse_with). The defaults give the strict
/// behavior of [`parse`](crate::parse): the root must be an object and string
/// escapes are kept exactly as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Accept any value as the document root, not just an object.
    pub any_root: bool,
    /// Decode escape sequences in strings and object keys.
    pub decode_escapes: bool,
    /// Maximum nesting of objects and arrays; `None` means unlimited.
    pub max_depth: Option<usize>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            any_root: false,
            decode_escapes: false,
            max_depth: Some(DEFAULT_MAX_DEPTH),
        }
    }
}

impl ParseOptions {
    pub fn with_any_root(mut self, any_root: bool) -> Self {
        self.any_root = any_root;
        self
    }

    pub fn with_decode_escapes(mut self, decode_escapes: bool) -> Self {
        self.decode_escapes = decode_escapes;
        self
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }
}
