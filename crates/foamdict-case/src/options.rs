use foamdict_tree::MacroPolicy;

/// Options for [`DictFile::load`](crate::DictFile::load).
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Files larger than this many bytes only have their header parsed.
    pub size_limit: u64,
    /// How much of an oversized file is read when looking for its header.
    pub header_probe_bytes: usize,
    /// Splice `#include`d files into the document.
    pub expand_includes: bool,
    /// Expand macro references with this policy. `None` keeps them as
    /// written.
    pub expand_macros: Option<MacroPolicy>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            size_limit: 10 << 20,
            header_probe_bytes: 8 << 10,
            expand_includes: false,
            expand_macros: None,
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size_limit(mut self, bytes: u64) -> Self {
        self.size_limit = bytes;
        self
    }

    pub fn header_probe_bytes(mut self, bytes: usize) -> Self {
        self.header_probe_bytes = bytes;
        self
    }

    pub fn expand_includes(mut self, yes: bool) -> Self {
        self.expand_includes = yes;
        self
    }

    pub fn expand_macros(mut self, policy: Option<MacroPolicy>) -> Self {
        self.expand_macros = policy;
        self
    }

    /// Includes and macros both expanded, as the solver would see the file.
    pub fn expanded(policy: MacroPolicy) -> Self {
        Self::default()
            .expand_includes(true)
            .expand_macros(Some(policy))
    }
}
