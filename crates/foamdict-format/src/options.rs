//! Formatting options for dictionary output.

/// Options for dictionary output.
#[derive(Debug, Clone)]
pub struct FormatOptions {
    /// Indentation step, and the minimum gap between a key and its value
    /// (default: 4)
    pub tab_width: usize,

    /// Max line width before lists are broken over several lines (default: 80)
    pub max_width: usize,

    /// Lists of at most N bare words are always written on one line
    /// (default: 10)
    pub inline_word_list_max: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            tab_width: 4,
            max_width: 80,
            inline_word_list_max: 10,
        }
    }
}

impl FormatOptions {
    /// Create new default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the indentation step.
    pub fn tab_width(mut self, width: usize) -> Self {
        self.tab_width = width;
        self
    }

    /// Set max line width.
    pub fn max_width(mut self, width: usize) -> Self {
        self.max_width = width;
        self
    }

    /// Set how many words a list may hold and still be written inline.
    pub fn inline_word_list_max(mut self, max: usize) -> Self {
        self.inline_word_list_max = max;
        self
    }
}
