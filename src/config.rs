//! Runtime limits for the interpreter.

/// Default ceiling on nested calls before a run is aborted.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Nested calls deeper than this raise a "Stack overflow." runtime error.
    /// The interpreter grows its stack on demand, so the limit does not
    /// depend on the size of the calling thread's stack.
    pub max_call_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

impl Config {
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }
}
