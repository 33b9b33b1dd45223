//! Query key schema
//!
//! A key is the logical identity of a query: an operation name plus its
//! parameters. All cache consumers must build keys through [`QueryKey`] so
//! prefix invalidation stays consistent.
//! Rendered format: `v{VERSION}:{op}[:arg...]`

use std::fmt;

/// Key schema version - increment when changing key formats
pub const KEY_VERSION: u32 = 1;

/// Logical identity of a cached query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    op: String,
    args: Vec<String>,
}

impl QueryKey {
    /// Key for a parameterless operation
    pub fn new(op: impl Into<String>) -> Self {
        Self {
            op: op.into(),
            args: Vec::new(),
        }
    }

    /// Append a parameter to the key
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Operation name (the first component)
    pub fn op(&self) -> &str {
        &self.op
    }

    /// Whether this key belongs to the given operation
    pub fn matches_op(&self, op: &str) -> bool {
        self.op == op
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}:{}", KEY_VERSION, self.op)?;
        for arg in &self.args {
            write!(f, ":{}", arg)?;
        }
        Ok(())
    }
}
