use std::fmt;

/// Per-request context threaded explicitly through service calls.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RequestContext {
    pub correlation_id: String,
}

impl RequestContext {
    pub fn new(correlation_id: impl Into<String>) -> Self {
        RequestContext {
            correlation_id: correlation_id.into(),
        }
    }

    /// Keeps a caller-supplied id when it is usable, otherwise mints one.
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(id) if !id.is_empty() && id.len() <= 128 => Self::new(id),
            _ => Self::generate(),
        }
    }

    pub fn generate() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.correlation_id)
    }
}
