//! Tool execution result: rendered text or a reported error, never a panic.

/// Result of executing a tool. Errors are data here; the server loop turns
/// them into protocol error payloads without ever dying.
#[derive(Debug, Clone)]
pub struct ToolResult {
    /// Rendered table or confirmation text.
    pub text: String,
    /// If true, treat as a tool error (reported to the caller, not fatal).
    pub is_error: bool,
}

impl ToolResult {
    #[inline]
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    #[inline]
    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            text: msg.into(),
            is_error: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_fields() {
        let r = ToolResult::ok("id,name\n");
        assert_eq!(r.text, "id,name\n");
        assert!(!r.is_error);

        let r = ToolResult::error("failed");
        assert_eq!(r.text, "failed");
        assert!(r.is_error);
    }
}
