use ulid::Ulid;

/// Generates a new ULID-based ID with the given prefix.
///
/// # Examples
/// ```
/// let id = room_common::id::prefixed_ulid("post");
/// assert!(id.starts_with("post_"));
/// ```
pub fn prefixed_ulid(prefix: &str) -> String {
    format!("{}_{}", prefix, Ulid::new())
}

/// Marker trait for types that represent a prefixed ID.
pub trait PrefixedId {
    const PREFIX: &'static str;

    fn generate() -> String {
        prefixed_ulid(Self::PREFIX)
    }
}

/// Well-known ID prefixes.
pub mod prefix {
    pub const USER: &str = "usr";
    pub const POST: &str = "post";
    pub const COMMENT: &str = "cmt";
    pub const COMMUNITY: &str = "com";
    pub const NOTIFICATION: &str = "ntf";
    pub const BADGE: &str = "bdg";
    pub const CONVERSATION: &str = "cnv";
    pub const DIRECT_MESSAGE: &str = "dm";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixed_ulid_format() {
        let id = prefixed_ulid("post");
        assert!(id.starts_with("post_"));
        // ULID is 26 chars, plus prefix + underscore
        assert_eq!(id.len(), 5 + 26);
    }

    #[test]
    fn test_uniqueness() {
        let a = prefixed_ulid("usr");
        let b = prefixed_ulid("usr");
        assert_ne!(a, b);
    }
}
