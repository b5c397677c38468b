//! Input hygiene for values that end up in job URLs and job definitions.
//!
//! Job ids come back from the remote service and are treated as opaque, but
//! they are still percent-encoded before being placed in a URL path so a
//! malformed id cannot escape its segment.
//!
//! ```rust
//! use sf_bulkjobs_client::security::{names, url};
//!
//! assert!(names::is_safe_api_name("Custom_Object__c"));
//! assert_eq!(url::encode_param("750/../x"), "750%2F..%2Fx");
//! ```

/// API name validation for objects and fields.
pub mod names {
    /// Validate that an object or field API name contains only safe characters.
    ///
    /// Names must start with a letter and contain only ASCII alphanumerics and
    /// underscores (which covers the `__c` / `__r` custom suffixes).
    ///
    /// ```rust
    /// use sf_bulkjobs_client::security::names;
    ///
    /// assert!(names::is_safe_api_name("Account"));
    /// assert!(names::is_safe_api_name("External_Id__c"));
    /// assert!(!names::is_safe_api_name("Bad'; DROP--"));
    /// assert!(!names::is_safe_api_name("9Lives"));
    /// ```
    #[must_use]
    pub fn is_safe_api_name(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() => {
                chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
            }
            _ => false,
        }
    }
}

/// URL encoding utilities for parameter safety.
pub mod url {
    /// URL-encode a path segment or parameter value.
    ///
    /// ```rust
    /// use sf_bulkjobs_client::security::url;
    ///
    /// assert_eq!(url::encode_param("750xx000000001"), "750xx000000001");
    /// assert_eq!(url::encode_param("001/../../secret"), "001%2F..%2F..%2Fsecret");
    /// ```
    #[must_use]
    pub fn encode_param(value: &str) -> String {
        urlencoding::encode(value).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_api_names() {
        assert!(names::is_safe_api_name("Contact"));
        assert!(names::is_safe_api_name("My_Object__c"));
        assert!(names::is_safe_api_name("a"));
    }

    #[test]
    fn test_unsafe_api_names() {
        assert!(!names::is_safe_api_name(""));
        assert!(!names::is_safe_api_name("_Leading"));
        assert!(!names::is_safe_api_name("Has Space"));
        assert!(!names::is_safe_api_name("Dash-Name"));
        assert!(!names::is_safe_api_name("Quote'"));
    }

    #[test]
    fn test_encode_param() {
        assert_eq!(url::encode_param("abc"), "abc");
        assert_eq!(url::encode_param("a b"), "a%20b");
        assert_eq!(url::encode_param("a/b?c"), "a%2Fb%3Fc");
    }
}
