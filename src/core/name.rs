use crate::core::{Result, StoreError};
use std::fmt;
use std::str::FromStr;

/// Namespace under which the engine publishes its well-known instance properties.
pub const WORKFLOW_NAMESPACE: &str = "urn:schemas-microsoft-com:System.Activities/4.0/properties";

/// Local name of the Data property that carries the pending timer deadline.
pub const TIMER_EXPIRATION_LOCAL_NAME: &str = "TimerExpirationTime";

/// A property key made of an optional namespace and a local name.
///
/// The textual form is `{namespace}local`, or just `local` when the namespace
/// is empty. `Display` and `FromStr` are exact inverses.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QualifiedName {
    namespace: String,
    local: String,
}

impl QualifiedName {
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local: local.into(),
        }
    }

    pub fn local(local: impl Into<String>) -> Self {
        Self::new(String::new(), local)
    }

    pub fn pending_timer_expiration() -> Self {
        Self::new(WORKFLOW_NAMESPACE, TIMER_EXPIRATION_LOCAL_NAME)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn local_name(&self) -> &str {
        &self.local
    }

    pub fn has_namespace(&self) -> bool {
        !self.namespace.is_empty()
    }

    /// Checks that the textual form parses back to this exact name.
    ///
    /// The local name must be non-empty and brace-free; the namespace must not
    /// contain a closing brace.
    pub fn validate(&self) -> Result<()> {
        if self.local.is_empty() {
            return Err(StoreError::InvalidName(format!("missing local name in '{self}'")));
        }
        if self.local.contains(['{', '}']) {
            return Err(StoreError::InvalidName(format!("braces in local name '{self}'")));
        }
        if self.namespace.contains('}') {
            return Err(StoreError::InvalidName(format!("closing brace in namespace '{self}'")));
        }
        Ok(())
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.local)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local)
        }
    }
}

impl FromStr for QualifiedName {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        let (namespace, local) = match s.strip_prefix('{') {
            Some(rest) => {
                let close = rest.find('}').ok_or_else(|| {
                    StoreError::InvalidName(format!("unterminated namespace in '{s}'"))
                })?;
                let namespace = &rest[..close];
                if namespace.is_empty() {
                    return Err(StoreError::InvalidName(format!("empty namespace in '{s}'")));
                }
                (namespace, &rest[close + 1..])
            }
            None => ("", s),
        };

        if local.is_empty() {
            return Err(StoreError::InvalidName(format!("missing local name in '{s}'")));
        }
        if local.contains(['{', '}']) {
            return Err(StoreError::InvalidName(format!("braces in local name '{s}'")));
        }

        Ok(Self::new(namespace, local))
    }
}

impl From<&str> for QualifiedName {
    /// Reads the `{ns}local` form. Text that does not parse is kept as a local
    /// name and rejected by [`QualifiedName::validate`] when saved.
    fn from(text: &str) -> Self {
        text.parse().unwrap_or_else(|_| Self::local(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_and_without_namespace() {
        assert_eq!(QualifiedName::local("Foo").to_string(), "Foo");
        assert_eq!(
            QualifiedName::new("urn:test", "Foo").to_string(),
            "{urn:test}Foo"
        );
    }

    #[test]
    fn test_parse_round_trip() {
        for text in ["Foo", "{urn:test}Foo", "{http://example.com/ns}Bar.Baz"] {
            let name: QualifiedName = text.parse().unwrap();
            assert_eq!(name.to_string(), text);
        }

        let timer = QualifiedName::pending_timer_expiration();
        let reparsed: QualifiedName = timer.to_string().parse().unwrap();
        assert_eq!(reparsed, timer);
        assert_eq!(reparsed.namespace(), WORKFLOW_NAMESPACE);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for text in ["", "{urn:test", "{}Foo", "{urn:test}", "Fo}o"] {
            let err = text.parse::<QualifiedName>().unwrap_err();
            assert!(matches!(err, StoreError::InvalidName(_)), "{text}");
        }
    }

    #[test]
    fn test_from_str_reads_namespace() {
        let name = QualifiedName::from("{urn:x}Foo");
        assert_eq!(name, QualifiedName::new("urn:x", "Foo"));
        assert_eq!(QualifiedName::from("Foo"), QualifiedName::local("Foo"));
    }

    #[test]
    fn test_validate_matches_parse() {
        assert!(QualifiedName::local("Foo").validate().is_ok());
        assert!(QualifiedName::new("urn:a{b", "Foo").validate().is_ok());
        assert!(QualifiedName::pending_timer_expiration().validate().is_ok());

        for name in [
            QualifiedName::local(""),
            QualifiedName::local("a}b"),
            QualifiedName::local("{urn:x"),
            QualifiedName::new("urn:x", "a{b"),
            QualifiedName::new("urn}x", "Foo"),
            QualifiedName::from("{urn:x"),
        ] {
            let err = name.validate().unwrap_err();
            assert!(matches!(err, StoreError::InvalidName(_)), "{name:?}");
        }
    }

    #[test]
    fn test_valid_names_reparse_exactly() {
        for name in [
            QualifiedName::local("Foo"),
            QualifiedName::new("urn:a{b", "Foo"),
            QualifiedName::new("http://example.com/ns", "Bar.Baz"),
        ] {
            name.validate().unwrap();
            assert_eq!(name.to_string().parse::<QualifiedName>().unwrap(), name);
        }
    }
}
