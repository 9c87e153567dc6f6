//! Protocol message identifiers
//!
//! Every feature owns a fixed set of method identifiers. Ownership is always
//! stored as a non-empty ordered slice, so validating an incoming
//! registration collapses to one containment check regardless of whether
//! either side is a single message or many.

use std::fmt;
use std::marker::PhantomData;

use crate::error::ClientError;

/// Request-vs-notification shape of a protocol method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Request,
    Notification,
}

/// An opaque method name plus its shape marker.
///
/// Equality considers the method name only; two identifiers with the same
/// name always refer to the same wire method.
#[derive(Debug, Clone, Copy, Eq)]
pub struct MessageIdentifier {
    method: &'static str,
    kind: MessageKind,
}

impl MessageIdentifier {
    pub const fn request(method: &'static str) -> Self {
        Self {
            method,
            kind: MessageKind::Request,
        }
    }

    pub const fn notification(method: &'static str) -> Self {
        Self {
            method,
            kind: MessageKind::Notification,
        }
    }

    pub const fn method(&self) -> &'static str {
        self.method
    }

    pub const fn kind(&self) -> MessageKind {
        self.kind
    }
}

impl PartialEq for MessageIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method
    }
}

impl std::hash::Hash for MessageIdentifier {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.method.hash(state);
    }
}

impl fmt::Display for MessageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method)
    }
}

/// A typed request method: `P` is the params shape, `R` the response shape.
pub struct RequestType<P, R> {
    method: &'static str,
    _marker: PhantomData<fn(P) -> R>,
}

impl<P, R> RequestType<P, R> {
    pub const fn new(method: &'static str) -> Self {
        Self {
            method,
            _marker: PhantomData,
        }
    }

    pub const fn method(&self) -> &'static str {
        self.method
    }

    pub const fn identifier(&self) -> MessageIdentifier {
        MessageIdentifier::request(self.method)
    }
}

/// A typed one-way notification method with params shape `P`.
pub struct NotificationType<P> {
    method: &'static str,
    _marker: PhantomData<fn(P)>,
}

impl<P> NotificationType<P> {
    pub const fn new(method: &'static str) -> Self {
        Self {
            method,
            _marker: PhantomData,
        }
    }

    pub const fn method(&self) -> &'static str {
        self.method
    }

    pub const fn identifier(&self) -> MessageIdentifier {
        MessageIdentifier::notification(self.method)
    }
}

fn join_methods(set: &[MessageIdentifier]) -> String {
    set.iter()
        .map(MessageIdentifier::method)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validate that every offered identifier is owned by the feature.
///
/// Raised errors are wiring defects: a registration meant for a different
/// capability domain reached this feature.
pub fn validate_ownership(
    owned: &[MessageIdentifier],
    offered: &[MessageIdentifier],
) -> Result<(), ClientError> {
    for identifier in offered {
        if !owned.contains(identifier) {
            return Err(ClientError::Registration {
                offered: identifier.method().to_string(),
                owned: join_methods(owned),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNED_MANY: &[MessageIdentifier] = &[
        MessageIdentifier::request("connection/connect"),
        MessageIdentifier::request("connection/disconnect"),
        MessageIdentifier::notification("connection/complete"),
    ];
    const OWNED_ONE: &[MessageIdentifier] = &[MessageIdentifier::request("capabilities/list")];

    #[test]
    fn equality_ignores_kind() {
        let as_request = MessageIdentifier::request("connection/complete");
        let as_notification = MessageIdentifier::notification("connection/complete");
        assert_eq!(as_request, as_notification);
    }

    #[test]
    fn multi_vs_multi_accepts_owned_subset() {
        let offered = [
            MessageIdentifier::request("connection/disconnect"),
            MessageIdentifier::request("connection/connect"),
        ];
        assert!(validate_ownership(OWNED_MANY, &offered).is_ok());
    }

    #[test]
    fn multi_vs_single_accepts_member() {
        let offered = [MessageIdentifier::notification("connection/complete")];
        assert!(validate_ownership(OWNED_MANY, &offered).is_ok());
    }

    #[test]
    fn single_vs_single_requires_equal_method() {
        let offered = [MessageIdentifier::request("capabilities/list")];
        assert!(validate_ownership(OWNED_ONE, &offered).is_ok());

        let foreign = [MessageIdentifier::request("metadata/list")];
        assert!(validate_ownership(OWNED_ONE, &foreign).is_err());
    }

    #[test]
    fn foreign_identifier_is_rejected_with_both_names() {
        let offered = [MessageIdentifier::request("query/executeString")];
        let err = validate_ownership(OWNED_MANY, &offered).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("query/executeString"));
        assert!(text.contains("connection/connect"));
    }

    #[test]
    fn one_foreign_among_owned_is_rejected() {
        let offered = [
            MessageIdentifier::request("connection/connect"),
            MessageIdentifier::request("scripting/script"),
        ];
        assert!(validate_ownership(OWNED_MANY, &offered).is_err());
    }

    #[test]
    fn typed_wrappers_expose_identifiers() {
        const LIST: RequestType<(), ()> = RequestType::new("metadata/list");
        assert_eq!(LIST.method(), "metadata/list");
        assert_eq!(LIST.identifier().kind(), MessageKind::Request);

        const COMPLETE: NotificationType<()> = NotificationType::new("query/complete");
        assert_eq!(COMPLETE.identifier().kind(), MessageKind::Notification);
    }
}
