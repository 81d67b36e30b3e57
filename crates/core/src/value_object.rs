//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity of their own; two instances holding the same
/// attributes are the same value. In this workspace that covers normalised
/// field values such as ISBNs and rating scores, which are checked once at
/// construction and then passed around freely.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Rating(u8);
///
/// impl ValueObject for Rating {}
///
/// assert_eq!(Rating(4), Rating(4));
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
