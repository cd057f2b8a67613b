//! Newtype references for type-safe entity identification.
//!
//! Order and product references arrive from the commerce platform as opaque
//! strings (Shopify sends numeric order IDs and product handles, other
//! platforms send whatever they like). Use the `define_ref!` macro to create
//! wrappers that prevent accidentally mixing them.

/// Macro to define a type-safe opaque string reference.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>`, and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use dropwire_core::define_ref;
/// define_ref!(OrderRef);
/// define_ref!(ProductRef);
///
/// let order = OrderRef::new("5212345678");
/// let product = ProductRef::new("field-guide-pdf");
///
/// // These are different types, so this won't compile:
/// // let _: OrderRef = product;
/// ```
#[macro_export]
macro_rules! define_ref {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new reference from anything string-like.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the reference and return its inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// References received from the commerce platform
define_ref!(OrderRef);
define_ref!(ProductRef);
define_ref!(TenantDomain);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_ref_roundtrip() {
        let order = OrderRef::new("5212345678");
        assert_eq!(order.as_str(), "5212345678");
        assert_eq!(order.clone().into_inner(), "5212345678");
        assert_eq!(format!("{order}"), "5212345678");
    }

    #[test]
    fn test_refs_hash_by_value() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(OrderRef::new("42"), 1);
        assert_eq!(map.get(&OrderRef::new("42")), Some(&1));
        assert_eq!(map.get(&OrderRef::new("43")), None);
    }

    #[test]
    fn test_serde_transparent() {
        let product = ProductRef::new("field-guide-pdf");
        let json = serde_json::to_string(&product).unwrap();
        assert_eq!(json, "\"field-guide-pdf\"");
    }
}
