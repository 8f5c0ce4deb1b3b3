//! Newtype IDs for type-safe entity references.
//!
//! The REST backend issues opaque string identifiers. Use the `define_id!`
//! macro to wrap them so a product ID can never be passed where an order ID
//! is expected.

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`
/// - `From<String>`, `From<&str>` and `AsRef<str>` implementations
///
/// # Example
///
/// ```rust
/// # use drape_core::define_id;
/// define_id!(SkuId);
/// define_id!(BatchId);
///
/// let sku = SkuId::new("sku-1");
/// assert_eq!(sku.as_str(), "sku-1");
///
/// // These are different types, so this won't compile:
/// // let _: BatchId = sku;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Define standard entity IDs
define_id!(ProductId);
define_id!(AccessoryId);
define_id!(CategoryId);
define_id!(OrderId);
define_id!(UserId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_and_conversions() {
        let id = ProductId::from("64f1c0ffee");
        assert_eq!(id.to_string(), "64f1c0ffee");
        assert_eq!(id.as_str(), "64f1c0ffee");
        assert_eq!(ProductId::new(String::from("64f1c0ffee")), id);
    }

    #[test]
    fn test_id_serde_is_transparent() {
        let id = OrderId::new("ord_1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"ord_1\"");

        let parsed: OrderId = serde_json::from_str("\"ord_2\"").unwrap();
        assert_eq!(parsed.as_str(), "ord_2");
    }
}
