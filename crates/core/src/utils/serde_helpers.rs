//! Serde utility helpers for enums parsed from loosely-cased strings

/// Implement `Deserialize` for a type through its `FromStr` implementation,
/// so JSON input accepts exactly what the command line accepts.
///
/// Usage:
/// ```ignore
/// impl_deserialize_from_str!(MyEnum);
/// ```
#[macro_export]
macro_rules! impl_deserialize_from_str {
    ($type:ty) => {
        impl<'de> serde::Deserialize<'de> for $type {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                s.parse::<$type>().map_err(serde::de::Error::custom)
            }
        }
    };
}
