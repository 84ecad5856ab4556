use std::fmt::Display;

use serde::Serializer;

/// Serializes a value through its `Display` form. Used for `apollo-compiler`
/// nodes that carry no `Serialize` impl of their own.
pub(crate) fn serialize_as_string<S: Serializer>(
    value: impl Display,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}
