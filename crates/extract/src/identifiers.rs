//! Newtype domain identifiers.
//!
//! A model identifier and a provider name are both strings on the wire, but
//! they are never interchangeable: the first selects a backend model (and,
//! through the registry, an adapter), the second names an adapter directly.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display, and a
// serde representation that rejects empty strings.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value).ok_or_else(|| {
                    concat!(stringify!($name), " must not be empty").to_string()
                })
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

string_id! {
    /// Backend model identifier (e.g. `"qwen-plus"`, `"qwen-flash"`).
    ///
    /// Sent verbatim as the `model` field of every chat-completion request and
    /// matched against registry patterns to pick an adapter.
    ModelId
}

string_id! {
    /// Name under which an adapter is registered (e.g. `"QwenLanguageModel"`).
    ProviderName
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_model_id_is_rejected() {
        assert!(ModelId::new("").is_none());
        assert_eq!(ModelId::new("qwen-plus").unwrap().as_str(), "qwen-plus");
    }

    #[test]
    fn test_model_id_deserialize_rejects_empty() {
        let err = serde_json::from_str::<ModelId>("\"\"").unwrap_err();
        assert!(err.to_string().contains("ModelId must not be empty"));

        let id: ModelId = serde_json::from_str("\"qwen-turbo\"").unwrap();
        assert_eq!(id.to_string(), "qwen-turbo");
    }
}
