//! Validated value types.
//!
//! Every configuration value is a newtype over `String` that can only be built
//! through its validating constructor. Once constructed the value is immutable
//! and round-trips to its canonical string through the accessor, `Display`,
//! `AsRef<str>` and serde (deserialisation re-runs the constructor).

/// Declares a validated string newtype.
///
/// The generated type has `new(impl Into<String>) -> DomainResult<Self>`, a
/// named accessor, `Display`, `AsRef<str>` and transparent serde.
#[macro_export]
macro_rules! value_type {
    ($(#[$meta:meta])* $name:ident, $accessor:ident, $check:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Builds the value, failing with `InvalidValue` when the raw input is illegal.
            pub fn new(value: impl Into<String>) -> $crate::DomainResult<Self> {
                let value = value.into();
                let check: fn(&str) -> ::std::result::Result<(), String> = $check;
                check(&value).map_err(|reason| {
                    $crate::DomainError::InvalidValue(format!("{}: {}", stringify!($name), reason))
                })?;
                Ok(Self(value))
            }

            #[must_use]
            pub fn $accessor(&self) -> &str {
                &self.0
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::DomainError;

            fn try_from(value: String) -> $crate::DomainResult<Self> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

/// Reusable checks for value constructors.
pub mod rules {
    /// Character count must lie in `min..=max`.
    pub fn length(value: &str, min: usize, max: usize) -> Result<(), String> {
        let n = value.chars().count();
        if n < min {
            return Err(format!("must have at least {min} characters"));
        }
        if n > max {
            return Err(format!("must have at most {max} characters"));
        }
        Ok(())
    }

    /// ASCII alphanumerics plus `extra`, starting with an alphanumeric.
    pub fn slug(value: &str, extra: &[char]) -> Result<(), String> {
        let mut chars = value.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphanumeric() => {}
            _ => return Err("must start with a letter or digit".to_string()),
        }
        if let Some(c) = chars.find(|c| !c.is_ascii_alphanumeric() && !extra.contains(c)) {
            return Err(format!("contains illegal character {c:?}"));
        }
        Ok(())
    }

    pub fn no_whitespace(value: &str) -> Result<(), String> {
        if value.chars().any(char::is_whitespace) {
            return Err("must not contain whitespace".to_string());
        }
        Ok(())
    }

    pub fn one_of(value: &str, allowed: &[&str]) -> Result<(), String> {
        if allowed.contains(&value) {
            Ok(())
        } else {
            Err(format!("must be one of {}", allowed.join(", ")))
        }
    }

    pub fn digits(value: &str) -> Result<(), String> {
        if value.chars().all(|c| c.is_ascii_digit()) {
            Ok(())
        } else {
            Err("must contain digits only".to_string())
        }
    }

    /// Relative or absolute path without parent-directory segments.
    pub fn path(value: &str) -> Result<(), String> {
        if value.split('/').any(|seg| seg == "..") {
            return Err("must not contain '..' segments".to_string());
        }
        Ok(())
    }
}

pub const REPO_TYPE_PUBLIC: &str = "public";
pub const REPO_TYPE_PRIVATE: &str = "private";
pub const REPO_TYPE_ONLINE: &str = "online";

pub const RESOURCE_TYPE_MODEL: &str = "model";
pub const RESOURCE_TYPE_DATASET: &str = "dataset";
pub const RESOURCE_TYPE_PROJECT: &str = "project";

value_type!(
    /// User account name.
    Account,
    account,
    |v| {
        rules::length(v, 3, 40)?;
        rules::slug(v, &['_', '-'])
    }
);

value_type!(
    /// Project name, unique per owner.
    ProjName,
    proj_name,
    |v| {
        rules::length(v, 3, 50)?;
        rules::slug(v, &['_', '-', '.'])
    }
);

value_type!(ResourceDesc, resource_desc, |v| rules::length(v, 0, 200));

value_type!(ProjType, proj_type, |v| {
    rules::length(v, 1, 50)?;
    rules::no_whitespace(v)
});

value_type!(CoverId, cover_id, |v| {
    rules::length(v, 1, 10)?;
    rules::digits(v)
});

value_type!(
    /// Visibility of the backing repository.
    RepoType,
    repo_type,
    |v| rules::one_of(v, &[REPO_TYPE_PUBLIC, REPO_TYPE_PRIVATE, REPO_TYPE_ONLINE])
);

value_type!(ProtocolName, protocol_name, |v| {
    rules::length(v, 1, 50)?;
    rules::no_whitespace(v)
});

value_type!(
    /// Compute platform a project trains on.
    TrainingPlatform,
    training_platform,
    |v| {
        rules::length(v, 1, 50)?;
        rules::no_whitespace(v)
    }
);

value_type!(ResourceType, resource_type, |v| {
    rules::one_of(v, &[RESOURCE_TYPE_MODEL, RESOURCE_TYPE_DATASET, RESOURCE_TYPE_PROJECT])
});

impl RepoType {
    #[must_use]
    pub fn is_private(&self) -> bool {
        self.0 == REPO_TYPE_PRIVATE
    }
}

impl ResourceType {
    #[must_use]
    pub fn model() -> Self {
        Self(RESOURCE_TYPE_MODEL.to_string())
    }

    #[must_use]
    pub fn dataset() -> Self {
        Self(RESOURCE_TYPE_DATASET.to_string())
    }

    #[must_use]
    pub fn project() -> Self {
        Self(RESOURCE_TYPE_PROJECT.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DomainError;

    #[test]
    fn test_values_round_trip() {
        assert_eq!(Account::new("alice").unwrap().account(), "alice");
        assert_eq!(ProjName::new("my-proj.v2").unwrap().proj_name(), "my-proj.v2");
        assert_eq!(ResourceDesc::new("").unwrap().resource_desc(), "");
        assert_eq!(ProjType::new("cv").unwrap().proj_type(), "cv");
        assert_eq!(CoverId::new("12").unwrap().cover_id(), "12");
        assert_eq!(RepoType::new("private").unwrap().repo_type(), "private");
        assert_eq!(ProtocolName::new("MIT").unwrap().protocol_name(), "MIT");
        assert_eq!(TrainingPlatform::new("ModelArts").unwrap().training_platform(), "ModelArts");
        assert_eq!(ResourceType::new("dataset").unwrap().resource_type(), "dataset");
    }

    #[test]
    fn test_account_rules() {
        assert!(Account::new("ab").is_err());
        assert!(Account::new("_alice").is_err());
        assert!(Account::new("al ice").is_err());
        assert!(Account::new("a".repeat(41)).is_err());
        assert!(Account::new("alice_01-x").is_ok());
    }

    #[test]
    fn test_invalid_value_names_the_type() {
        let err = CoverId::new("abc").unwrap_err();
        let DomainError::InvalidValue(msg) = err;
        assert!(msg.starts_with("CoverId:"));
    }

    #[test]
    fn test_repo_type_is_closed_set() {
        assert!(RepoType::new("internal").is_err());
        assert!(RepoType::new(REPO_TYPE_PRIVATE).unwrap().is_private());
        assert!(!RepoType::new(REPO_TYPE_ONLINE).unwrap().is_private());
    }

    #[test]
    fn test_desc_counts_chars_not_bytes() {
        assert!(ResourceDesc::new("训".repeat(200)).is_ok());
        assert!(ResourceDesc::new("训".repeat(201)).is_err());
    }

    #[test]
    fn test_serde_goes_through_constructor() {
        let name: ProjName = serde_json::from_str("\"proj\"").unwrap();
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"proj\"");
        assert!(serde_json::from_str::<ProjName>("\"p\"").is_err());
    }
}
