//! Macro for implementing Display and FromStr for domain enums
//!
//! Enums exchanged with the API (e.g. question difficulty) are rendered as
//! lowercase words and parsed case-insensitively.
//!
//! # Example
//!
//! ```rust
//! use quill_domain::impl_domain_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Tone {
//!     Formal,
//!     Casual,
//! }
//!
//! impl_domain_enum_conversions!(Tone {
//!     Formal => "formal",
//!     Casual => "casual",
//! });
//!
//! assert_eq!(Tone::Formal.to_string(), "formal");
//! assert_eq!("CASUAL".parse::<Tone>(), Ok(Tone::Casual));
//! ```

/// Implements `Display` and `FromStr` for a fieldless enum.
///
/// `FromStr` trims surrounding whitespace and ignores case; unknown values
/// produce a [`QuillError::Validation`](crate::QuillError::Validation) naming
/// the enum.
#[macro_export]
macro_rules! impl_domain_enum_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl ::std::str::FromStr for $enum_name {
            type Err = $crate::QuillError;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err($crate::QuillError::Validation(format!(
                        "invalid {}: {:?}",
                        stringify!($enum_name),
                        s
                    ))),
                }
            }
        }
    };
}
