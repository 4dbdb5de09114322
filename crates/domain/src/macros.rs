//! Macro for implementing Display and FromStr for label enums
//!
//! Several domain enums (context types, pattern types, goal targets) are
//! persisted and logged as stable lowercase labels. This macro provides both
//! directions of the conversion from a single mapping.
//!
//! # Example
//!
//! ```rust
//! use deskpulse_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Pointer {
//!     Mouse,
//!     Touchpad,
//! }
//!
//! impl_domain_status_conversions!(Pointer {
//!     Mouse => "mouse",
//!     Touchpad => "touchpad",
//! });
//!
//! assert_eq!(Pointer::Mouse.to_string(), "mouse");
//! ```

/// Implements Display and FromStr traits for label enums
///
/// - Display writes the mapped label
/// - FromStr parses case-insensitively and reports the enum name on failure
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
