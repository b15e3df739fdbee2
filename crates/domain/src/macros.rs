//! Macro for implementing Display and FromStr for keyword enums
//!
//! Configuration values such as the refresh credential mode or the log
//! format arrive as strings from environment variables. This macro gives
//! those enums one case-insensitive parser and a lowercase display form.
//!
//! # Example
//!
//! ```rust
//! use tollgate_domain::impl_keyword_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Transport {
//!     Http,
//!     Grpc,
//! }
//!
//! impl_keyword_conversions!(Transport {
//!     Http => "http",
//!     Grpc => "grpc",
//! });
//!
//! assert_eq!("HTTP".parse::<Transport>(), Ok(Transport::Http));
//! assert_eq!(Transport::Grpc.to_string(), "grpc");
//! ```

/// Implements Display and FromStr traits for keyword enums
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their lowercase
///   keyword
#[macro_export]
macro_rules! impl_keyword_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
