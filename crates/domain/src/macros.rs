//! Macro for implementing Display and FromStr for small config enums
//!
//! Enums that appear both in config files and in environment variables need
//! one canonical spelling. The macro derives both directions from a single
//! mapping and parses case-insensitively.
//!
//! # Example
//!
//! ```rust
//! use cadence_domain::impl_domain_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Mode {
//!     Fast,
//!     Slow,
//! }
//!
//! impl_domain_enum_conversions!(Mode {
//!     Fast => "fast",
//!     Slow => "slow",
//! });
//!
//! assert_eq!("FAST".parse::<Mode>().unwrap(), Mode::Fast);
//! assert_eq!(Mode::Slow.to_string(), "slow");
//! ```

/// Implements Display and FromStr for unit-variant enums
///
/// - Display writes the mapped lowercase string
/// - FromStr accepts the mapped string in any letter case
#[macro_export]
macro_rules! impl_domain_enum_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl ::core::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl ::core::str::FromStr for $enum_name {
            type Err = ::std::string::String;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => ::core::result::Result::Ok(Self::$variant),)+
                    _ => ::core::result::Result::Err(::std::format!(
                        "Invalid {}: {}",
                        stringify!($enum_name),
                        s
                    )),
                }
            }
        }
    };
}
