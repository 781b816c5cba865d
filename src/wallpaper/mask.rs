//! Three-bit classification masks: [`Category`] and [`Purity`].
//!
//! Each mask has three mutually exclusive single-bit base values. Composite
//! values are bitwise unions and are used in search queries to mean "any of
//! these". On the wire a mask is a three-character binary string, most
//! significant bit first (`GENERAL | ANIME` renders as `"110"`).

use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign};
use std::str::FromStr;

use thiserror::Error;

/// Error returned when a mask string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} mask '{input}': expected a 3-digit binary string or one of {names}")]
pub struct MaskParseError {
    kind: &'static str,
    input: String,
    names: &'static str,
}

macro_rules! mask_type {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal,
        base: [$(($high:ident, $high_label:literal) = $high_bits:literal),+ $(,)?],
        composite: [$($composite:ident = $composite_bits:expr),+ $(,)?]
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(u8);

        impl $name {
            /// Empty mask; intersects nothing.
            pub const NONE: Self = Self(0);
            $(
                #[doc = concat!("Base value `", $high_label, "`.")]
                pub const $high: Self = Self($high_bits);
            )+
            $(
                pub const $composite: Self = Self($composite_bits);
            )+
            /// All base values.
            pub const ALL: Self = Self(0b111);

            const BASE: &'static [(Self, &'static str)] = &[$((Self::$high, $high_label)),+];

            /// Builds a mask from raw bits, dropping anything above the low three.
            #[must_use]
            pub const fn from_bits_truncate(bits: u8) -> Self {
                Self(bits & 0b111)
            }

            /// Raw bit value.
            #[must_use]
            pub const fn bits(self) -> u8 {
                self.0
            }

            #[must_use]
            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }

            /// Whether every bit of `other` is set in `self`.
            #[must_use]
            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            /// Whether `self` and `other` share at least one bit.
            #[must_use]
            pub const fn intersects(self, other: Self) -> bool {
                self.0 & other.0 != 0
            }

            /// Maps an API label (`"general"`, `"sfw"`, ...) to its base value.
            #[must_use]
            pub fn from_name(name: &str) -> Option<Self> {
                Self::BASE
                    .iter()
                    .find(|(_, label)| label.eq_ignore_ascii_case(name.trim()))
                    .map(|(value, _)| *value)
            }

            /// API label for a base value; `None` for composite or empty masks.
            #[must_use]
            pub fn name(self) -> Option<&'static str> {
                Self::BASE
                    .iter()
                    .find(|(value, _)| *value == self)
                    .map(|(_, label)| *label)
            }
        }

        impl BitOr for $name {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }

        impl BitAnd for $name {
            type Output = Self;
            fn bitand(self, rhs: Self) -> Self {
                Self(self.0 & rhs.0)
            }
        }

        impl BitAndAssign for $name {
            fn bitand_assign(&mut self, rhs: Self) {
                self.0 &= rhs.0;
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:03b}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = MaskParseError;

            /// Accepts `"110"` style binary strings or a base label.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.len() == 3 && trimmed.bytes().all(|b| b == b'0' || b == b'1') {
                    if let Ok(bits) = u8::from_str_radix(trimmed, 2) {
                        return Ok(Self(bits));
                    }
                }
                Self::from_name(trimmed).ok_or_else(|| MaskParseError {
                    kind: $kind,
                    input: s.to_string(),
                    names: concat!($($high_label, " "),+),
                })
            }
        }
    };
}

mask_type!(
    /// Wallpaper category mask (general / anime / people).
    Category, "category",
    base: [(GENERAL, "general") = 0b100, (ANIME, "anime") = 0b010, (PEOPLE, "people") = 0b001],
    composite: [
        GENERAL_ANIME = 0b110,
        GENERAL_PEOPLE = 0b101,
        ANIME_PEOPLE = 0b011,
    ]
);

mask_type!(
    /// Wallpaper purity mask (sfw / sketchy / nsfw).
    Purity, "purity",
    base: [(SFW, "sfw") = 0b100, (SKETCHY, "sketchy") = 0b010, (NSFW, "nsfw") = 0b001],
    composite: [
        SFW_SKETCHY = 0b110,
        SFW_NSFW = 0b101,
        SKETCHY_NSFW = 0b011,
    ]
);
