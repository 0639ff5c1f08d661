//! Common type definitions and newtype wrappers for Discord snowflakes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Returns the raw snowflake value.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

snowflake!(
    /// A Discord server (guild) ID. The key of every stored configuration.
    GuildId
);
snowflake!(
    /// A Discord channel ID.
    ChannelId
);
snowflake!(
    /// A Discord role ID.
    RoleId
);
snowflake!(
    /// A Discord user ID.
    UserId
);

/// How a message is compared against the configured keyword.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// The keyword may appear anywhere in the message.
    #[default]
    Contains,
    /// The whole message must equal the keyword.
    Exact,
}

impl MatchPolicy {
    /// Returns whether `content` satisfies this policy for `keyword`.
    ///
    /// An empty keyword never matches.
    #[must_use]
    pub fn matches(self, content: &str, keyword: &str) -> bool {
        if keyword.is_empty() {
            return false;
        }
        match self {
            Self::Contains => content.contains(keyword),
            Self::Exact => content == keyword,
        }
    }

    /// The lowercase name used in configuration files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::Exact => "exact",
        }
    }
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "contains" | "substring" => Ok(Self::Contains),
            "exact" | "equals" => Ok(Self::Exact),
            other => Err(format!(
                "unknown match policy '{other}', expected 'contains' or 'exact'"
            )),
        }
    }
}
