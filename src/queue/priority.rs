//! Message priority classes
//!
//! Priorities are totally ordered: `Low < Normal < High < UberHighSingleton`.
//! The ordering drives both insertion placement in the main sequence and the
//! singleton rule for the top tier.

use crate::queue::error::{QueueError, QueueResult};
use serde::Deserialize;
use std::str::FromStr;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Priority class of a queued message
///
/// `Low` work lives in its own FIFO and is only delivered once every
/// higher tier is empty. At most one `UberHighSingleton` message may be
/// queued at any instant; later ones are discarded while it is pending.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Display,
    AsRefStr,
    EnumIter,
    EnumString,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(try_from = "String")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    #[strum(to_string = "uber-high-singleton", serialize = "uberhighsingleton")]
    UberHighSingleton,
}

impl Priority {
    /// Parse a priority name, mapping failures into a queue error
    pub fn parse(value: &str) -> QueueResult<Self> {
        Priority::from_str(value.trim()).map_err(|_| QueueError::UnknownPriority {
            value: value.to_string(),
        })
    }
}

impl TryFrom<u8> for Priority {
    type Error = QueueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Priority::Low),
            1 => Ok(Priority::Normal),
            2 => Ok(Priority::High),
            3 => Ok(Priority::UberHighSingleton),
            other => Err(QueueError::UnknownPriority {
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Priority {
    type Error = QueueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Priority::parse(&value)
    }
}
