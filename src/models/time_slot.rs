use std::fmt;

use serde::{Deserialize, Serialize};

/// Two-hour dropoff/pickup window. Serialized as its display label.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TimeSlot {
    #[serde(rename = "7:00 - 9:00")]
    From7,
    #[serde(rename = "9:00 - 11:00")]
    From9,
    #[serde(rename = "11:00 - 13:00")]
    From11,
    #[serde(rename = "13:00 - 15:00")]
    From13,
    #[serde(rename = "15:00 - 17:00")]
    From15,
    #[serde(rename = "17:00 - 19:00")]
    From17,
    #[serde(rename = "19:00 - 21:00")]
    From19,
    #[serde(rename = "21:00 - 23:00")]
    From21,
    #[serde(rename = "23:00 - 1:00")]
    From23,
    #[serde(rename = "1:00 - 3:00")]
    From1,
    #[serde(rename = "3:00 - 5:00")]
    From3,
    #[serde(rename = "5:00 - 7:00")]
    From5,
}

pub const STANDARD_SLOTS: [TimeSlot; 7] = [
    TimeSlot::From7,
    TimeSlot::From9,
    TimeSlot::From11,
    TimeSlot::From13,
    TimeSlot::From15,
    TimeSlot::From17,
    TimeSlot::From19,
];

pub const ROUND_THE_CLOCK_SLOTS: [TimeSlot; 12] = [
    TimeSlot::From7,
    TimeSlot::From9,
    TimeSlot::From11,
    TimeSlot::From13,
    TimeSlot::From15,
    TimeSlot::From17,
    TimeSlot::From19,
    TimeSlot::From21,
    TimeSlot::From23,
    TimeSlot::From1,
    TimeSlot::From3,
    TimeSlot::From5,
];

impl TimeSlot {
    pub fn label(self) -> &'static str {
        match self {
            TimeSlot::From7 => "7:00 - 9:00",
            TimeSlot::From9 => "9:00 - 11:00",
            TimeSlot::From11 => "11:00 - 13:00",
            TimeSlot::From13 => "13:00 - 15:00",
            TimeSlot::From15 => "15:00 - 17:00",
            TimeSlot::From17 => "17:00 - 19:00",
            TimeSlot::From19 => "19:00 - 21:00",
            TimeSlot::From21 => "21:00 - 23:00",
            TimeSlot::From23 => "23:00 - 1:00",
            TimeSlot::From1 => "1:00 - 3:00",
            TimeSlot::From3 => "3:00 - 5:00",
            TimeSlot::From5 => "5:00 - 7:00",
        }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
