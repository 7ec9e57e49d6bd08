use serde::{Deserialize, Serialize};

/// Paint color of a ground marker.
///
/// The discriminants are part of the lookup-table key layout and must not
/// change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerColor {
    Blue = 0,
    Black = 1,
    Red = 2,
    Green = 3,
    Yellow = 4,
}

impl MarkerColor {
    pub const COUNT: usize = 5;

    /// All colors in processing order.
    pub const ALL: [MarkerColor; 5] = [
        MarkerColor::Blue,
        MarkerColor::Black,
        MarkerColor::Red,
        MarkerColor::Green,
        MarkerColor::Yellow,
    ];

    /// The four grid colors (everything except yellow).
    pub const NON_YELLOW: [MarkerColor; 4] = [
        MarkerColor::Blue,
        MarkerColor::Black,
        MarkerColor::Red,
        MarkerColor::Green,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    #[inline]
    pub fn is_yellow(self) -> bool {
        self == MarkerColor::Yellow
    }

    pub fn name(self) -> &'static str {
        match self {
            MarkerColor::Blue => "blue",
            MarkerColor::Black => "black",
            MarkerColor::Red => "red",
            MarkerColor::Green => "green",
            MarkerColor::Yellow => "yellow",
        }
    }
}

impl std::fmt::Display for MarkerColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
