//! Size axis for stock counts

use serde::{Deserialize, Serialize};

/// Garment size, ordered smallest to largest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Size {
    #[serde(rename = "XS")]
    Xs,
    #[serde(rename = "S")]
    S,
    #[serde(rename = "M")]
    M,
    #[serde(rename = "L")]
    L,
    #[serde(rename = "XL")]
    Xl,
    #[serde(rename = "XXL")]
    Xxl,
    #[serde(rename = "3XL")]
    Xxxl,
}

impl Size {
    /// All sizes in display order
    pub const ALL: [Size; 7] = [
        Size::Xs,
        Size::S,
        Size::M,
        Size::L,
        Size::Xl,
        Size::Xxl,
        Size::Xxxl,
    ];

    /// Store/display label (also the key inside a product's `sizes` field)
    pub fn label(&self) -> &'static str {
        match self {
            Size::Xs => "XS",
            Size::S => "S",
            Size::M => "M",
            Size::L => "L",
            Size::Xl => "XL",
            Size::Xxl => "XXL",
            Size::Xxxl => "3XL",
        }
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-size stock quantities
///
/// Individual sizes missing from a document read as zero, and a document
/// with no `sizes` field at all deserializes to an all-zero chart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeChart {
    #[serde(rename = "XS", default)]
    pub xs: u32,
    #[serde(rename = "S", default)]
    pub s: u32,
    #[serde(rename = "M", default)]
    pub m: u32,
    #[serde(rename = "L", default)]
    pub l: u32,
    #[serde(rename = "XL", default)]
    pub xl: u32,
    #[serde(rename = "XXL", default)]
    pub xxl: u32,
    #[serde(rename = "3XL", default)]
    pub xxxl: u32,
}

impl SizeChart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quantity on hand for one size
    pub fn quantity(&self, size: Size) -> u32 {
        match size {
            Size::Xs => self.xs,
            Size::S => self.s,
            Size::M => self.m,
            Size::L => self.l,
            Size::Xl => self.xl,
            Size::Xxl => self.xxl,
            Size::Xxxl => self.xxxl,
        }
    }

    pub fn set(&mut self, size: Size, quantity: u32) {
        match size {
            Size::Xs => self.xs = quantity,
            Size::S => self.s = quantity,
            Size::M => self.m = quantity,
            Size::L => self.l = quantity,
            Size::Xl => self.xl = quantity,
            Size::Xxl => self.xxl = quantity,
            Size::Xxxl => self.xxxl = quantity,
        }
    }

    /// Builder-style variant of [`set`](Self::set)
    pub fn with(mut self, size: Size, quantity: u32) -> Self {
        self.set(size, quantity);
        self
    }

    /// Total quantity across all sizes
    pub fn total(&self) -> u32 {
        Size::ALL.iter().map(|s| self.quantity(*s)).sum()
    }
}
