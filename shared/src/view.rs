//! View-selection state for the drill-down UI
//!
//! Three levels: categories → subcategories → product list. Selecting a
//! subcategory implies its parent category; clearing a category clears
//! the subcategory with it.

use serde::{Deserialize, Serialize};

/// Top-level screen mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Public stock browser
    #[default]
    Stock,
    /// Admin table and editors (requires a signed-in identity)
    Admin,
}

/// Drill-down selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSelection {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
}

impl ViewSelection {
    pub fn select_category(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.category.as_deref() != Some(name.as_str()) {
            self.subcategory = None;
        }
        self.category = Some(name);
    }

    pub fn select_subcategory(&mut self, category: impl Into<String>, name: impl Into<String>) {
        self.category = Some(category.into());
        self.subcategory = Some(name.into());
    }

    pub fn clear_subcategory(&mut self) {
        self.subcategory = None;
    }

    pub fn clear_category(&mut self) {
        self.category = None;
        self.subcategory = None;
    }

    /// Collapse one drill-down level; returns false when already at the top
    pub fn collapse(&mut self) -> bool {
        if self.subcategory.is_some() {
            self.subcategory = None;
            true
        } else if self.category.is_some() {
            self.category = None;
            true
        } else {
            false
        }
    }
}
