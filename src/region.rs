use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Screen-space pixel rectangle in absolute coordinates (monitor offsets
/// already applied). Serializes as `[left, top, right, bottom]`, the shape
/// the interactive setup tool writes into its JSON config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

impl From<[i32; 4]> for Rect {
    fn from([left, top, right, bottom]: [i32; 4]) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

impl From<Rect> for [i32; 4] {
    fn from(r: Rect) -> Self {
        [r.left, r.top, r.right, r.bottom]
    }
}

/// Interactive region-of-interest picker: a modal overlay that lets the
/// user drag rectangles over a screenshot. Implemented by a GUI
/// collaborator outside this crate; the tracker side only consumes the
/// rectangles it returns.
pub trait RegionPicker {
    /// Ask the user for exactly `count` rectangles, showing `prompt` in the
    /// overlay. An empty result means the user cancelled.
    fn pick(&mut self, prompt: &str, count: usize) -> Result<Vec<Rect>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_matches_the_setup_tool_config_shape() {
        let r: Rect = serde_json::from_str("[10, 20, 110, 220]").unwrap();
        assert_eq!(
            r,
            Rect {
                left: 10,
                top: 20,
                right: 110,
                bottom: 220
            }
        );
        assert_eq!(r.width(), 100);
        assert_eq!(r.height(), 200);
        assert_eq!(serde_json::to_string(&r).unwrap(), "[10,20,110,220]");
    }
}
