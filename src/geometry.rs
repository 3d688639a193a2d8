use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn top(self) -> f64 {
        self.y.min(self.y + self.height)
    }

    pub fn bottom(self) -> f64 {
        self.y.max(self.y + self.height)
    }

    pub fn left(self) -> f64 {
        self.x.min(self.x + self.width)
    }
}

/// Box drawn around a tracked item in the outline layer.
///
/// The box is taller than the item by `margin` on both sides so the item
/// is still reported while it slides under a sentinel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutlineGeometry {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl OutlineGeometry {
    pub fn for_rect(rect: Rect, margin: f64) -> Self {
        // Elements hidden at measurement time report a zero width and would
        // never intersect anything.
        let force_width = rect.width == 0.0;
        Self {
            left: rect.left() - if force_width { 1.0 } else { 0.0 },
            top: rect.top() - margin,
            width: if force_width { 1.0 } else { rect.width },
            height: rect.height + margin * 2.0,
        }
    }

    pub fn to_style(self) -> String {
        format!(
            "left: {}px; top: {}px; width: {}px; height: {}px;",
            self.left, self.top, self.width, self.height
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_edges_follow_origin_and_size() {
        let rect = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(rect.top(), 20.0);
        assert_eq!(rect.bottom(), 60.0);
        assert_eq!(rect.left(), 10.0);
    }

    #[test]
    fn negative_size_normalizes_edges() {
        let rect = Rect::new(10.0, 20.0, -5.0, -10.0);
        assert_eq!(rect.top(), 10.0);
        assert_eq!(rect.bottom(), 20.0);
        assert_eq!(rect.left(), 5.0);
    }

    #[test]
    fn outline_extends_vertically_by_margin() {
        let outline = OutlineGeometry::for_rect(Rect::new(40.0, 100.0, 200.0, 24.0), 30.0);
        assert_eq!(
            outline,
            OutlineGeometry {
                left: 40.0,
                top: 70.0,
                width: 200.0,
                height: 84.0,
            }
        );
    }

    #[test]
    fn zero_width_outline_is_forced_to_one_and_shifted_left() {
        let outline = OutlineGeometry::for_rect(Rect::new(10.0, 50.0, 0.0, 20.0), 30.0);
        assert_eq!(outline.width, 1.0);
        assert_eq!(outline.left, 9.0);
        assert_eq!(outline.top, 20.0);
        assert_eq!(outline.height, 80.0);
    }

    #[test]
    fn outline_style_uses_pixels() {
        let style = OutlineGeometry::for_rect(Rect::new(10.0, 50.0, 0.0, 20.0), 30.0).to_style();
        assert_eq!(style, "left: 9px; top: 20px; width: 1px; height: 80px;");
    }
}
