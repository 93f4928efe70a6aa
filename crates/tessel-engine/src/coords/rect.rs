/// Integer pixel rectangle with inclusive bounds (top-left origin).
///
/// An empty rectangle is representable: `min_x == max_x + 1` (or any
/// `min > max`) covers no pixels.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct PixelRect {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl PixelRect {
    #[inline]
    pub const fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Builds the rectangle covering `width x height` pixels starting at `(x, y)`.
    ///
    /// Non-positive sizes produce an empty rectangle.
    #[inline]
    pub fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x.saturating_add(width).saturating_sub(1),
            max_y: y.saturating_add(height).saturating_sub(1),
        }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    #[inline]
    pub fn width(self) -> i32 {
        if self.is_empty() { 0 } else { self.max_x - self.min_x + 1 }
    }

    #[inline]
    pub fn height(self) -> i32 {
        if self.is_empty() { 0 } else { self.max_y - self.min_y + 1 }
    }

    #[inline]
    pub fn contains(self, x: i32, y: i32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Intersection; the result may be empty.
    #[inline]
    pub fn intersect(self, other: PixelRect) -> PixelRect {
        PixelRect {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        }
    }
}
