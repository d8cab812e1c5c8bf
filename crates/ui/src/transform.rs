//! View/page coordinate conversion
//!
//! The overlay editor receives pointer input in view coordinates and
//! mutates annotations in page coordinates. A [`ViewTransform`] captures
//! the zoom factor and the page point sitting at the view origin; axes
//! are page-aligned (the host applies any device-specific flipping before
//! events reach the editor).

use overtype_core::geometry::PagePoint;

/// A point in view coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewPoint {
    pub x: f32,
    pub y: f32,
}

impl ViewPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &ViewPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Mapping between view and page space for one page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    /// View units per page point; always positive
    zoom: f32,

    /// Page point at the view origin
    origin: PagePoint,
}

impl ViewTransform {
    pub fn new(zoom: f32, origin: PagePoint) -> Self {
        Self {
            zoom: zoom.max(0.01),
            origin,
        }
    }

    /// 1:1 mapping with the page origin at the view origin
    pub fn identity() -> Self {
        Self::new(1.0, PagePoint::new(0.0, 0.0))
    }

    /// Zoomed mapping with the page origin at the view origin
    pub fn with_zoom(zoom: f32) -> Self {
        Self::new(zoom, PagePoint::new(0.0, 0.0))
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Convert a view point to page coordinates
    pub fn to_page(&self, view: ViewPoint) -> PagePoint {
        PagePoint::new(
            self.origin.x + view.x / self.zoom,
            self.origin.y + view.y / self.zoom,
        )
    }

    /// Convert a page point to view coordinates
    pub fn to_view(&self, page: PagePoint) -> ViewPoint {
        ViewPoint::new(
            (page.x - self.origin.x) * self.zoom,
            (page.y - self.origin.y) * self.zoom,
        )
    }

    /// Convert a view-space length to page points
    pub fn len_to_page(&self, len: f32) -> f32 {
        len / self.zoom
    }

    /// Convert a page-space length to view units
    pub fn len_to_view(&self, len: f32) -> f32 {
        len * self.zoom
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_round_trip() {
        let t = ViewTransform::identity();
        let page = t.to_page(ViewPoint::new(200.0, 300.0));
        assert_eq!(page, PagePoint::new(200.0, 300.0));
        let view = t.to_view(page);
        assert_eq!(view, ViewPoint::new(200.0, 300.0));
    }

    #[test]
    fn test_zoom_scales_lengths() {
        let t = ViewTransform::with_zoom(2.0);
        assert_eq!(t.len_to_page(160.0), 80.0);
        assert_eq!(t.len_to_page(30.0), 15.0);
        assert_eq!(t.len_to_view(15.0), 30.0);
    }

    #[test]
    fn test_offset_origin() {
        let t = ViewTransform::new(2.0, PagePoint::new(100.0, 50.0));
        let page = t.to_page(ViewPoint::new(20.0, 10.0));
        assert_eq!(page, PagePoint::new(110.0, 55.0));
        assert_eq!(t.to_view(page), ViewPoint::new(20.0, 10.0));
    }

    #[test]
    fn test_zoom_floor() {
        let t = ViewTransform::with_zoom(0.0);
        assert!(t.zoom() > 0.0);
    }

    #[test]
    fn test_view_distance() {
        let a = ViewPoint::new(0.0, 0.0);
        let b = ViewPoint::new(3.0, 4.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-6);
    }
}
