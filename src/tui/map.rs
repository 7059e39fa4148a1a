//! Map panel: viewport projection, landmarks and selection markers.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols::Marker,
    text::Span,
    widgets::{
        Block, Borders,
        canvas::{Canvas, Map, MapResolution, Points},
    },
};

use crate::domain::Coordinate;
use crate::tracker::{MarkerId, MarkerLayer};

/// Named points drawn on the map; the first is the default view centre.
pub const LANDMARKS: [(&str, f64, f64); 5] = [
    ("Carbon Compass HQ", 20.27, 85.84),
    ("New Delhi", 28.7041, 77.1025),
    ("Kolkata", 22.5726, 88.3639),
    ("Chennai", 13.0827, 80.2707),
    ("Mumbai", 19.0760, 72.8777),
];

/// Degrees moved per arrow-key press.
pub const CURSOR_STEP_DEG: f64 = 0.25;

/// Geographic window shown in the map panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub lat: [f64; 2],
    pub lng: [f64; 2],
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            lat: [5.0, 37.0],
            lng: [65.0, 98.0],
        }
    }
}

impl Viewport {
    /// Map a terminal cell inside `area` to the coordinate at its centre.
    pub fn cell_to_coordinate(&self, area: Rect, column: u16, row: u16) -> Option<(f64, f64)> {
        if area.width == 0 || area.height == 0 {
            return None;
        }
        let inside = column >= area.x
            && column < area.x + area.width
            && row >= area.y
            && row < area.y + area.height;
        if !inside {
            return None;
        }
        let u = (f64::from(column - area.x) + 0.5) / f64::from(area.width);
        let v = (f64::from(row - area.y) + 0.5) / f64::from(area.height);
        let lng = self.lng[0] + u * (self.lng[1] - self.lng[0]);
        let lat = self.lat[1] - v * (self.lat[1] - self.lat[0]);
        Some((lat, lng))
    }

    /// Move `from` by whole cursor steps, clamped to the viewport.
    pub fn step(&self, from: Coordinate, d_lat: i32, d_lng: i32) -> (f64, f64) {
        let lat = (from.lat() + f64::from(d_lat) * CURSOR_STEP_DEG).clamp(self.lat[0], self.lat[1]);
        let lng = (from.lng() + f64::from(d_lng) * CURSOR_STEP_DEG).clamp(self.lng[0], self.lng[1]);
        (lat, lng)
    }
}

/// Selection markers currently placed on the map.
#[derive(Debug, Default)]
pub struct MapMarkers {
    next: u64,
    placed: Vec<(MarkerId, Coordinate)>,
}

impl MapMarkers {
    pub fn coordinates(&self) -> impl Iterator<Item = Coordinate> + '_ {
        self.placed.iter().map(|(_, c)| *c)
    }
}

impl MarkerLayer for MapMarkers {
    fn place(&mut self, at: Coordinate) -> MarkerId {
        self.next += 1;
        let id = MarkerId(self.next);
        self.placed.push((id, at));
        id
    }

    fn release(&mut self, marker: MarkerId) {
        self.placed.retain(|(id, _)| *id != marker);
    }
}

/// Build the map canvas for one frame.
pub fn map_canvas<'a>(
    viewport: Viewport,
    hover: Option<Coordinate>,
    markers: &'a MapMarkers,
    title: String,
) -> Canvas<'a, impl Fn(&mut ratatui::widgets::canvas::Context<'_>) + 'a> {
    Canvas::default()
        .block(Block::default().title(title).borders(Borders::ALL))
        .marker(Marker::Braille)
        .x_bounds(viewport.lng)
        .y_bounds(viewport.lat)
        .paint(move |ctx| {
            ctx.draw(&Map {
                resolution: MapResolution::High,
                color: Color::DarkGray,
            });
            ctx.layer();

            for (name, lat, lng) in LANDMARKS {
                ctx.draw(&Points {
                    coords: &[(lng, lat)],
                    color: Color::Cyan,
                });
                ctx.print(lng, lat, Span::styled(format!(" {name}"), Style::default().fg(Color::Cyan)));
            }

            for c in markers.coordinates() {
                ctx.print(c.lng(), c.lat(), Span::styled("◉", Style::default().fg(Color::LightGreen)));
            }
            if let Some(h) = hover {
                ctx.print(h.lng(), h.lat(), Span::styled("+", Style::default().fg(Color::Yellow)));
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_cells_map_inside_bounds() {
        let vp = Viewport::default();
        let area = Rect::new(10, 5, 33, 32);

        let (lat, lng) = vp.cell_to_coordinate(area, 10, 5).unwrap();
        assert!((lat - 36.5).abs() < 1e-9);
        assert!((lng - 65.5).abs() < 1e-9);

        let (lat, lng) = vp.cell_to_coordinate(area, 42, 36).unwrap();
        assert!((lat - 5.5).abs() < 1e-9);
        assert!((lng - 97.5).abs() < 1e-9);
    }

    #[test]
    fn cells_outside_area_are_ignored() {
        let vp = Viewport::default();
        let area = Rect::new(10, 5, 33, 32);
        assert!(vp.cell_to_coordinate(area, 9, 6).is_none());
        assert!(vp.cell_to_coordinate(area, 43, 6).is_none());
        assert!(vp.cell_to_coordinate(Rect::new(0, 0, 0, 0), 0, 0).is_none());
    }

    #[test]
    fn cursor_step_is_clamped() {
        let vp = Viewport::default();
        let near_edge = Coordinate::new(36.9, 97.9).unwrap();
        assert_eq!(vp.step(near_edge, 1, 1), (37.0, 98.0));
        let hq = Coordinate::new(20.27, 85.84).unwrap();
        let (lat, lng) = vp.step(hq, -2, 0);
        assert!((lat - 19.77).abs() < 1e-9);
        assert_eq!(lng, 85.84);
    }

    #[test]
    fn markers_release_by_id() {
        let mut markers = MapMarkers::default();
        let a = markers.place(Coordinate::new(1.0, 1.0).unwrap());
        let _b = markers.place(Coordinate::new(2.0, 2.0).unwrap());
        markers.release(a);
        let left: Vec<_> = markers.coordinates().collect();
        assert_eq!(left, vec![Coordinate::new(2.0, 2.0).unwrap()]);
    }
}
