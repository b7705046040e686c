use mapsketch_types::{Position, Position2d};

/// Identifier of a viewer instance. A new id is assigned every time the map viewer is replaced.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct ViewerId(pub(crate) u64);

/// Kind of the viewer rendering the map.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ViewerKind {
    /// Flat 2D map.
    Flat2d,
    /// 3D globe.
    Globe3d,
}

/// Viewport of the map: what part of the world is shown on the screen.
///
/// Screen coordinates are in pixels from the top-left corner of the viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewer {
    id: ViewerId,
    kind: ViewerKind,
    center: Position,
    resolution: f64,
    width: f64,
    height: f64,
}

impl Viewer {
    /// Creates a new viewer centered at `center` with `resolution` map units per pixel.
    pub fn new(
        kind: ViewerKind,
        center: Position,
        resolution: f64,
        width: f64,
        height: f64,
    ) -> Self {
        Self {
            id: ViewerId::default(),
            kind,
            center,
            resolution,
            width,
            height,
        }
    }

    /// Id of the viewer.
    pub fn id(&self) -> ViewerId {
        self.id
    }

    pub(crate) fn with_id(mut self, id: ViewerId) -> Self {
        self.id = id;
        self
    }

    /// Kind of the viewer.
    pub fn kind(&self) -> ViewerKind {
        self.kind
    }

    /// World position in the center of the viewport.
    pub fn center(&self) -> Position {
        self.center
    }

    /// Size of one pixel in map units.
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Width and height of the viewport in pixels.
    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Returns true if the viewport has a non-empty size and a valid resolution.
    pub fn is_valid(&self) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && self.width.is_finite()
            && self.height.is_finite()
            && self.resolution > 0.0
            && self.resolution.is_finite()
    }

    /// Converts a screen pixel position into the world position on the map surface.
    ///
    /// Returns `None` if the viewport is not valid.
    pub fn screen_to_world(&self, px_position: Position2d) -> Option<Position> {
        if !self.is_valid() {
            return None;
        }

        let x = self.center.x + (px_position.x - self.width / 2.0) * self.resolution;
        let y = self.center.y + (self.height / 2.0 - px_position.y) * self.resolution;

        Some(Position::new(x, y, self.center.z))
    }

    /// Converts a world position into the screen pixel position.
    pub fn world_to_screen(&self, position: &Position) -> Option<Position2d> {
        if !self.is_valid() {
            return None;
        }

        let x = (position.x - self.center.x) / self.resolution + self.width / 2.0;
        let y = self.height / 2.0 - (position.y - self.center.y) / self.resolution;

        Some(Position2d::new(x, y))
    }

    /// Converts a distance in pixels into map units.
    pub fn px_to_map_distance(&self, px: f64) -> f64 {
        px * self.resolution
    }
}
