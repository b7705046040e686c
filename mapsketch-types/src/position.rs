use nalgebra::{Point2, Point3, Vector2};

/// World position of a marker. 2D positions are stored with `z == 0`.
pub type Position = Point3<f64>;

/// Planar position, used for screen coordinates.
pub type Position2d = Point2<f64>;

/// Creates a [`Position`] from two or three coordinates.
///
/// ```
/// use mapsketch_types::{pos, Position};
///
/// assert_eq!(pos!(10.0, 20.0), Position::new(10.0, 20.0, 0.0));
/// assert_eq!(pos!(1.0, 2.0, 3.0), Position::new(1.0, 2.0, 3.0));
/// ```
#[macro_export]
macro_rules! pos {
    ($x:expr, $y:expr) => {
        $crate::Position::new($x, $y, 0.0)
    };
    ($x:expr, $y:expr, $z:expr) => {
        $crate::Position::new($x, $y, $z)
    };
}

/// Point with planar `x` and `y` coordinates.
///
/// Hit testing on the map surface ignores elevation, so the distance helpers here only consider
/// the first two coordinates even for 3D points.
pub trait PlanarPoint {
    /// X coordinate.
    fn x(&self) -> f64;
    /// Y coordinate.
    fn y(&self) -> f64;

    /// Vector from `other` to `self`.
    fn sub(&self, other: &impl PlanarPoint) -> Vector2<f64> {
        Vector2::new(self.x() - other.x(), self.y() - other.y())
    }

    /// Square of the planar distance between two points.
    fn distance_sq(&self, other: &impl PlanarPoint) -> f64 {
        let v = self.sub(other);
        v.x * v.x + v.y * v.y
    }

    /// Planar distance between two points.
    fn distance(&self, other: &impl PlanarPoint) -> f64 {
        self.distance_sq(other).sqrt()
    }

    /// Sum of absolute coordinate differences.
    fn taxicab_distance(&self, other: &impl PlanarPoint) -> f64 {
        (self.x() - other.x()).abs() + (self.y() - other.y()).abs()
    }
}

impl PlanarPoint for Point2<f64> {
    fn x(&self) -> f64 {
        self.x
    }

    fn y(&self) -> f64 {
        self.y
    }
}

impl PlanarPoint for Point3<f64> {
    fn x(&self) -> f64 {
        self.x
    }

    fn y(&self) -> f64 {
        self.y
    }
}
