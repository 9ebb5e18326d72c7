/// WGS-84 equatorial radius in meters
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// A point on the local ground plane, in meters from the projection center
///
/// `x` grows eastwards, `z` grows southwards (north is `-z`), which keeps the
/// mesh right-handed with `y` pointing up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlanarPoint {
    pub x: f64,
    pub z: f64,
}

impl PlanarPoint {
    pub const fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    pub fn distance_squared(&self, other: &PlanarPoint) -> f64 {
        let dx = other.x - self.x;
        let dz = other.z - self.z;
        dx * dx + dz * dz
    }
}

/// Equirectangular projection from WGS84 to local meters
///
/// - x = (lon - center_lon) * (pi/180) * R * cos(center_lat)
/// - z = -(lat - center_lat) * (pi/180) * R
///
/// Good enough for footprints of a few tens of kilometers; precision drops
/// towards the poles and for very large radii.
pub fn project(lat: f64, lon: f64, center_lat: f64, center_lon: f64) -> PlanarPoint {
    Projector::new((center_lat, center_lon)).project(lat, lon)
}

/// Projection bound to a fixed center point
#[derive(Debug, Clone)]
pub struct Projector {
    center_lat: f64,
    center_lon: f64,
    cos_lat: f64,
}

impl Projector {
    /// Create a new projector centered at the given coordinates
    ///
    /// # Arguments
    /// * `center` - (lat, lon) center point in WGS84
    pub fn new(center: (f64, f64)) -> Self {
        let (lat, lon) = center;
        Self {
            center_lat: lat,
            center_lon: lon,
            cos_lat: lat.to_radians().cos(),
        }
    }

    /// Project a lat/lon point to local meters
    pub fn project(&self, lat: f64, lon: f64) -> PlanarPoint {
        let x = (lon - self.center_lon).to_radians() * EARTH_RADIUS_M * self.cos_lat;
        let z = -(lat - self.center_lat).to_radians() * EARTH_RADIUS_M;
        PlanarPoint { x, z }
    }

    /// Project a slice of (lat, lon) points
    pub fn project_points(&self, points: &[(f64, f64)]) -> Vec<PlanarPoint> {
        points
            .iter()
            .map(|&(lat, lon)| self.project(lat, lon))
            .collect()
    }

    pub fn center(&self) -> (f64, f64) {
        (self.center_lat, self.center_lon)
    }
}
