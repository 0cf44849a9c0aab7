//! Axis-aligned bounding box with double precision for scene-scale clouds.

use glam::DVec3;

/// Double-precision axis-aligned bounding box.
///
/// Containment is inclusive on every face, so a point lying exactly on a
/// shared face of two sibling octants is contained by both. The octree
/// resolves that ambiguity by octant order, not here.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb3 {
	/// Minimum corner (inclusive).
	pub min: DVec3,
	/// Maximum corner (inclusive).
	pub max: DVec3,
}

impl Aabb3 {
	/// Create a new AABB from min and max corners.
	///
	/// # Panics
	/// Debug-asserts that min <= max on all axes.
	pub fn new(min: DVec3, max: DVec3) -> Self {
		debug_assert!(
			min.x <= max.x && min.y <= max.y && min.z <= max.z,
			"AABB min must be <= max on all axes"
		);
		Self { min, max }
	}

	/// Smallest box enclosing every finite point in `points`.
	///
	/// Returns `None` when there is no finite point to enclose.
	pub fn from_points<'a>(points: impl IntoIterator<Item = &'a DVec3>) -> Option<Self> {
		points
			.into_iter()
			.filter(|p| p.is_finite())
			.fold(None, |acc: Option<Self>, p| match acc {
				None => Some(Self { min: *p, max: *p }),
				Some(b) => Some(Self {
					min: b.min.min(*p),
					max: b.max.max(*p),
				}),
			})
	}

	/// Grow the box by `margin` on every side.
	#[inline]
	pub fn expanded(&self, margin: f64) -> Self {
		Self {
			min: self.min - DVec3::splat(margin),
			max: self.max + DVec3::splat(margin),
		}
	}

	/// Check if this AABB overlaps with another.
	///
	/// Two AABBs overlap if they share any interior or boundary points.
	#[inline]
	pub fn overlaps(&self, other: &Aabb3) -> bool {
		self.min.x <= other.max.x
			&& self.max.x >= other.min.x
			&& self.min.y <= other.max.y
			&& self.max.y >= other.min.y
			&& self.min.z <= other.max.z
			&& self.max.z >= other.min.z
	}

	/// Check if this AABB contains a point.
	///
	/// NaN coordinates are never contained.
	#[inline]
	pub fn contains_point(&self, point: DVec3) -> bool {
		point.x >= self.min.x
			&& point.x <= self.max.x
			&& point.y >= self.min.y
			&& point.y <= self.max.y
			&& point.z >= self.min.z
			&& point.z <= self.max.z
	}

	/// Check if `other` lies entirely inside this AABB.
	#[inline]
	pub fn contains_aabb(&self, other: &Aabb3) -> bool {
		self.contains_point(other.min) && self.contains_point(other.max)
	}

	/// Get the extent of the AABB (max - min).
	#[inline]
	pub fn extent(&self) -> DVec3 {
		self.max - self.min
	}

	/// Diagonal length of the box.
	#[inline]
	pub fn size(&self) -> f64 {
		self.extent().length()
	}

	/// Volume enclosed by the box.
	#[inline]
	pub fn volume(&self) -> f64 {
		self.extent().element_product()
	}

	/// Get the center of the AABB.
	#[inline]
	pub fn center(&self) -> DVec3 {
		(self.min + self.max) * 0.5
	}

	/// Closest point on or inside the box to `point`.
	#[inline]
	pub fn clamp_point(&self, point: DVec3) -> DVec3 {
		point.clamp(self.min, self.max)
	}

	/// Squared distance from `point` to the box (0 when inside).
	///
	/// Lower bound for the distance from `point` to anything stored in the
	/// box; queries prune on it.
	#[inline]
	pub fn distance_squared_to(&self, point: DVec3) -> f64 {
		self.clamp_point(point).distance_squared(point)
	}

	/// Child box for `octant` (0-7), split at this box's center.
	///
	/// Octant bits select the high half per axis:
	/// - bit 0: X
	/// - bit 1: Y
	/// - bit 2: Z
	pub fn octant(&self, octant: u8) -> Self {
		debug_assert!(octant < 8, "octant must be in 0..8");
		let center = self.center();
		let pick = |bit: u8, lo: f64, mid: f64, hi: f64| {
			if octant & bit == 0 {
				(lo, mid)
			} else {
				(mid, hi)
			}
		};
		let (min_x, max_x) = pick(1, self.min.x, center.x, self.max.x);
		let (min_y, max_y) = pick(2, self.min.y, center.y, self.max.y);
		let (min_z, max_z) = pick(4, self.min.z, center.z, self.max.z);
		Self {
			min: DVec3::new(min_x, min_y, min_z),
			max: DVec3::new(max_x, max_y, max_z),
		}
	}
}
