//! Identity transform.

use crate::spatial::Point3;
use super::trait_::Transform;

/// Transform that returns every point unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityTransform;

impl Transform for IdentityTransform {
    #[inline]
    fn transform_point(&self, point: &Point3) -> Point3 {
        *point
    }
}
