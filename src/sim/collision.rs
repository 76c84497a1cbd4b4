//! Collision detection between circular bodies
//!
//! Everything in the arena is a circle. Overlap is strict: two circles that
//! only touch do not collide.

use glam::Vec2;

use super::state::{Enemy, EnemyProjectile, Player, PowerUp, Projectile};
use crate::circles_overlap;

/// Anything with a circular hitbox
pub trait Body {
    fn center(&self) -> Vec2;
    fn radius(&self) -> f32;
}

macro_rules! impl_body {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Body for $ty {
                #[inline]
                fn center(&self) -> Vec2 {
                    self.pos
                }

                #[inline]
                fn radius(&self) -> f32 {
                    self.radius
                }
            }
        )*
    };
}

impl_body!(Player, Enemy, Projectile, EnemyProjectile, PowerUp);

#[inline]
pub fn overlaps(a: &impl Body, b: &impl Body) -> bool {
    circles_overlap(a.center(), a.radius(), b.center(), b.radius())
}

/// Index of the first target `probe` overlaps, skipping any `skip` rejects.
///
/// Targets are scanned in slice order, which the state keeps sorted by id,
/// so ties always resolve the same way.
pub fn first_overlap<T: Body>(
    probe: &impl Body,
    targets: &[T],
    mut skip: impl FnMut(usize, &T) -> bool,
) -> Option<usize> {
    targets
        .iter()
        .enumerate()
        .find(|&(i, t)| !skip(i, t) && overlaps(probe, t))
        .map(|(i, _)| i)
}
