//! Kinematic body shared by every entity in the arena

use serde::{Deserialize, Serialize};

use crate::core::types::{Bounds, Vec2};

/// Smallest allowed width or height
pub const MIN_DIMENSION: f32 = 1.0;

/// Below this distance `move_towards` leaves velocity untouched
const MOVE_EPSILON: f32 = 0.1;

/// Position, velocity and size of one movable body
///
/// Mass is derived (`width × height`) and kept in sync by every size change.
/// Side effects of all operations are confined to the body itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    width: f32,
    height: f32,
    mass: f32,
    pub max_speed: f32,
    pub acceleration: f32,
    pub active: bool,
    pub visible: bool,
    bounds: Bounds,
}

impl Body {
    pub fn new(position: Vec2, width: f32, height: f32) -> Self {
        let width = width.max(MIN_DIMENSION);
        let height = height.max(MIN_DIMENSION);
        Self {
            position,
            velocity: Vec2::ZERO,
            width,
            height,
            mass: width * height,
            max_speed: 5.0,
            acceleration: 0.5,
            active: true,
            visible: true,
            bounds: Bounds::centered(position, width, height),
        }
    }

    /// Square body of the given diameter
    pub fn circle(position: Vec2, diameter: f32) -> Self {
        Self::new(position, diameter, diameter)
    }

    pub fn with_max_speed(mut self, max_speed: f32) -> Self {
        self.max_speed = max_speed;
        self
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Characteristic size used for all size comparisons
    pub fn diameter(&self) -> f32 {
        self.width.max(self.height)
    }

    pub fn radius(&self) -> f32 {
        self.diameter() / 2.0
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    fn update_bounds(&mut self) {
        self.bounds = Bounds::centered(self.position, self.width, self.height);
    }

    /// Advance position by `velocity × dt`
    pub fn integrate(&mut self, dt: f32) {
        if !self.active {
            return;
        }
        self.position = self.position + self.velocity * dt;
        self.update_bounds();
    }

    /// Add `force / mass × acceleration` to velocity, then clamp
    pub fn apply_force(&mut self, fx: f32, fy: f32) {
        if !self.active {
            return;
        }
        self.velocity.x += fx / self.mass * self.acceleration;
        self.velocity.y += fy / self.mass * self.acceleration;
        self.normalize_velocity();
    }

    /// Clamp velocity magnitude to `max_speed`, keeping direction
    pub fn normalize_velocity(&mut self) {
        let speed = self.speed();
        if speed > self.max_speed && speed > 0.0 {
            self.velocity = self.velocity * (self.max_speed / speed);
        }
    }

    pub fn set_velocity(&mut self, vx: f32, vy: f32) {
        self.velocity = Vec2::new(vx, vy);
        self.normalize_velocity();
    }

    pub fn apply_friction(&mut self, factor: f32) {
        self.velocity = self.velocity * factor;
    }

    /// Point velocity at the target with the given magnitude
    ///
    /// Leaves velocity untouched when already within 0.1 units.
    pub fn move_towards(&mut self, target: Vec2, speed: f32) {
        let delta = target - self.position;
        let distance = delta.length();
        if distance > MOVE_EPSILON {
            self.velocity = delta * (speed / distance);
        }
    }

    /// Circle overlap test, symmetric in its arguments
    pub fn collides_with_circle(&self, other: &Body) -> bool {
        if !self.active || !other.active {
            return false;
        }
        circles_overlap(self.position, self.radius(), other.position, other.radius())
    }

    /// Axis-aligned overlap test on the cached bounds
    ///
    /// For round bodies (width == height) every circle overlap is also a
    /// bounds overlap, so this is a cheap reject before `collides_with_circle`.
    pub fn collides_with_rect(&self, other: &Body) -> bool {
        self.active && other.active && self.bounds.intersects(&other.bounds)
    }

    pub fn set_size(&mut self, width: f32, height: f32) {
        self.width = width.max(MIN_DIMENSION);
        self.height = height.max(MIN_DIMENSION);
        self.mass = self.width * self.height;
        self.update_bounds();
    }

    /// Grow (or shrink, for negative amounts) both dimensions
    pub fn increase_size(&mut self, amount: f32) {
        self.set_size(self.width + amount, self.height + amount);
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.update_bounds();
    }

    /// Keep the whole circle inside the arena, reflecting velocity at the walls
    pub fn bounce_in_bounds(&mut self, arena_width: f32, arena_height: f32) {
        let radius = self.radius();
        self.reflect_into(radius, arena_width - radius, radius, arena_height - radius);
    }

    /// Keep the center at least `margin` away from every wall
    pub fn clamp_to_arena(&mut self, arena_width: f32, arena_height: f32, margin: f32) {
        self.reflect_into(margin, arena_width - margin, margin, arena_height - margin);
    }

    fn reflect_into(&mut self, min_x: f32, max_x: f32, min_y: f32, max_y: f32) {
        if self.position.x < min_x {
            self.position.x = min_x;
            self.velocity.x = self.velocity.x.abs();
        } else if self.position.x > max_x {
            self.position.x = max_x;
            self.velocity.x = -self.velocity.x.abs();
        }

        if self.position.y < min_y {
            self.position.y = min_y;
            self.velocity.y = self.velocity.y.abs();
        } else if self.position.y > max_y {
            self.position.y = max_y;
            self.velocity.y = -self.velocity.y.abs();
        }
        self.update_bounds();
    }

    pub fn kill(&mut self) {
        self.active = false;
    }
}

/// Strict overlap of two circles
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    a.distance(&b) < ra + rb
}
