//! Short-lived animated objects: pulse rings, bursts, trail particles.

use glam::Vec3;

/// A decaying object spawned by an event
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transient {
    pub position: Vec3,

    /// Units per second
    pub velocity: Vec3,

    /// Current size (world units or logical pixels, per mode)
    pub scale: f32,

    /// Size growth per second
    pub scale_rate: f32,

    pub opacity: f32,

    /// Opacity lost per second
    pub decay: f32,

    /// Caller-defined tag, e.g. a band index or chakra index
    pub tag: usize,
}

impl Transient {
    /// Stationary transient that fades at `decay` per second
    pub fn new(position: Vec3, scale: f32, decay: f32) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            scale,
            scale_rate: 0.0,
            opacity: 1.0,
            decay,
            tag: 0,
        }
    }

    pub fn expanding(mut self, scale_rate: f32) -> Self {
        self.scale_rate = scale_rate;
        self
    }

    pub fn moving(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn tagged(mut self, tag: usize) -> Self {
        self.tag = tag;
        self
    }

    pub fn step(&mut self, dt: f32) {
        self.position += self.velocity * dt;
        self.scale = (self.scale + self.scale_rate * dt).max(0.0);
        self.opacity = (self.opacity - self.decay * dt).max(0.0);
    }

    pub fn is_alive(&self) -> bool {
        self.opacity > 0.0
    }
}

/// Bounded set of transients; the oldest is dropped when full
#[derive(Clone, Debug)]
pub struct TransientPool {
    items: Vec<Transient>,
    capacity: usize,
}

impl TransientPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn spawn(&mut self, transient: Transient) {
        if self.capacity == 0 {
            return;
        }
        if self.items.len() == self.capacity {
            self.items.remove(0);
        }
        self.items.push(transient);
    }

    /// Advance every transient and cull the dead ones
    pub fn step(&mut self, dt: f32) {
        for item in &mut self.items {
            item.step(dt);
        }
        self.items.retain(Transient::is_alive);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transient> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Transient> {
        self.items.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_fades_out() {
        let mut ring = Transient::new(Vec3::ZERO, 0.1, 2.0).expanding(1.0);
        ring.step(0.25);
        assert!((ring.opacity - 0.5).abs() < 1e-6);
        assert!((ring.scale - 0.35).abs() < 1e-6);
        assert!(ring.is_alive());
        ring.step(0.25);
        assert!(!ring.is_alive());
    }

    #[test]
    fn test_pool_culls_dead() {
        let mut pool = TransientPool::new(8);
        pool.spawn(Transient::new(Vec3::ZERO, 1.0, 10.0));
        pool.spawn(Transient::new(Vec3::ZERO, 1.0, 0.5));
        pool.step(0.2);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_pool_drops_oldest_when_full() {
        let mut pool = TransientPool::new(3);
        for tag in 0..5 {
            pool.spawn(Transient::new(Vec3::ZERO, 1.0, 1.0).tagged(tag));
        }
        let tags: Vec<usize> = pool.iter().map(|t| t.tag).collect();
        assert_eq!(tags, vec![2, 3, 4]);
    }

    #[test]
    fn test_pool_iter_mut_steers() {
        let mut pool = TransientPool::new(2);
        pool.spawn(Transient::new(Vec3::ZERO, 1.0, 0.0));
        for item in pool.iter_mut() {
            item.velocity = Vec3::X;
        }
        pool.step(1.0);
        assert_eq!(pool.iter().next().unwrap().position, Vec3::X);
    }

    #[test]
    fn test_moving_transient() {
        let mut particle = Transient::new(Vec3::ZERO, 1.0, 0.0).moving(Vec3::Y);
        particle.step(0.5);
        assert_eq!(particle.position, Vec3::new(0.0, 0.5, 0.0));
        assert!(particle.is_alive());
    }
}
