//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time (a monotonic millisecond clock)
//! - The drawable surface the engine is constructed against
//! - Browser event wiring and the frame loop (`web`, wasm only)

#[cfg(target_arch = "wasm32")]
pub mod web;

use std::cell::Cell;
use std::rc::Rc;

/// Monotonic time source (milliseconds)
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Wall clock for native builds
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: std::time::Instant,
}

#[cfg(not(target_arch = "wasm32"))]
impl Default for SystemClock {
    fn default() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

/// Manually driven clock; clones share the same time
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// Drawable surface handle
pub trait Surface {
    /// Whether a drawing context can be obtained
    fn has_context(&self) -> bool;
    /// Pixel size, if the surface reports one
    fn size(&self) -> Option<(f32, f32)>;
}

/// Surface with no pixels behind it, for tests and the native demo
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadlessSurface {
    pub width: f32,
    pub height: f32,
    pub usable: bool,
}

impl HeadlessSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            usable: true,
        }
    }

    /// A surface that cannot produce a context
    pub fn broken() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            usable: false,
        }
    }
}

impl Surface for HeadlessSurface {
    fn has_context(&self) -> bool {
        self.usable
    }

    fn size(&self) -> Option<(f32, f32)> {
        (self.width > 0.0 && self.height > 0.0).then_some((self.width, self.height))
    }
}
