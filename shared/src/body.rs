//! Handle to the presentational body the skater currently drives.
//!
//! Richer visuals can finish loading after the skater exists. Swapping the body only
//! changes this handle; physics state lives in the controller and is never recreated.

/// The currently driven body plus a generation counter bumped on each swap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrivenBody<H> {
    current: H,
    generation: u32,
}

impl<H: Copy + PartialEq> DrivenBody<H> {
    pub fn new(initial: H) -> Self {
        Self {
            current: initial,
            generation: 0,
        }
    }

    pub fn current(&self) -> H {
        self.current
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Swap in `next` and hand back the previous body so the caller can disable it.
    /// Replacing a body with itself is a no-op and returns `None`.
    pub fn replace(&mut self, next: H) -> Option<H> {
        if next == self.current {
            return None;
        }
        let previous = std::mem::replace(&mut self.current, next);
        self.generation += 1;
        Some(previous)
    }
}
