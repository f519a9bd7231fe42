//! Bounded fixpoint iteration

/// Outcome of a bounded fixpoint loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fixpoint {
    /// Number of steps executed
    pub steps: usize,
    /// A step reported no progress before the cap was hit
    pub converged: bool,
}

/// Run `step` until it reports no progress or `cap` steps have run
pub fn fixpoint(cap: usize, mut step: impl FnMut() -> bool) -> Fixpoint {
    let mut steps = 0;
    while steps < cap {
        steps += 1;
        if !step() {
            return Fixpoint {
                steps,
                converged: true,
            };
        }
    }
    Fixpoint {
        steps,
        converged: false,
    }
}
