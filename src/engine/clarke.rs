use ndarray::{Array1, ArrayView1, Zip};
use rustfft::num_complex::Complex64;

use crate::engine::ThreePhaseSignal;
use crate::types::{ClarkeInvariant, Phase};

const HALF_SQRT_3: f64 = 0.866_025_403_784_438_6;

/// Stationary-frame (alpha, beta) components of a three-phase signal.
#[derive(Clone, Debug, PartialEq)]
pub struct ClarkeSignal {
    sample_spacing: f64,
    invariant: ClarkeInvariant,
    alpha: Array1<f64>,
    beta: Array1<f64>,
}
impl ClarkeSignal {
    pub fn len(&self) -> usize {
        self.alpha.len()
    }
    pub fn is_empty(&self) -> bool {
        self.alpha.is_empty()
    }
    pub fn sample_spacing(&self) -> f64 {
        self.sample_spacing
    }
    pub fn invariant(&self) -> ClarkeInvariant {
        self.invariant
    }
    pub fn alpha(&self) -> ArrayView1<'_, f64> {
        self.alpha.view()
    }
    pub fn beta(&self) -> ArrayView1<'_, f64> {
        self.beta.view()
    }
    /// `(alpha, beta)` at one instant.
    pub fn sample(&self, index: usize) -> Option<(f64, f64)> {
        Some((*self.alpha.get(index)?, *self.beta.get(index)?))
    }
    /// `alpha + j*beta` per sample.
    pub fn complex(&self) -> Vec<Complex64> {
        self.alpha
            .iter()
            .zip(self.beta.iter())
            .map(|(&a, &b)| Complex64::new(a, b))
            .collect()
    }
}

/// Maps phase quantities onto the alpha/beta plane under a chosen normalization.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClarkeTransformer {
    invariant: ClarkeInvariant,
}
impl ClarkeTransformer {
    pub fn new(invariant: ClarkeInvariant) -> Self {
        Self { invariant }
    }
    pub fn invariant(&self) -> ClarkeInvariant {
        self.invariant
    }
    /// alpha = k(a - b/2 - c/2), beta = k(sqrt3/2 b - sqrt3/2 c).
    pub fn project(&self, [a, b, c]: [f64; 3]) -> (f64, f64) {
        let k = self.invariant.gain();
        (
            k * (a - 0.5 * b - 0.5 * c),
            k * (HALF_SQRT_3 * b - HALF_SQRT_3 * c),
        )
    }
    pub fn transform(&self, signal: &ThreePhaseSignal) -> ClarkeSignal {
        let len = signal.len();
        let mut alpha = Array1::zeros(len);
        let mut beta = Array1::zeros(len);
        Zip::from(&mut alpha)
            .and(&mut beta)
            .and(signal.phase(Phase::A))
            .and(signal.phase(Phase::B))
            .and(signal.phase(Phase::C))
            .for_each(|alpha, beta, &a, &b, &c| {
                let (x, y) = self.project([a, b, c]);
                *alpha = x;
                *beta = y;
            });
        ClarkeSignal {
            sample_spacing: signal.sample_spacing(),
            invariant: self.invariant,
            alpha,
            beta,
        }
    }
}
