//! Unit Gaussian convolution kernels.
//!
//! Kernels describe a Gaussian of standard deviation 1 sampled `scale` times
//! per standard deviation and truncated at `range` standard deviations, so a
//! kernel has `2·range·scale + 1` taps centred on the middle one. Two
//! flavours exist:
//!
//! - **Point**: `exp(-k²/(2·scale²))` at each tap.
//! - **Erf**: the Gaussian integrated over the bin `[k - ½, k + ½]`, which
//!   aliases less when the kernel is coarse relative to the signal.
//!
//! Both are normalised to unit sum so that convolution preserves mass.


use std::f64::consts::SQRT_2;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;
use statrs::function::erf::erfc;

/// Source of unit Gaussian kernels for the engine.
pub trait KernelProvider: Send + Sync {
    /// Point-sampled kernel with `2·range·scale + 1` taps.
    fn unit_gaussian_kernel(&self, scale: usize, range: usize) -> Arc<[f64]>;

    /// Bin-integrated kernel, preferred over the point kernel when offered.
    fn erf_gaussian_kernel(&self, _scale: usize, _range: usize) -> Option<Arc<[f64]>> {
        None
    }
}

/// Kernel flavour, also the cache key discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelFlavour {
    Point,
    Erf,
}

/// Build a normalised point-sampled unit Gaussian kernel.
pub fn point_kernel(scale: usize, range: usize) -> Vec<f64> {
    assert!(scale > 0, "Kernel scale must be positive");
    let radius = range * scale;
    let inv_two_scale_sq = 0.5 / (scale * scale) as f64;
    let mut kernel: Vec<f64> = (0..=2 * radius)
        .map(|i| {
            let k = i as f64 - radius as f64;
            (-k * k * inv_two_scale_sq).exp()
        })
        .collect();
    normalize(&mut kernel);
    kernel
}

/// Build a normalised bin-integrated unit Gaussian kernel.
///
/// Tail bins use `erfc` differences so that they keep full relative
/// precision out to where the Gaussian underflows.
pub fn erf_kernel(scale: usize, range: usize) -> Vec<f64> {
    assert!(scale > 0, "Kernel scale must be positive");
    let radius = range * scale;
    let denom = scale as f64 * SQRT_2;
    let mut kernel = vec![0.0; 2 * radius + 1];

    kernel[radius] = 1.0 - erfc(0.5 / denom);
    for k in 1..=radius {
        let lower = (k as f64 - 0.5) / denom;
        let upper = (k as f64 + 0.5) / denom;
        let value = 0.5 * (erfc(lower) - erfc(upper));
        kernel[radius + k] = value;
        kernel[radius - k] = value;
    }
    normalize(&mut kernel);
    kernel
}

fn normalize(kernel: &mut [f64]) {
    let sum: f64 = kernel.iter().sum();
    for v in kernel.iter_mut() {
        *v /= sum;
    }
}

/// Kernel provider that builds each `(flavour, scale, range)` kernel once.
///
/// Shared between engine clones through an `Arc`, so lookups take a read
/// lock and only a miss takes the write lock.
#[derive(Debug, Default)]
pub struct GaussianKernelCache {
    kernels: RwLock<HashMap<(KernelFlavour, usize, usize), Arc<[f64]>>>,
}

impl GaussianKernelCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kernel(&self, flavour: KernelFlavour, scale: usize, range: usize) -> Arc<[f64]> {
        let key = (flavour, scale, range);
        if let Some(kernel) = self.kernels.read().get(&key) {
            return Arc::clone(kernel);
        }

        let kernel: Arc<[f64]> = match flavour {
            KernelFlavour::Point => point_kernel(scale, range),
            KernelFlavour::Erf => erf_kernel(scale, range),
        }
        .into();

        tracing::trace!(?flavour, scale, range, taps = kernel.len(), "Built Gaussian kernel");

        Arc::clone(self.kernels.write().entry(key).or_insert(kernel))
    }

    /// Number of distinct kernels held.
    pub fn len(&self) -> usize {
        self.kernels.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KernelProvider for GaussianKernelCache {
    fn unit_gaussian_kernel(&self, scale: usize, range: usize) -> Arc<[f64]> {
        self.kernel(KernelFlavour::Point, scale, range)
    }

    fn erf_gaussian_kernel(&self, scale: usize, range: usize) -> Option<Arc<[f64]>> {
        Some(self.kernel(KernelFlavour::Erf, scale, range))
    }
}
