//! The capability the runner needs from a device: run the configured
//! multiplication and hand back the product.

use crate::error::Result;
use crate::matrix::MatmulDims;

/// A compute device with a matrix product already set up on it.
///
/// Calls are awaited one at a time; implementations may assume no call
/// overlaps another.
#[allow(async_fn_in_trait)]
pub trait ComputeBackend {
    /// Shape of the product this backend computes.
    fn dims(&self) -> MatmulDims;

    /// Run the product, wait for completion and read the `m×n` result back
    /// (without any device-side header).
    async fn compute_once(&mut self) -> Result<Vec<f32>>;

    /// Run the product and wait for completion without reading back.
    async fn dispatch(&mut self) -> Result<()> {
        self.compute_once().await.map(|_| ())
    }
}
