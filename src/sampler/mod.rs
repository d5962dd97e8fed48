pub mod qmc;
pub mod random;

/// Deterministic source of stratified samples attached to a shading point.
///
/// A context is identified by a seed (derived from the pixel and sample number by the renderer)
/// and a dimension offset that grows with every bounce, so nested integrals do not reuse the
/// dimensions of their parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleContext {
    seed: u64,
    dim_offset: u32,
}

/// Each bounce consumes this many dimensions of the underlying sequence.
const DIMS_PER_BOUNCE: u32 = 2;

impl SampleContext {
    pub fn new(seed: u64) -> Self {
        Self { seed, dim_offset: 0 }
    }

    /// Sample `index` out of `count` in dimension `dim`, in `[0, 1)`.
    ///
    /// Dimension 0 is stratified into `count` equal strata; higher dimensions use the radical
    /// inverse of the index, so that `(dim 0, dim 1)` forms a Hammersley point set. Every
    /// dimension is rotated by an offset hashed from the context so neighbouring points decorrelate.
    pub fn random(&self, index: usize, dim: usize, count: usize) -> f64 {
        let d = self.dim_offset as usize + dim;
        let shift = qmc::hash_to_unit(self.seed, d as u64);
        let v = if dim == 0 {
            (index as f64 + 0.5) / count.max(1) as f64
        } else {
            qmc::halton(d, index as u64)
        };
        qmc::mod1(v + shift)
    }

    /// Context for the point reached by the `index`-th ray traced from this one.
    pub fn split(&self, index: usize) -> Self {
        Self {
            seed: qmc::mix_bits(self.seed ^ qmc::mix_bits(index as u64 + 1)),
            dim_offset: self.dim_offset + DIMS_PER_BOUNCE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_is_deterministic() {
        let a = SampleContext::new(17);
        let b = SampleContext::new(17);
        for i in 0..32 {
            assert_eq!(a.random(i, 0, 32), b.random(i, 0, 32));
            assert_eq!(a.random(i, 1, 32), b.random(i, 1, 32));
        }
    }

    #[test]
    fn test_first_dimension_is_stratified() {
        let ctx = SampleContext::new(3);
        let n = 16;
        let mut strata = vec![0; n];
        for i in 0..n {
            let v = ctx.random(i, 0, n);
            assert!((0.0..1.0).contains(&v));
            strata[(v * n as f64) as usize] += 1;
        }
        assert!(strata.iter().all(|&c| c == 1), "{:?}", strata);
    }

    #[test]
    fn test_split_moves_to_new_dimensions() {
        let ctx = SampleContext::new(5);
        let child = ctx.split(0);
        assert_ne!(ctx, child);
        assert_ne!(ctx.random(0, 1, 1), child.random(0, 1, 1));
        assert_ne!(ctx.split(0), ctx.split(1));
    }
}
