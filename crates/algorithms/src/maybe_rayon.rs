//! Sequential or rayon-backed row iteration.
//!
//! Calculators run single-threaded by default. The `parallel` feature swaps
//! the row loops over to rayon without touching the call sites; the
//! per-cell arithmetic and the output ordering are identical either way.
#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
mod sequential {
    /// Sequential stand-in for `rayon::prelude::IntoParallelIterator`.
    ///
    /// `into_par_iter()` is plain `into_iter()`, so the rest of the chain
    /// (`.flat_map()`, `.collect()`) resolves to `Iterator` methods.
    pub trait IntoParallelIterator {
        type Iter;
        type Item;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Iter = I::IntoIter;
        type Item = I::Item;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }
}

#[cfg(not(feature = "parallel"))]
pub use sequential::*;
