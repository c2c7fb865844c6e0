//! Serial stand-ins for the rayon APIs used by the quantizer, so that the
//! no-`threads` build compiles the same call sites unchanged.

pub(crate) trait FakeRayonIter: Sized {
    fn into_par_iter(self) -> Self;
}

impl<T> FakeRayonIter for T where T: IntoIterator + Sized {
    #[inline(always)]
    fn into_par_iter(self) -> Self {
        self
    }
}
