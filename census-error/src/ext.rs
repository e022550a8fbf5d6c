use crate::{CensusResult, ErrString};

/// Extension trait for [`CensusResult`].
pub trait ResultExt<T>: private::Sealed {
    /// Wrap the error, if any, with a lazily built context message.
    fn with_context<M, F>(self, msg: F) -> CensusResult<T>
    where
        M: Into<ErrString>,
        F: FnOnce() -> M;
}

mod private {
    use crate::CensusResult;

    pub trait Sealed {}

    impl<T> Sealed for CensusResult<T> {}
}

impl<T> ResultExt<T> for CensusResult<T> {
    fn with_context<M, F>(self, msg: F) -> CensusResult<T>
    where
        M: Into<ErrString>,
        F: FnOnce() -> M,
    {
        self.map_err(|e| e.with_context(msg()))
    }
}
