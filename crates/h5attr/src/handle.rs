//! Per-path handle lifecycle.
//!
//! ```text
//! Unopened --read--> Open --close--> Closed
//!     |                                ^
//!     +--------failed open-------------+
//! ```
//!
//! `Closed` is terminal for a given [`FileHandle`]: the store drops the entry
//! and the next get-operation starts over with a fresh `Unopened` one.

use std::path::{Path, PathBuf};

use crate::backend::AttributeBackend;
use crate::error::{Error, Result};

#[derive(Debug)]
pub enum HandleState<H> {
    Unopened,
    Open(H),
    Closed,
}

#[derive(Debug)]
pub struct FileHandle<H> {
    path: PathBuf,
    state: HandleState<H>,
}

impl<H> FileHandle<H> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: HandleState::Unopened,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> &HandleState<H> {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, HandleState::Open(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, HandleState::Closed)
    }

    /// Run `f` against the open handle, opening it first if needed.
    ///
    /// A failed open moves the handle straight to `Closed`.
    pub fn read<B, T>(&mut self, backend: &B, f: impl FnOnce(&B, &H) -> Result<T>) -> Result<T>
    where
        B: AttributeBackend<Handle = H>,
    {
        let opened = match std::mem::replace(&mut self.state, HandleState::Closed) {
            HandleState::Open(h) => h,
            HandleState::Unopened => match backend.open(&self.path) {
                Ok(h) => {
                    tracing::debug!(
                        path = %self.path.display(),
                        backend = backend.name(),
                        "opened"
                    );
                    h
                }
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "open failed");
                    return Err(e);
                }
            },
            HandleState::Closed => return Err(Error::HandleClosed(self.path.clone())),
        };
        let result = f(backend, &opened);
        self.state = HandleState::Open(opened);
        result
    }

    /// Release the backend handle. Closing twice is a no-op.
    pub fn close<B>(&mut self, backend: &B) -> Result<()>
    where
        B: AttributeBackend<Handle = H>,
    {
        match std::mem::replace(&mut self.state, HandleState::Closed) {
            HandleState::Open(h) => {
                tracing::debug!(path = %self.path.display(), "closed");
                backend.close(h)
            }
            HandleState::Unopened | HandleState::Closed => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBackend;

    #[test]
    fn opens_lazily_once() {
        let backend = MockBackend::new().with_int("a.h5", "/", "N", 7);
        let mut h = FileHandle::new("a.h5");
        assert!(matches!(h.state(), HandleState::Unopened));

        for _ in 0..3 {
            let v = h.read(&backend, |b, fh| b.read_int(fh, "/", "N")).unwrap();
            assert_eq!(v, 7);
        }
        assert!(h.is_open());
        assert_eq!(backend.opens(), 1);
    }

    #[test]
    fn failed_read_keeps_handle_open() {
        let backend = MockBackend::new().with_int("a.h5", "/", "N", 7);
        let mut h = FileHandle::new("a.h5");
        let err = h.read(&backend, |b, fh| b.read_int(fh, "/", "Other")).unwrap_err();
        assert!(matches!(err, Error::AttributeNotFound { .. }));
        assert!(h.is_open());
    }

    #[test]
    fn failed_open_retires_handle() {
        let backend = MockBackend::new();
        let mut h = FileHandle::new("missing.h5");
        let err = h.read(&backend, |b, fh| b.read_int(fh, "/", "N")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
        assert!(h.is_closed());
        assert_eq!(backend.closes(), 0);
    }

    #[test]
    fn close_is_idempotent() {
        let backend = MockBackend::new().with_int("a.h5", "/", "N", 1);
        let mut h = FileHandle::new("a.h5");
        h.read(&backend, |b, fh| b.read_int(fh, "/", "N")).unwrap();
        h.close(&backend).unwrap();
        h.close(&backend).unwrap();
        assert!(h.is_closed());
        assert_eq!(backend.closes(), 1);

        let mut never = FileHandle::<<MockBackend as AttributeBackend>::Handle>::new("b.h5");
        never.close(&backend).unwrap();
        assert!(never.is_closed());
    }
}
