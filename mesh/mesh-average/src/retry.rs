//! Bounded retries for transient load failures.

use std::time::Duration;

use mesh_io::IoResult;
use mesh_types::IndexedMesh;
use tracing::warn;

use crate::dataset::DatasetEntry;
use crate::source::MeshSource;

/// Load `entry`, retrying transient failures up to `max_retries` times.
///
/// The wait before retry `n` (1-based) is `delay * 2^(n-1)`. Permanent
/// errors return immediately.
pub(crate) fn load_with_retry<S>(
    source: &S,
    entry: &DatasetEntry,
    max_retries: usize,
    delay: Duration,
) -> IoResult<IndexedMesh>
where
    S: MeshSource + ?Sized,
{
    let mut wait = delay;
    let mut attempt = 0;
    loop {
        match source.load(entry) {
            Ok(mesh) => return Ok(mesh),
            Err(e) if e.is_transient() && attempt < max_retries => {
                attempt += 1;
                warn!(
                    id = %entry.id,
                    attempt,
                    max_retries,
                    error = %e,
                    "transient load failure, retrying"
                );
                if !wait.is_zero() {
                    std::thread::sleep(wait);
                }
                wait = wait.saturating_mul(2);
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_io::IoError;
    use mesh_types::{Point3, shapes::axis_aligned_box};
    use std::cell::Cell;
    use std::io::ErrorKind;

    fn flaky(
        failures: usize,
        calls: &Cell<usize>,
    ) -> impl Fn(&DatasetEntry) -> IoResult<IndexedMesh> + '_ {
        move |_| {
            calls.set(calls.get() + 1);
            if calls.get() <= failures {
                Err(IoError::Io(ErrorKind::TimedOut.into()))
            } else {
                Ok(axis_aligned_box(Point3::origin(), Point3::new(1.0, 1.0, 1.0)))
            }
        }
    }

    #[test]
    fn recovers_within_budget() {
        let calls = Cell::new(0);
        let source = flaky(3, &calls);
        let mesh = load_with_retry(&source, &DatasetEntry::new("a"), 3, Duration::ZERO).unwrap();
        assert_eq!(mesh.face_count(), 12);
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn gives_up_after_budget() {
        let calls = Cell::new(0);
        let source = flaky(10, &calls);
        let err =
            load_with_retry(&source, &DatasetEntry::new("a"), 2, Duration::ZERO).unwrap_err();
        assert!(err.is_transient());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn permanent_error_is_not_retried() {
        let calls = Cell::new(0);
        let source = |_: &DatasetEntry| -> IoResult<IndexedMesh> {
            calls.set(calls.get() + 1);
            Err(IoError::invalid_content("not a mesh"))
        };
        assert!(load_with_retry(&source, &DatasetEntry::new("a"), 5, Duration::ZERO).is_err());
        assert_eq!(calls.get(), 1);
    }
}
