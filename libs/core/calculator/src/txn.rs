// [libs/core/calculator/src/txn.rs]
//! Small transactional helper replacing the exceptions-as-control-flow
//! pattern used around balance overwrite. Runs `action`; if it
//! fails, runs `undo` and surfaces the
//! original error — `undo` failing is reported distinctly so callers
//! know facility volumes may now be inconsistent.

pub fn with_rollback<T, E>(
    action: impl FnOnce() -> Result<T, E>,
    undo: impl FnOnce() -> Result<(), E>,
) -> Result<T, (E, Option<E>)> {
    match action() {
        Ok(value) => Ok(value),
        Err(action_error) => match undo() {
            Ok(()) => Err((action_error, None)),
            Err(undo_error) => Err((action_error, Some(undo_error))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_never_invokes_undo() {
        let mut undo_called = false;
        let result: Result<i32, (&str, Option<&str>)> =
            with_rollback(|| Ok::<i32, &str>(42), || {
                undo_called = true;
                Ok(())
            });
        assert_eq!(result.unwrap(), 42);
        assert!(!undo_called);
    }

    #[test]
    fn failure_runs_undo_and_reports_both() {
        let result = with_rollback(|| Err::<i32, &str>("save failed"), || Ok(()));
        assert_eq!(result.unwrap_err(), ("save failed", None));
    }

    #[test]
    fn undo_failure_is_reported_alongside_the_original_error() {
        let result = with_rollback(|| Err::<i32, &str>("save failed"), || Err("rollback failed"));
        assert_eq!(result.unwrap_err(), ("save failed", Some("rollback failed")));
    }
}
