//! Resource reconciler primitives
//!
//! Two check-then-act patterns shared by both phases: `ensure_exists` for
//! resources where declarative create is safe, `ensure_configured` for
//! resources where a destructive replace would lose state (the end-user
//! login, whose password must survive re-runs). Benign "already exists"
//! conflicts raised by a create are absorbed here and never surface.

use tracing::{debug, warn};

use snowshare_errors::{classify_conflict, Result};
use snowshare_session::Session;

/// Run `lookup`; when it returns no rows, run `create`.
///
/// Returns whether the resource already existed. A benign conflict from
/// `create` (concurrent or earlier creation) counts as existing.
pub fn ensure_exists(
    session: &mut dyn Session,
    step: &str,
    lookup: &str,
    create: &str,
) -> Result<bool> {
    let rows = session.query(lookup).map_err(|e| e.with_step(step))?;
    if !rows.is_empty() {
        debug!(step, "resource already present");
        return Ok(true);
    }
    match session.exec(create) {
        Ok(()) => {
            debug!(step, "resource created");
            Ok(false)
        }
        Err(e) => absorb_conflict(step, e),
    }
}

/// Run `lookup`; run `create` when absent, `update` when present.
///
/// The non-destructive variant: `update` is expected to leave state that
/// must be preserved (passwords) untouched. Returns whether the resource
/// already existed.
pub fn ensure_configured(
    session: &mut dyn Session,
    step: &str,
    lookup: &str,
    create: &str,
    update: &str,
) -> Result<bool> {
    let rows = session.query(lookup).map_err(|e| e.with_step(step))?;
    if rows.is_empty() {
        match session.exec(create) {
            Ok(()) => {
                debug!(step, "resource created");
                Ok(false)
            }
            Err(e) => absorb_conflict(step, e),
        }
    } else {
        session.exec(update).map_err(|e| e.with_step(step))?;
        debug!(step, "resource updated in place");
        Ok(true)
    }
}

/// Convert a benign already-exists conflict into `existed = true`;
/// propagate everything else as fatal
fn absorb_conflict(step: &str, error: snowshare_errors::ProvisionError) -> Result<bool> {
    match error.remote_message().and_then(classify_conflict) {
        Some(kind) => {
            warn!(step, ?kind, "create reported a benign conflict; continuing");
            Ok(true)
        }
        None => Err(error.with_step(step)),
    }
}
