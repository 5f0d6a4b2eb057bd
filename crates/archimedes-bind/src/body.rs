//! Body access shared by the form and JSON collectors.

use bytes::Bytes;

use crate::{BindContext, BindError, BindSource};

/// Takes the body out of `ctx`, enforcing `limit`.
///
/// The body counts as consumed even when it is rejected for its size.
pub(crate) fn take_body(
    ctx: &mut BindContext,
    source: BindSource,
    limit: usize,
) -> Result<Bytes, BindError> {
    let body = ctx.take_body()?;
    if body.len() > limit {
        tracing::debug!(%source, limit, actual = body.len(), "request body over limit");
        return Err(BindError::PayloadTooLarge {
            limit,
            actual: body.len(),
        });
    }
    tracing::trace!(%source, len = body.len(), "took request body");
    Ok(body)
}
