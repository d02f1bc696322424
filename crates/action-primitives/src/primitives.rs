//! Command primitives
//!
//! Each primitive acts on every element a step resolved to, in the order the
//! resolver returned them:
//! 1. click - native click on each element
//! 2. input_text - set the value, then fire `input` and `change`
//! 3. open_link - collect hrefs and hand them to the tab host

mod click;
mod input_text;
mod open_link;

pub use click::*;
pub use input_text::*;
pub use open_link::*;

use crate::{errors::ActionError, types::ExecCtx};

/// Stop between elements once the context is cancelled.
pub(crate) fn check_cancelled(ctx: &ExecCtx, done: usize) -> Result<(), ActionError> {
    if ctx.is_cancelled() {
        return Err(ActionError::Interrupted(format!(
            "cancelled after {} element(s)",
            done
        )));
    }
    Ok(())
}
