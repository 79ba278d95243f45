//! Incremental sync from mutation batches.

use std::rc::{Rc, Weak};

use log::{debug, trace};

use crate::error::Result;
use crate::host::{Host, Mutation, MutationHandler};
use crate::manager::{Shared, Tooltips};

impl<H: Host> Tooltips<H> {
    /// Apply one mutation batch: for each record, in report order, add the
    /// added nodes and then remove the removed ones.
    ///
    /// The watcher calls this for every delivered batch. Hosts without
    /// mutation observation can feed their own batches here instead of
    /// calling [`reload`](Tooltips::reload).
    pub fn apply(&self, batch: &[Mutation<H::Node>]) -> Result<()> {
        trace!("[tooltips {}] applying {} mutation(s)", self.id(), batch.len());
        for mutation in batch {
            for node in &mutation.added {
                self.add(*node)?;
            }
            for node in &mutation.removed {
                self.remove(*node)?;
            }
        }
        Ok(())
    }
}

/// Mutation callback holding only a weak reference, so the host's observer
/// list never keeps a manager alive.
pub(crate) fn mutation_handler<H: Host>(weak: Weak<Shared<H>>) -> MutationHandler<H::Node> {
    Rc::new(move |batch: &[Mutation<H::Node>]| {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        let tips = Tooltips::from_shared(inner);
        if let Err(err) = tips.apply(batch) {
            debug!("mutation batch dropped: {err}");
        }
    })
}
