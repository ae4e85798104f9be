use tracing::{debug, warn};

use crate::error::FrameError;
use crate::tree::validate::check_joint_chain;
use crate::tree::{FrameId, FrameTree};

impl FrameTree {
    /// Delete a frame with its body and, for a primary frame, its joint chain.
    /// Returns every deleted id, the frame itself first.
    ///
    /// Containers cannot be deleted. Removing a chain member must leave a
    /// legal chain behind (an `elif` cannot be left dangling after an `else`).
    pub fn delete_frame(&mut self, id: FrameId) -> Result<Vec<FrameId>, FrameError> {
        if let Err(error) = self.check_deletion(id) {
            warn!(%id, %error, "frame deletion rejected");
            return Err(error);
        }
        let deleted = self.purge(id);
        debug!(%id, count = deleted.len(), "frame deleted");
        Ok(deleted)
    }

    fn check_deletion(&self, id: FrameId) -> Result<(), FrameError> {
        let object = self.require(id)?;
        if object.kind.is_container() {
            return Err(FrameError::violation(id, object.kind, "containers cannot be deleted"));
        }
        if let Some(primary) = object.joint_parent_id {
            let primary_object = self.require(primary)?;
            let remaining: Vec<_> = primary_object
                .joint_frame_ids
                .iter()
                .filter(|&&joint| joint != id)
                .filter_map(|joint| self.get(*joint))
                .map(|joint| joint.kind)
                .collect();
            check_joint_chain(primary_object.kind, &remaining)
                .map_err(|reason| FrameError::violation(primary, object.kind, reason))?;
        }
        Ok(())
    }

    /// Detach `id` from whichever list holds it and drop its whole subtree.
    pub(crate) fn purge(&mut self, id: FrameId) -> Vec<FrameId> {
        let Some(object) = self.frames.get(&id) else {
            return Vec::new();
        };
        let holder = object.joint_parent_id.or(object.parent_id);
        if let Some(holder) = holder.and_then(|holder| self.frames.get_mut(&holder)) {
            holder.children_ids.retain(|&child| child != id);
            holder.joint_frame_ids.retain(|&joint| joint != id);
        }
        let doomed = self.subtree(id);
        for frame in &doomed {
            self.frames.remove(frame);
        }
        doomed
    }
}
