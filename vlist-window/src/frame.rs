use alloc::vec::Vec;

/// Work deferred to the next animation frame ([`crate::WindowController::tick`]).
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum FrameTask<K> {
    /// Animate the translate offset of `items` back to zero.
    Play { items: Vec<K>, duration_ms: u64 },
    /// Release the lock and apply any pending update.
    Commit,
    /// Re-apply `offset` if the surface drifted away from it.
    Resnap { offset: u64, generation: u64 },
    /// Start a smooth scroll towards `to`.
    Tween { to: u64 },
}

/// Tasks queued for the next frame, in submission order.
///
/// At most one `Resnap` and one `Tween` are kept; later ones replace earlier ones.
#[derive(Clone, Debug)]
pub(crate) struct FrameQueue<K> {
    tasks: Vec<FrameTask<K>>,
}

impl<K> FrameQueue<K> {
    pub(crate) fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    pub(crate) fn push(&mut self, task: FrameTask<K>) {
        match task {
            FrameTask::Resnap { .. } => self
                .tasks
                .retain(|t| !matches!(t, FrameTask::Resnap { .. })),
            FrameTask::Tween { .. } => self.cancel_tween(),
            FrameTask::Play { .. } | FrameTask::Commit => {}
        }
        self.tasks.push(task);
    }

    pub(crate) fn cancel_tween(&mut self) {
        self.tasks.retain(|t| !matches!(t, FrameTask::Tween { .. }));
    }

    /// Takes every queued task. Tasks pushed while these run land in the next frame.
    pub(crate) fn take(&mut self) -> Vec<FrameTask<K>> {
        core::mem::take(&mut self.tasks)
    }

    pub(crate) fn clear(&mut self) {
        self.tasks.clear();
    }

    /// Whether a FLIP, jump or focus animation is queued.
    pub(crate) fn has_animation(&self) -> bool {
        self.tasks
            .iter()
            .any(|t| matches!(t, FrameTask::Play { .. } | FrameTask::Tween { .. }))
    }
}
