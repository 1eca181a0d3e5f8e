use crate::buffers::{BufferId, BufferMap};
use crate::surface::Position;

/// One mark per buffer. `set_mark` overwrites; there is no mark stack.
#[derive(Debug, Default)]
pub struct MarkManager {
    marks: BufferMap<Position>,
}

impl MarkManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_mark(&mut self, buffer: &BufferId, pos: Position) {
        self.marks.insert(buffer.clone(), pos);
    }

    pub fn mark(&self, buffer: &BufferId) -> Option<Position> {
        self.marks.get(buffer).copied()
    }

    /// Store `point` as the new mark and return the previous one. Nothing is
    /// stored when the buffer has no mark yet.
    pub fn exchange(&mut self, buffer: &BufferId, point: Position) -> Option<Position> {
        let slot = self.marks.get_mut(buffer)?;
        Some(std::mem::replace(slot, point))
    }

    /// Drop the mark of a closed buffer.
    pub fn cleanup_for_closed_buffer(&mut self, buffer: &BufferId) {
        self.marks.remove(buffer);
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}
