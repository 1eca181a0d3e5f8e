use crate::buffers::BufferId;

/// Services of the host application that some commands delegate to.
/// File I/O and tab management stay on the host side.
pub trait HostServices {
    fn save(&mut self, buffer: &BufferId);
    fn save_as(&mut self, buffer: &BufferId);
    fn list_buffers(&mut self);
    fn is_open(&self, buffer: &BufferId) -> bool;
    /// Bring `buffer` to the front. The host is expected to report the
    /// switch back through `EmacsMode::focus_buffer`.
    fn show_buffer(&mut self, buffer: &BufferId);
}

/// A request for the host. Commands queue these; they are delivered once
/// the mode state is unlocked, so the host may call back into the mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Save(BufferId),
    SaveAs(BufferId),
    ListBuffers,
    /// Skipped when the host no longer has the buffer open.
    ShowBuffer(BufferId),
}

impl HostCall {
    pub fn send_to(&self, host: &mut dyn HostServices) {
        match self {
            HostCall::Save(buffer) => host.save(buffer),
            HostCall::SaveAs(buffer) => host.save_as(buffer),
            HostCall::ListBuffers => host.list_buffers(),
            HostCall::ShowBuffer(buffer) if host.is_open(buffer) => host.show_buffer(buffer),
            HostCall::ShowBuffer(buffer) => log::debug!("{buffer} is no longer open"),
        }
    }
}

/// Host that only records what was asked of it.
#[derive(Debug, Default, Clone)]
pub struct RecordingHost {
    open: Vec<BufferId>,
    calls: Vec<HostCall>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_open(buffers: &[&str]) -> Self {
        Self {
            open: buffers.iter().copied().map(BufferId::from).collect(),
            calls: Vec::new(),
        }
    }

    pub fn open(&mut self, buffer: BufferId) {
        if !self.open.contains(&buffer) {
            self.open.push(buffer);
        }
    }

    pub fn close(&mut self, buffer: &BufferId) {
        self.open.retain(|b| b != buffer);
    }

    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }
}

impl HostServices for RecordingHost {
    fn save(&mut self, buffer: &BufferId) {
        self.calls.push(HostCall::Save(buffer.clone()));
    }

    fn save_as(&mut self, buffer: &BufferId) {
        self.calls.push(HostCall::SaveAs(buffer.clone()));
    }

    fn list_buffers(&mut self) {
        self.calls.push(HostCall::ListBuffers);
    }

    fn is_open(&self, buffer: &BufferId) -> bool {
        self.open.contains(buffer)
    }

    fn show_buffer(&mut self, buffer: &BufferId) {
        self.calls.push(HostCall::ShowBuffer(buffer.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_buffer_needs_open_buffer() {
        let mut host = RecordingHost::with_open(&["notes"]);
        HostCall::ShowBuffer(BufferId::new("gone")).send_to(&mut host);
        HostCall::ShowBuffer(BufferId::new("notes")).send_to(&mut host);
        HostCall::ListBuffers.send_to(&mut host);
        assert_eq!(
            host.calls(),
            &[HostCall::ShowBuffer(BufferId::new("notes")), HostCall::ListBuffers]
        );
    }
}
