//! Monitor interface to the processor hold.

/// Request served while the core is held.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebugCommand {
    /// Read a physical address; the byte appears in the response slot.
    Read { address: u32 },
    Write { address: u32, data: u8 },
    /// Abandon the in-flight instruction and resume at `address`. Register
    /// writes it already committed stay in place.
    SetPc { address: u16 },
}

/// Attention/response handshake between a monitor and the core.
///
/// The monitor raises attention, waits for [`is_granted`](Self::is_granted),
/// submits commands one at a time and collects responses, then releases. In
/// trace mode the core also halts before every instruction until
/// [`step`](Self::step) hands it one credit.
#[derive(Debug, Default)]
pub struct DebugPort {
    attention: bool,
    granted: bool,
    command: Option<DebugCommand>,
    response: Option<u8>,
    trace: bool,
    step_credit: bool,
}

impl DebugPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_attention(&mut self) {
        self.attention = true;
    }

    pub fn release(&mut self) {
        self.attention = false;
    }

    pub fn attention(&self) -> bool {
        self.attention
    }

    pub fn is_granted(&self) -> bool {
        self.granted
    }

    pub fn submit(&mut self, command: DebugCommand) {
        self.command = Some(command);
        self.response = None;
    }

    /// No command waiting to be served.
    pub fn is_idle(&self) -> bool {
        self.command.is_none()
    }

    pub fn take_response(&mut self) -> Option<u8> {
        self.response.take()
    }

    pub fn set_trace(&mut self, on: bool) {
        self.trace = on;
        if !on {
            self.step_credit = false;
        }
    }

    pub fn trace(&self) -> bool {
        self.trace
    }

    /// Allow one instruction in trace mode.
    pub fn step(&mut self) {
        self.step_credit = true;
    }

    pub(crate) fn has_step_credit(&self) -> bool {
        self.step_credit
    }

    pub(crate) fn consume_step_credit(&mut self) -> bool {
        std::mem::take(&mut self.step_credit)
    }

    pub(crate) fn set_granted(&mut self, granted: bool) {
        self.granted = granted;
    }

    pub(crate) fn take_command(&mut self) -> Option<DebugCommand> {
        self.command.take()
    }

    pub(crate) fn respond(&mut self, data: u8) {
        self.response = Some(data);
    }
}
