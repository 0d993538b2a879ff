/// Routing boundary for the two observable output channels.
///
/// `display` carries operator-facing text, `transmit` carries fragments bound
/// for the remote session. The engine never reads from either sink and never
/// routes content across them; that separation is a hard invariant of the
/// instruction set, not a convention of any particular sink.
pub trait OutputDispatcher {
    fn display(&mut self, text: &str);
    fn transmit(&mut self, text: &str);
}

/// Captures both channels in order. The standard sink for tests and for
/// collecting a run's outputs alongside its terminal result.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordingDispatcher {
    pub displayed: Vec<String>,
    pub transmitted: Vec<String>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputDispatcher for RecordingDispatcher {
    fn display(&mut self, text: &str) {
        self.displayed.push(text.to_string());
    }

    fn transmit(&mut self, text: &str) {
        self.transmitted.push(text.to_string());
    }
}

/// Discards everything. Useful when only variable effects matter.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDispatcher;

impl OutputDispatcher for NullDispatcher {
    fn display(&mut self, _text: &str) {}

    fn transmit(&mut self, _text: &str) {}
}
