use foundation::time::Time;

use crate::frame::Frame;

/// Frame-stamped trace event.
///
/// Structured text keeps the bus cheap; `kind` is a stable tag callers can
/// filter on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub frame_index: u64,
    pub time: Time,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, frame: Frame, kind: &'static str, message: impl Into<String>) {
        self.events.push(Event {
            frame_index: frame.index,
            time: frame.time,
            kind,
            message: message.into(),
        });
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        self.events.iter().filter(move |e| e.kind == kind)
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::EventBus;
    use crate::frame::Frame;
    use foundation::time::Time;

    #[test]
    fn records_events_with_frame_stamp() {
        let mut bus = EventBus::new();
        bus.emit(Frame::new(2, 16), "test", "hello");
        assert_eq!(bus.events().len(), 1);
        assert_eq!(bus.events()[0].frame_index, 2);
        assert_eq!(bus.events()[0].time, Time(32));
    }

    #[test]
    fn filters_by_kind_and_drains() {
        let mut bus = EventBus::new();
        bus.emit(Frame::new(0, 16), "a", "1");
        bus.emit(Frame::new(0, 16), "b", "2");
        bus.emit(Frame::new(1, 16), "a", "3");
        let msgs: Vec<_> = bus.of_kind("a").map(|e| e.message.as_str()).collect();
        assert_eq!(msgs, vec!["1", "3"]);

        let drained = bus.drain();
        assert_eq!(drained.len(), 3);
        assert!(bus.events().is_empty());
    }
}
