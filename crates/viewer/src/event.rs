use blockworld_input::{CaptureChange, CaptureSignal, CaptureTarget, PointerButton};

use crate::controls::MoveKey;

/// Host window/document events after normalisation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    Resize { width: u32, height: u32 },
    CaptureChange(CaptureChange),
    CaptureError,
    Click(PointerButton),
    PointerMotion { dx: f32, dy: f32 },
    Key { key: MoveKey, pressed: bool },
}

impl HostEvent {
    /// Normalise a named capture event. `reported` is whatever the host
    /// currently reports as the capture owner; it is ignored for errors.
    pub fn from_capture_event(name: &str, reported: Option<CaptureTarget>) -> Option<Self> {
        match CaptureSignal::from_event_name(name)? {
            CaptureSignal::Change => Some(Self::CaptureChange(CaptureChange { reported })),
            CaptureSignal::Error => Some(Self::CaptureError),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_names_become_one_event() {
        let t = Some(CaptureTarget(1));
        let expected = HostEvent::CaptureChange(CaptureChange { reported: t });
        for name in ["pointerlockchange", "mozpointerlockchange", "webkitpointerlockchange"] {
            assert_eq!(HostEvent::from_capture_event(name, t), Some(expected));
        }
        assert_eq!(
            HostEvent::from_capture_event("webkitpointerlockerror", t),
            Some(HostEvent::CaptureError)
        );
        assert_eq!(HostEvent::from_capture_event("resize", t), None);
    }
}
