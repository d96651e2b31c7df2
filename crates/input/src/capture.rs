use serde::{Deserialize, Serialize};

use crate::dispatch::PointerButton;

/// Message shown when the host cannot capture the pointer at all.
pub const NO_POINTER_LOCK_WARNING: &str = "No pointer lock functionality detected!";

const CAPTURE_REFUSED_WARNING: &str = "Pointer lock request was refused by the host.";

/// Identifies the element (window, canvas) that should own the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaptureTarget(pub u64);

/// Pointer capture lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Released,
    /// A request went to the host and no change event has answered it yet.
    Requesting,
    Captured,
}

/// Which click listener is currently armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickListener {
    /// Listeners were never installed (host lacks pointer capture).
    Detached,
    /// The next click issues a capture request.
    RequestCapture,
    /// Clicks are interaction events.
    Interact,
}

/// Result of routing one click through the armed listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    CaptureRequested,
    /// Forward to the interaction dispatcher.
    Interact(PointerButton),
    Ignored,
}

/// Host capture notifications after name normalisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureSignal {
    Change,
    Error,
}

impl CaptureSignal {
    /// Maps every vendor spelling of the capture events onto one signal.
    pub fn from_event_name(name: &str) -> Option<Self> {
        match name {
            "pointerlockchange" | "webkitpointerlockchange" | "mozpointerlockchange" => {
                Some(Self::Change)
            }
            "pointerlockerror" | "webkitpointerlockerror" | "mozpointerlockerror" => {
                Some(Self::Error)
            }
            _ => None,
        }
    }
}

/// A capture change as reported by the host: who holds the pointer now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureChange {
    pub reported: Option<CaptureTarget>,
}

/// What to do when the host refuses a capture request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureErrorPolicy {
    /// Acknowledge and carry on.
    #[default]
    Ignore,
    /// Surface through the warning channel.
    Warn,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CaptureError {
    #[error("capture listeners are not installed")]
    NotInstalled,
    #[error("capture can only be requested while released (currently {0:?})")]
    NotReleased(CaptureState),
    #[error("a capture request is still waiting for the host")]
    RequestPending,
}

/// The host environment's pointer capture primitives.
pub trait PointerLockHost {
    /// Whether the host exposes pointer capture at all.
    fn has_pointer_lock(&self) -> bool;

    /// Ask the host to capture the pointer for `target`. Fire-and-forget: the
    /// answer arrives later as a capture change or error event.
    fn request_pointer_lock(&mut self, target: CaptureTarget);
}

/// User-visible warning channel.
pub trait WarningSink {
    fn warn(&mut self, message: &str);
}

impl WarningSink for Vec<String> {
    fn warn(&mut self, message: &str) {
        self.push(message.to_string());
    }
}

/// Something whose input handling can be switched on and off, such as a camera rig.
pub trait ControlGate {
    fn set_enabled(&mut self, enabled: bool);
    fn is_enabled(&self) -> bool;
}

/// Owns the capture state and the designated target.
#[derive(Debug)]
pub struct InputCaptureController {
    target: CaptureTarget,
    state: CaptureState,
    listener: ClickListener,
    capability: Option<bool>,
    error_policy: CaptureErrorPolicy,
    requests_issued: u64,
    /// A request went to the host and neither a capture nor an error has
    /// answered it yet. Independent of `state`: a spurious change can release
    /// while the request is still pending.
    request_pending: bool,
}

impl InputCaptureController {
    pub fn new(target: CaptureTarget, error_policy: CaptureErrorPolicy) -> Self {
        Self {
            target,
            state: CaptureState::Released,
            listener: ClickListener::Detached,
            capability: None,
            error_policy,
            requests_issued: 0,
            request_pending: false,
        }
    }

    pub fn target(&self) -> CaptureTarget {
        self.target
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_captured(&self) -> bool {
        self.state == CaptureState::Captured
    }

    pub fn listener(&self) -> ClickListener {
        self.listener
    }

    pub fn is_installed(&self) -> bool {
        self.listener != ClickListener::Detached
    }

    /// Total capture requests sent to the host.
    pub fn requests_issued(&self) -> u64 {
        self.requests_issued
    }

    /// Whether a request is still waiting for the host's answer.
    pub fn is_request_pending(&self) -> bool {
        self.request_pending
    }

    /// Detect capture support and arm the click-to-request listener.
    ///
    /// Without support, warns once and leaves every listener detached; the
    /// viewer keeps rendering but camera control never activates.
    pub fn install(&mut self, host: &dyn PointerLockHost, warnings: &mut dyn WarningSink) -> bool {
        if let Some(available) = self.capability {
            return available;
        }

        let available = host.has_pointer_lock();
        self.capability = Some(available);
        if available {
            self.listener = ClickListener::RequestCapture;
            tracing::debug!(target_id = self.target.0, "capture listeners installed");
        } else {
            tracing::warn!("{NO_POINTER_LOCK_WARNING}");
            warnings.warn(NO_POINTER_LOCK_WARNING);
        }
        available
    }

    /// Route a click through whichever listener is armed.
    pub fn on_click(
        &mut self,
        button: PointerButton,
        host: &mut dyn PointerLockHost,
    ) -> ClickOutcome {
        match self.listener {
            ClickListener::Detached => ClickOutcome::Ignored,
            ClickListener::RequestCapture => match self.request_capture(host) {
                Ok(()) => ClickOutcome::CaptureRequested,
                Err(e) => {
                    tracing::debug!(error = %e, "click did not request capture");
                    ClickOutcome::Ignored
                }
            },
            ClickListener::Interact => ClickOutcome::Interact(button),
        }
    }

    /// Issue one capture request and swap the click listener for the
    /// interaction listener. Must be called from a user gesture.
    pub fn request_capture(&mut self, host: &mut dyn PointerLockHost) -> Result<(), CaptureError> {
        if self.listener == ClickListener::Detached {
            return Err(CaptureError::NotInstalled);
        }
        if self.state != CaptureState::Released {
            return Err(CaptureError::NotReleased(self.state));
        }
        if self.request_pending {
            return Err(CaptureError::RequestPending);
        }

        host.request_pointer_lock(self.target);
        self.requests_issued += 1;
        self.request_pending = true;
        self.state = CaptureState::Requesting;
        self.listener = ClickListener::Interact;
        tracing::debug!(target_id = self.target.0, "capture requested");
        Ok(())
    }

    /// Re-evaluate capture from the host's report. Safe to call spuriously:
    /// the resulting state depends only on the reported target, never on prior
    /// state. The request listener is re-armed only once no request is pending.
    pub fn on_capture_change(
        &mut self,
        change: CaptureChange,
        controls: &mut dyn ControlGate,
    ) -> CaptureState {
        if self.listener == ClickListener::Detached {
            return self.state;
        }

        let captured = change.reported == Some(self.target);
        let previous = self.state;
        if captured {
            self.state = CaptureState::Captured;
            self.request_pending = false;
        } else {
            self.state = CaptureState::Released;
            if !self.request_pending {
                self.listener = ClickListener::RequestCapture;
            }
        }
        controls.set_enabled(captured);

        if previous != self.state {
            tracing::debug!(from = ?previous, to = ?self.state, "capture state changed");
        }
        self.state
    }

    /// Host refused a capture request. Never changes state, but answers the
    /// pending request, so a controller already released can request again.
    pub fn on_capture_error(&mut self, warnings: &mut dyn WarningSink) {
        if std::mem::take(&mut self.request_pending) && self.state == CaptureState::Released {
            self.listener = ClickListener::RequestCapture;
        }
        match self.error_policy {
            CaptureErrorPolicy::Ignore => {
                tracing::debug!(state = ?self.state, "capture error acknowledged");
            }
            CaptureErrorPolicy::Warn => {
                tracing::warn!(state = ?self.state, "{CAPTURE_REFUSED_WARNING}");
                warnings.warn(CAPTURE_REFUSED_WARNING);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET: CaptureTarget = CaptureTarget(7);

    #[derive(Default)]
    struct FakeHost {
        supported: bool,
        requests: Vec<CaptureTarget>,
    }

    impl FakeHost {
        fn supported() -> Self {
            Self {
                supported: true,
                requests: Vec::new(),
            }
        }
    }

    impl PointerLockHost for FakeHost {
        fn has_pointer_lock(&self) -> bool {
            self.supported
        }

        fn request_pointer_lock(&mut self, target: CaptureTarget) {
            self.requests.push(target);
        }
    }

    #[derive(Default)]
    struct Gate(bool);

    impl ControlGate for Gate {
        fn set_enabled(&mut self, enabled: bool) {
            self.0 = enabled;
        }

        fn is_enabled(&self) -> bool {
            self.0
        }
    }

    fn installed() -> (InputCaptureController, FakeHost) {
        let host = FakeHost::supported();
        let mut ctl = InputCaptureController::new(TARGET, CaptureErrorPolicy::Ignore);
        let mut warnings: Vec<String> = Vec::new();
        assert!(ctl.install(&host, &mut warnings));
        assert!(warnings.is_empty());
        (ctl, host)
    }

    fn changed(target: Option<CaptureTarget>) -> CaptureChange {
        CaptureChange { reported: target }
    }

    #[test]
    fn vendor_event_names_normalise() {
        for name in ["pointerlockchange", "webkitpointerlockchange", "mozpointerlockchange"] {
            assert_eq!(CaptureSignal::from_event_name(name), Some(CaptureSignal::Change));
        }
        for name in ["pointerlockerror", "webkitpointerlockerror", "mozpointerlockerror"] {
            assert_eq!(CaptureSignal::from_event_name(name), Some(CaptureSignal::Error));
        }
        assert_eq!(CaptureSignal::from_event_name("click"), None);
    }

    #[test]
    fn starts_released_and_detached() {
        let ctl = InputCaptureController::new(TARGET, CaptureErrorPolicy::Ignore);
        assert_eq!(ctl.state(), CaptureState::Released);
        assert_eq!(ctl.listener(), ClickListener::Detached);
    }

    #[test]
    fn click_requests_then_change_captures() {
        let (mut ctl, mut host) = installed();
        let mut gate = Gate::default();

        assert_eq!(ctl.on_click(PointerButton::Left, &mut host), ClickOutcome::CaptureRequested);
        assert_eq!(ctl.state(), CaptureState::Requesting);
        assert_eq!(ctl.listener(), ClickListener::Interact);
        assert_eq!(host.requests, vec![TARGET]);

        assert_eq!(ctl.on_capture_change(changed(Some(TARGET)), &mut gate), CaptureState::Captured);
        assert!(gate.is_enabled());
    }

    #[test]
    fn loss_of_capture_releases_and_disables() {
        let (mut ctl, mut host) = installed();
        let mut gate = Gate::default();
        ctl.request_capture(&mut host).unwrap();
        ctl.on_capture_change(changed(Some(TARGET)), &mut gate);

        assert_eq!(ctl.on_capture_change(changed(None), &mut gate), CaptureState::Released);
        assert!(!gate.is_enabled());
        assert_eq!(ctl.listener(), ClickListener::RequestCapture);
    }

    #[test]
    fn change_outcome_ignores_prior_state() {
        let other = CaptureTarget(99);
        for prior in [None, Some(TARGET), Some(other)] {
            for reported in [None, Some(TARGET), Some(other)] {
                let (mut ctl, mut host) = installed();
                let mut gate = Gate::default();
                ctl.request_capture(&mut host).unwrap();
                ctl.on_capture_change(changed(prior), &mut gate);

                let expected = if reported == Some(TARGET) {
                    CaptureState::Captured
                } else {
                    CaptureState::Released
                };
                assert_eq!(ctl.on_capture_change(changed(reported), &mut gate), expected);
                assert_eq!(gate.is_enabled(), expected == CaptureState::Captured);
            }
        }
    }

    #[test]
    fn only_one_request_outstanding() {
        let (mut ctl, mut host) = installed();
        ctl.request_capture(&mut host).unwrap();
        assert_eq!(
            ctl.request_capture(&mut host),
            Err(CaptureError::NotReleased(CaptureState::Requesting))
        );
        // Clicks while requesting are interactions, not further requests.
        assert_eq!(
            ctl.on_click(PointerButton::Left, &mut host),
            ClickOutcome::Interact(PointerButton::Left)
        );
        assert_eq!(host.requests.len(), 1);
        assert_eq!(ctl.requests_issued(), 1);
    }

    #[test]
    fn request_from_captured_is_rejected() {
        let (mut ctl, mut host) = installed();
        let mut gate = Gate::default();
        ctl.request_capture(&mut host).unwrap();
        ctl.on_capture_change(changed(Some(TARGET)), &mut gate);
        assert_eq!(
            ctl.request_capture(&mut host),
            Err(CaptureError::NotReleased(CaptureState::Captured))
        );
        assert_eq!(host.requests.len(), 1);
    }

    #[test]
    fn recapture_after_release() {
        let (mut ctl, mut host) = installed();
        let mut gate = Gate::default();
        ctl.request_capture(&mut host).unwrap();
        ctl.on_capture_change(changed(Some(TARGET)), &mut gate);
        ctl.on_capture_change(changed(None), &mut gate);

        assert_eq!(ctl.on_click(PointerButton::Left, &mut host), ClickOutcome::CaptureRequested);
        assert_eq!(host.requests.len(), 2);
    }

    #[test]
    fn spurious_release_while_requesting_does_not_rearm() {
        let (mut ctl, mut host) = installed();
        let mut gate = Gate::default();
        ctl.on_click(PointerButton::Left, &mut host);

        assert_eq!(ctl.on_capture_change(changed(None), &mut gate), CaptureState::Released);
        assert!(!gate.is_enabled());
        assert!(ctl.is_request_pending());
        assert_eq!(ctl.listener(), ClickListener::Interact);

        assert_ne!(ctl.on_click(PointerButton::Left, &mut host), ClickOutcome::CaptureRequested);
        assert_eq!(ctl.request_capture(&mut host), Err(CaptureError::RequestPending));

        assert_eq!(ctl.on_capture_change(changed(Some(TARGET)), &mut gate), CaptureState::Captured);
        assert_eq!(host.requests.len(), 1);
        assert!(!ctl.is_request_pending());
    }

    #[test]
    fn error_answers_pending_request_after_spurious_release() {
        let (mut ctl, mut host) = installed();
        let mut gate = Gate::default();
        let mut warnings: Vec<String> = Vec::new();
        ctl.request_capture(&mut host).unwrap();
        ctl.on_capture_change(changed(None), &mut gate);

        ctl.on_capture_error(&mut warnings);
        assert!(!ctl.is_request_pending());
        assert_eq!(ctl.listener(), ClickListener::RequestCapture);
        assert_eq!(ctl.on_click(PointerButton::Left, &mut host), ClickOutcome::CaptureRequested);
        assert_eq!(host.requests.len(), 2);
    }

    #[test]
    fn error_while_requesting_waits_for_a_change() {
        let (mut ctl, mut host) = installed();
        let mut gate = Gate::default();
        let mut warnings: Vec<String> = Vec::new();
        ctl.request_capture(&mut host).unwrap();
        ctl.on_capture_error(&mut warnings);
        assert_eq!(ctl.state(), CaptureState::Requesting);
        assert_eq!(ctl.listener(), ClickListener::Interact);

        ctl.on_capture_change(changed(None), &mut gate);
        assert_eq!(ctl.listener(), ClickListener::RequestCapture);
        assert_eq!(ctl.on_click(PointerButton::Left, &mut host), ClickOutcome::CaptureRequested);
    }

    #[test]
    fn missing_capability_warns_once_and_stays_detached() {
        let mut host = FakeHost::default();
        let mut ctl = InputCaptureController::new(TARGET, CaptureErrorPolicy::Ignore);
        let mut warnings: Vec<String> = Vec::new();

        assert!(!ctl.install(&host, &mut warnings));
        assert!(!ctl.install(&host, &mut warnings));
        assert_eq!(warnings, vec![NO_POINTER_LOCK_WARNING.to_string()]);

        assert_eq!(ctl.on_click(PointerButton::Left, &mut host), ClickOutcome::Ignored);
        assert_eq!(ctl.request_capture(&mut host), Err(CaptureError::NotInstalled));
        assert!(host.requests.is_empty());

        let mut gate = Gate::default();
        ctl.on_capture_change(changed(Some(TARGET)), &mut gate);
        assert_eq!(ctl.state(), CaptureState::Released);
        assert!(!gate.is_enabled());
    }

    #[test]
    fn capture_error_is_inert_by_default() {
        let (mut ctl, mut host) = installed();
        ctl.request_capture(&mut host).unwrap();
        let mut warnings: Vec<String> = Vec::new();
        ctl.on_capture_error(&mut warnings);
        assert!(warnings.is_empty());
        assert_eq!(ctl.state(), CaptureState::Requesting);
    }

    #[test]
    fn capture_error_can_warn() {
        let host = FakeHost::supported();
        let mut ctl = InputCaptureController::new(TARGET, CaptureErrorPolicy::Warn);
        let mut warnings: Vec<String> = Vec::new();
        ctl.install(&host, &mut warnings);
        ctl.on_capture_error(&mut warnings);
        assert_eq!(warnings.len(), 1);
        assert_eq!(ctl.state(), CaptureState::Released);
    }
}
