//! Session lifecycle: request, acquire spaces and hit-test source, tear down.

use log::{debug, info, warn};

use super::platform::{
    FeatureRequest, HitTestSource, PlatformError, ReferenceSpace, ReferenceSpaceKind,
    SessionHandle, SessionMode, XrPlatform,
};

/// Lifecycle of the current session instance.
///
/// `Idle -> Requesting -> Active -> Ended`. A failed request falls back to
/// `Idle`; `Ended` stays until the next `start`, which creates a new instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Requesting,
    Active,
    Ended,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("immersive AR is not supported on this platform")]
    Unsupported,
    #[error("AR session request was declined")]
    Declined,
    #[error("an AR session is already {0:?}")]
    AlreadyRunning(SessionState),
    #[error("AR session could not be started: {0}")]
    Platform(PlatformError),
}

impl From<PlatformError> for SessionError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::Declined => SessionError::Declined,
            other => SessionError::Platform(other),
        }
    }
}

/// Resources owned by an active session
#[derive(Debug, Clone)]
pub struct ActiveSession {
    pub handle: SessionHandle,
    pub viewer_space: ReferenceSpace,
    pub local_space: ReferenceSpace,
    hit_test_source: Option<HitTestSource>,
}

impl ActiveSession {
    pub fn hit_test_source(&self) -> Option<&HitTestSource> {
        self.hit_test_source.as_ref()
    }
}

/// Holds a `start` call in `Requesting` until it settles.
///
/// Dropping it unsettled, which happens when the `start` future is dropped
/// mid-await, ends any granted session and falls back to `Idle`.
struct PendingStart<'a, P: XrPlatform> {
    platform: &'a P,
    state: &'a mut SessionState,
    granted: Option<SessionHandle>,
}

impl<P: XrPlatform> PendingStart<'_, P> {
    fn settle(mut self, state: SessionState) {
        self.granted = None;
        *self.state = state;
    }
}

impl<P: XrPlatform> Drop for PendingStart<'_, P> {
    fn drop(&mut self) {
        if *self.state != SessionState::Requesting {
            return;
        }
        if let Some(handle) = self.granted.take() {
            self.platform.end_session(handle);
        }
        debug!("session start cancelled while requesting");
        *self.state = SessionState::Idle;
    }
}

pub struct SessionController {
    state: SessionState,
    session: Option<ActiveSession>,
    frame_loop_registered: bool,
    features: FeatureRequest,
    sessions_started: u32,
}

impl SessionController {
    pub fn new(features: FeatureRequest) -> Self {
        Self {
            state: SessionState::Idle,
            session: None,
            frame_loop_registered: false,
            features,
            sessions_started: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn active(&self) -> Option<&ActiveSession> {
        match self.state {
            SessionState::Active => self.session.as_ref(),
            _ => None,
        }
    }

    pub fn handle(&self) -> Option<SessionHandle> {
        self.active().map(|s| s.handle)
    }

    /// Whether the per-frame callback is currently registered with the platform
    pub fn frame_loop_registered(&self) -> bool {
        self.frame_loop_registered
    }

    pub fn sessions_started(&self) -> u32 {
        self.sessions_started
    }

    pub fn features(&self) -> &FeatureRequest {
        &self.features
    }

    /// Requests a session and acquires everything the frame loop needs.
    ///
    /// The session only becomes `Active` once both reference spaces and the
    /// hit-test source have resolved.
    pub async fn start<P: XrPlatform>(&mut self, platform: &P) -> Result<SessionHandle, SessionError> {
        match self.state {
            SessionState::Requesting | SessionState::Active => {
                return Err(SessionError::AlreadyRunning(self.state));
            }
            SessionState::Idle | SessionState::Ended => {}
        }

        if !platform.is_session_supported(SessionMode::ImmersiveAr) {
            warn!("immersive-ar session mode is not supported");
            self.state = SessionState::Idle;
            return Err(SessionError::Unsupported);
        }

        self.session = None;
        self.frame_loop_registered = false;
        self.state = SessionState::Requesting;
        info!(
            "requesting AR session (required: {:?}, optional: {:?})",
            self.features.required, self.features.optional
        );

        let mut pending = PendingStart {
            platform,
            state: &mut self.state,
            granted: None,
        };

        let handle = match platform
            .request_session(SessionMode::ImmersiveAr, &self.features)
            .await
        {
            Ok(handle) => handle,
            Err(err) => {
                warn!("session request failed: {}", err);
                pending.settle(SessionState::Idle);
                return Err(err.into());
            }
        };
        pending.granted = Some(handle);

        match Self::acquire(platform, handle).await {
            Ok(session) => {
                info!(
                    "{} active (hit-test source #{})",
                    handle,
                    session.hit_test_source.map(|s| s.id).unwrap_or_default()
                );
                pending.settle(SessionState::Active);
                self.session = Some(session);
                self.frame_loop_registered = true;
                self.sessions_started += 1;
                Ok(handle)
            }
            Err(err) => {
                warn!("{} could not be set up: {}", handle, err);
                platform.end_session(handle);
                pending.settle(SessionState::Idle);
                Err(err.into())
            }
        }
    }

    async fn acquire<P: XrPlatform>(
        platform: &P,
        handle: SessionHandle,
    ) -> Result<ActiveSession, PlatformError> {
        let viewer_space = platform
            .request_reference_space(handle, ReferenceSpaceKind::Viewer)
            .await?;
        let hit_test_source = platform
            .request_hit_test_source(handle, &viewer_space)
            .await?;
        let local_space = match platform
            .request_reference_space(handle, ReferenceSpaceKind::Local)
            .await
        {
            Ok(space) => space,
            Err(err) => {
                platform.cancel_hit_test_source(&hit_test_source);
                return Err(err);
            }
        };

        Ok(ActiveSession {
            handle,
            viewer_space,
            local_space,
            hit_test_source: Some(hit_test_source),
        })
    }

    /// Ends the current session at the user's request.
    pub fn end<P: XrPlatform>(&mut self, platform: &P) -> Option<SessionHandle> {
        let handle = self.handle()?;
        platform.end_session(handle);
        self.handle_session_end(platform, handle).then_some(handle)
    }

    /// Tears down session-scoped state for an end event.
    ///
    /// Returns false for handles that are not the current session, which
    /// covers duplicate end events after a user-initiated end.
    pub fn handle_session_end<P: XrPlatform>(&mut self, platform: &P, handle: SessionHandle) -> bool {
        let is_current = self
            .session
            .as_ref()
            .is_some_and(|session| session.handle == handle);
        if !is_current {
            debug!("ignoring end event for stale {}", handle);
            return false;
        }

        self.frame_loop_registered = false;
        if let Some(mut session) = self.session.take() {
            if let Some(source) = session.hit_test_source.take() {
                platform.cancel_hit_test_source(&source);
            }
        }
        self.state = SessionState::Ended;
        info!("{} ended", handle);
        true
    }
}
