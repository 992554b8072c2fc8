//! Device-orientation readings and the permission model that gates them.

use futures::task::noop_waker_ref;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// One orientation sample in degrees. Platforms report missing angles as null, so each is optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceOrientation {
    pub alpha: Option<f32>,
    pub beta: Option<f32>,
    pub gamma: Option<f32>,
}

impl DeviceOrientation {
    pub fn new(alpha: f32, beta: f32, gamma: f32) -> Self {
        Self { alpha: Some(alpha), beta: Some(beta), gamma: Some(gamma) }
    }

    /// All three angles, or `None` if any is missing or non-finite.
    pub fn angles(&self) -> Option<(f32, f32, f32)> {
        let (alpha, beta, gamma) = (self.alpha?, self.beta?, self.gamma?);
        if alpha.is_finite() && beta.is_finite() && gamma.is_finite() {
            Some((alpha, beta, gamma))
        } else {
            None
        }
    }
}

/// What the host can offer for orientation sensing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorSupport {
    Unsupported,
    Available,
    /// Sensor exists but an explicit, user-mediated permission request must be granted first.
    RequiresPermission,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Granted,
    Denied,
    Unsupported,
}

impl PermissionStatus {
    pub fn label(self) -> &'static str {
        match self {
            PermissionStatus::Granted => "granted",
            PermissionStatus::Denied => "denied",
            PermissionStatus::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub type PermissionFuture = Pin<Box<dyn Future<Output = PermissionStatus>>>;

/// Outcome of a gyro toggle request, resolved once the host has answered.
///
/// The request does not borrow the controller, so the frame loop keeps running while a
/// permission prompt is open.
pub struct GyroRequest {
    enable: bool,
    state: RequestState,
}

enum RequestState {
    Ready(PermissionStatus),
    Pending(PermissionFuture),
    Done,
}

impl GyroRequest {
    pub(crate) fn ready(enable: bool, status: PermissionStatus) -> Self {
        Self { enable, state: RequestState::Ready(status) }
    }

    pub(crate) fn pending(future: PermissionFuture) -> Self {
        Self { enable: true, state: RequestState::Pending(future) }
    }

    /// Whether this request turns the gyro on (`true`) or off.
    pub fn enables(&self) -> bool {
        self.enable
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, RequestState::Pending(_))
    }

    /// Polls once without blocking. Returns the status the first time it is available.
    pub fn poll_now(&mut self) -> Option<PermissionStatus> {
        let mut cx = Context::from_waker(noop_waker_ref());
        match self.poll_unpin(&mut cx) {
            Poll::Ready(status) => Some(status),
            Poll::Pending => None,
        }
    }
}

impl Future for GyroRequest {
    type Output = PermissionStatus;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<PermissionStatus> {
        let this = self.get_mut();
        match &mut this.state {
            RequestState::Ready(status) => {
                let status = *status;
                this.state = RequestState::Done;
                Poll::Ready(status)
            }
            RequestState::Pending(future) => match future.as_mut().poll(cx) {
                Poll::Ready(status) => {
                    this.state = RequestState::Done;
                    Poll::Ready(status)
                }
                Poll::Pending => Poll::Pending,
            },
            RequestState::Done => Poll::Pending,
        }
    }
}

impl fmt::Debug for GyroRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            RequestState::Ready(status) => status.label(),
            RequestState::Pending(_) => "pending",
            RequestState::Done => "done",
        };
        f.debug_struct("GyroRequest").field("enable", &self.enable).field("state", &state).finish()
    }
}
