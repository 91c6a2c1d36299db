// SPDX-License-Identifier: GPL-3.0-only

//! Permission gate
//!
//! Decides which of the three gate views is shown for the current
//! permission states. Querying and prompting is delegated to a
//! [`PermissionBroker`].

mod portal;

pub use portal::PortalBroker;

use crate::errors::PermissionError;
use crate::storage::StorageLocation;
use std::future::Future;
use std::pin::Pin;

/// Something the app needs the user's consent for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Camera,
    /// Write access to the user-visible pictures directory
    SharedStorage,
}

/// State of a single permission
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    /// Refused earlier; a rationale should be shown before asking again
    Denied,
    #[default]
    NotRequested,
}

/// Permissions the app requires in its current environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionSet {
    permissions: Vec<Permission>,
}

impl PermissionSet {
    /// Camera always; shared storage only when sandboxed and writing there
    pub fn required(sandboxed: bool, location: StorageLocation) -> Self {
        let mut permissions = vec![Permission::Camera];
        if sandboxed && location == StorageLocation::Shared {
            permissions.push(Permission::SharedStorage);
        }
        Self { permissions }
    }

    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    pub fn contains(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}

/// Current state of each required permission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionStatus {
    states: Vec<(Permission, PermissionState)>,
}

impl PermissionStatus {
    /// Every permission in `set`, not yet requested
    pub fn unrequested(set: &PermissionSet) -> Self {
        Self {
            states: set
                .permissions()
                .iter()
                .map(|&p| (p, PermissionState::NotRequested))
                .collect(),
        }
    }

    pub fn set(&mut self, permission: Permission, state: PermissionState) {
        match self.states.iter_mut().find(|(p, _)| *p == permission) {
            Some(entry) => entry.1 = state,
            None => self.states.push((permission, state)),
        }
    }

    pub fn get(&self, permission: Permission) -> Option<PermissionState> {
        self.states
            .iter()
            .find(|(p, _)| *p == permission)
            .map(|(_, s)| *s)
    }

    pub fn states(&self) -> &[(Permission, PermissionState)] {
        &self.states
    }

    pub fn all_granted(&self) -> bool {
        self.states
            .iter()
            .all(|(_, s)| *s == PermissionState::Granted)
    }

    pub fn view(&self) -> GateView {
        GateView::for_states(&self.states)
    }
}

/// What the gate renders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateView {
    /// Everything granted: live preview
    Preview,
    /// Something was denied: explain why before asking again
    Rationale,
    /// Not asked yet: plain request
    Request,
}

impl GateView {
    pub fn for_states(states: &[(Permission, PermissionState)]) -> Self {
        if states
            .iter()
            .all(|(_, state)| *state == PermissionState::Granted)
        {
            GateView::Preview
        } else if states
            .iter()
            .any(|(_, state)| *state == PermissionState::Denied)
        {
            GateView::Rationale
        } else {
            GateView::Request
        }
    }
}

pub type BrokerFuture<'a> =
    Pin<Box<dyn Future<Output = Result<PermissionState, PermissionError>> + Send + 'a>>;

/// Access to the platform permission model
pub trait PermissionBroker: Send + Sync {
    /// Current state, without prompting
    fn check(&self, permission: Permission) -> BrokerFuture<'_>;

    /// Prompt the user and return the resulting state
    fn request(&self, permission: Permission) -> BrokerFuture<'_>;
}

/// Check every permission in `set`
///
/// Broker errors count as not requested, so the user can retry from the gate.
pub async fn check_all(broker: &dyn PermissionBroker, set: &PermissionSet) -> PermissionStatus {
    let mut status = PermissionStatus::unrequested(set);
    for &permission in set.permissions() {
        match broker.check(permission).await {
            Ok(state) => status.set(permission, state),
            Err(e) => tracing::warn!(?permission, error = %e, "Permission check failed"),
        }
    }
    status
}

/// Request every permission in `set` that is not granted yet
pub async fn request_missing(
    broker: &dyn PermissionBroker,
    set: &PermissionSet,
    mut status: PermissionStatus,
) -> PermissionStatus {
    for &permission in set.permissions() {
        if status.get(permission) == Some(PermissionState::Granted) {
            continue;
        }
        match broker.request(permission).await {
            Ok(state) => status.set(permission, state),
            Err(e) => {
                tracing::error!(?permission, error = %e, "Permission request failed");
                status.set(permission, PermissionState::Denied);
            }
        }
    }
    status
}
