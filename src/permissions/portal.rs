// SPDX-License-Identifier: GPL-3.0-only

//! XDG desktop portal broker
//!
//! Camera access goes through `org.freedesktop.portal.Camera` when sandboxed.
//! Unsandboxed, the camera is always available.

use super::{BrokerFuture, Permission, PermissionBroker, PermissionState};
use crate::errors::PermissionError;
use crate::storage::StorageLocation;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info, warn};
use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};

const PORTAL_DESTINATION: &str = "org.freedesktop.portal.Desktop";
const PORTAL_PATH: &str = "/org/freedesktop/portal/desktop";
const CAMERA_INTERFACE: &str = "org.freedesktop.portal.Camera";
const REQUEST_INTERFACE: &str = "org.freedesktop.portal.Request";

/// Broker backed by the desktop portal
pub struct PortalBroker {
    sandboxed: bool,
    answers: Mutex<HashMap<Permission, PermissionState>>,
}

impl PortalBroker {
    pub fn new(sandboxed: bool) -> Self {
        Self {
            sandboxed,
            answers: Mutex::new(HashMap::new()),
        }
    }

    fn remember(&self, permission: Permission, state: PermissionState) {
        if let Ok(mut answers) = self.answers.lock() {
            answers.insert(permission, state);
        }
    }

    fn remembered(&self, permission: Permission) -> Option<PermissionState> {
        self.answers
            .lock()
            .ok()
            .and_then(|answers| answers.get(&permission).copied())
    }

    async fn check_inner(&self, permission: Permission) -> Result<PermissionState, PermissionError> {
        match permission {
            Permission::Camera if !self.sandboxed => Ok(PermissionState::Granted),
            Permission::Camera => Ok(self
                .remembered(permission)
                .unwrap_or(PermissionState::NotRequested)),
            Permission::SharedStorage => Ok(shared_storage_state()),
        }
    }

    async fn request_inner(
        &self,
        permission: Permission,
    ) -> Result<PermissionState, PermissionError> {
        let state = match permission {
            Permission::Camera if !self.sandboxed => PermissionState::Granted,
            Permission::Camera => access_camera().await?,
            Permission::SharedStorage => shared_storage_state(),
        };
        self.remember(permission, state);
        Ok(state)
    }
}

impl PermissionBroker for PortalBroker {
    fn check(&self, permission: Permission) -> BrokerFuture<'_> {
        Box::pin(self.check_inner(permission))
    }

    fn request(&self, permission: Permission) -> BrokerFuture<'_> {
        Box::pin(self.request_inner(permission))
    }
}

/// The shared pictures directory is usable if it exists or can be created
fn shared_storage_state() -> PermissionState {
    let Some(dir) = StorageLocation::Shared.primary_dir() else {
        return PermissionState::Denied;
    };
    match std::fs::create_dir_all(&dir) {
        Ok(()) => PermissionState::Granted,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "Shared pictures directory is not writable");
            PermissionState::Denied
        }
    }
}

/// Object path the portal will use for a request with `token`
pub(crate) fn request_path(unique_name: &str, token: &str) -> String {
    let sender = unique_name.trim_start_matches(':').replace('.', "_");
    format!("{}/request/{}/{}", PORTAL_PATH, sender, token)
}

/// Path to follow instead of `expected` when the portal returned another one
///
/// Older portals ignore `handle_token` and pick their own request path.
pub(crate) fn moved_request_path<'a>(expected: &str, returned: &'a str) -> Option<&'a str> {
    (returned != expected).then_some(returned)
}

/// Map a portal `Response` code to a permission state
pub(crate) fn state_for_response(code: u32) -> PermissionState {
    // 0 = success, 1 = cancelled by user, 2 = other
    if code == 0 {
        PermissionState::Granted
    } else {
        PermissionState::Denied
    }
}

async fn access_camera() -> Result<PermissionState, PermissionError> {
    let connection = zbus::Connection::session()
        .await
        .map_err(|e| PermissionError::Bus(e.to_string()))?;

    let unique_name = connection
        .unique_name()
        .map(|name| name.to_string())
        .ok_or_else(|| PermissionError::Bus("connection has no unique name".to_string()))?;

    let token = format!("snapcam_{}", uuid::Uuid::new_v4().simple());
    let path = request_path(&unique_name, &token);

    // Subscribe before calling so a fast reply is not missed
    let request_proxy =
        zbus::Proxy::new(&connection, PORTAL_DESTINATION, path.as_str(), REQUEST_INTERFACE)
            .await?;
    let mut responses = request_proxy.receive_signal("Response").await?;

    let camera_proxy =
        zbus::Proxy::new(&connection, PORTAL_DESTINATION, PORTAL_PATH, CAMERA_INTERFACE).await?;

    let mut options: HashMap<&str, Value<'_>> = HashMap::new();
    options.insert("handle_token", Value::from(token.as_str()));

    let handle: OwnedObjectPath = camera_proxy.call("AccessCamera", &(options,)).await?;
    if let Some(actual) = moved_request_path(&path, handle.as_str()) {
        debug!(expected = %path, actual, "Portal used another request path, following it");
        let moved_proxy =
            zbus::Proxy::new(&connection, PORTAL_DESTINATION, actual, REQUEST_INTERFACE).await?;
        responses = moved_proxy.receive_signal("Response").await?;
    }

    let Some(message) = responses.next().await else {
        return Err(PermissionError::NoResponse);
    };
    let (code, _results) = message
        .body()
        .deserialize::<(u32, HashMap<String, OwnedValue>)>()?;

    let state = state_for_response(code);
    info!(code, ?state, "Camera portal answered");
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_path_from_unique_name() {
        assert_eq!(
            request_path(":1.42", "snapcam_abc"),
            "/org/freedesktop/portal/desktop/request/1_42/snapcam_abc"
        );
    }

    #[test]
    fn test_moved_request_path() {
        let expected = request_path(":1.42", "snapcam_abc");
        assert_eq!(moved_request_path(&expected, &expected), None);

        let returned = "/org/freedesktop/portal/desktop/request/1_42/t1";
        assert_eq!(moved_request_path(&expected, returned), Some(returned));
    }

    #[test]
    fn test_response_codes() {
        assert_eq!(state_for_response(0), PermissionState::Granted);
        assert_eq!(state_for_response(1), PermissionState::Denied);
        assert_eq!(state_for_response(2), PermissionState::Denied);
    }

    #[test]
    fn test_unsandboxed_camera_is_granted() {
        let broker = PortalBroker::new(false);
        let state = pollster::block_on(broker.check(Permission::Camera)).unwrap();
        assert_eq!(state, PermissionState::Granted);
    }

    #[test]
    fn test_sandboxed_camera_starts_unrequested() {
        let broker = PortalBroker::new(true);
        let state = pollster::block_on(broker.check(Permission::Camera)).unwrap();
        assert_eq!(state, PermissionState::NotRequested);

        broker.remember(Permission::Camera, PermissionState::Denied);
        let state = pollster::block_on(broker.check(Permission::Camera)).unwrap();
        assert_eq!(state, PermissionState::Denied);
    }
}
