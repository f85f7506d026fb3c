// src/application/dashboard.rs
//
// Dashboard context
//
// Owns what every list page shares: configuration, the gateway, the toast
// surface, the event bus and the educator session. Controllers are created
// here, one per resource kind, and torn down with the session.
//
// CRITICAL RULES:
// - A controller is only handed out while an educator is signed in
// - teardown detaches every controller created so far; their in-flight
//   responses are then ignored
// - Nothing here reaches into a controller's state

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::DashboardConfig;
use crate::domain::{ResourceKind, ResourceProfile};
use crate::error::AppResult;
use crate::events::EventBus;
use crate::integrations::{LogNotifier, Notifier, RestGateway};
use crate::repositories::ResourceGateway;
use crate::services::{ControllerOptions, ResourceListController};

use super::session::{Educator, Navigator, SessionContext};

pub struct Dashboard {
    config: DashboardConfig,
    gateway: Arc<dyn ResourceGateway>,
    notifier: Arc<dyn Notifier>,
    event_bus: Arc<EventBus>,
    session: SessionContext,
    controllers: Mutex<HashMap<ResourceKind, ResourceListController>>,
}

impl Dashboard {
    pub fn new(
        config: DashboardConfig,
        gateway: Arc<dyn ResourceGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let event_bus = Arc::new(EventBus::with_capacity(config.event_log_capacity));
        Self {
            config,
            gateway,
            notifier,
            event_bus,
            session: SessionContext::new(),
            controllers: Mutex::new(HashMap::new()),
        }
    }

    /// REST gateway and log toasts, as the diagnostic binary runs it
    pub fn from_config(config: DashboardConfig) -> AppResult<Self> {
        config.validate()?;
        let gateway = RestGateway::from_config(&config)?;
        Ok(Self::new(config, Arc::new(gateway), Arc::new(LogNotifier)))
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    fn lock_controllers(&self) -> MutexGuard<'_, HashMap<ResourceKind, ResourceListController>> {
        self.controllers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ========================================================================
    // SESSION
    // ========================================================================

    /// Sign an educator in. Controllers of a previous session are detached.
    pub fn init(&self, educator: Educator) {
        if self.session.is_signed_in() {
            self.detach_all();
        }
        self.session.init(educator);
    }

    /// Sign out and detach every controller
    pub fn teardown(&self) -> Option<Educator> {
        let detached = self.detach_all();
        log::debug!("Dashboard teardown detached {} controller(s)", detached);
        self.session.teardown()
    }

    fn detach_all(&self) -> usize {
        let controllers: Vec<ResourceListController> =
            self.lock_controllers().drain().map(|(_, c)| c).collect();
        for controller in &controllers {
            controller.detach();
        }
        controllers.len()
    }

    // ========================================================================
    // CONTROLLERS
    // ========================================================================

    /// The controller for `kind`, created on first use with its built-in profile
    pub fn controller_for(&self, kind: ResourceKind) -> AppResult<ResourceListController> {
        self.controller_with_profile(ResourceProfile::for_kind(kind))
    }

    /// Like [`controller_for`](Self::controller_for), for a custom profile.
    /// An existing controller for the profile's kind is reused.
    pub fn controller_with_profile(
        &self,
        profile: ResourceProfile,
    ) -> AppResult<ResourceListController> {
        self.session.require_educator()?;

        let mut controllers = self.lock_controllers();
        if let Some(existing) = controllers.get(&profile.kind) {
            return Ok(existing.clone());
        }

        let kind = profile.kind;
        let controller = ResourceListController::new(
            profile,
            Arc::clone(&self.gateway),
            Arc::clone(&self.notifier),
            Arc::clone(&self.event_bus),
            ControllerOptions::from(&self.config),
        )?;
        log::debug!("Created list controller for {}", kind);
        controllers.insert(kind, controller.clone());
        Ok(controller)
    }

    /// Open a list page: redirects to login when signed out, otherwise
    /// returns the page's controller after its first refresh.
    pub async fn open(
        &self,
        kind: ResourceKind,
        navigator: &dyn Navigator,
    ) -> AppResult<Option<ResourceListController>> {
        if self.session.guard(navigator).is_none() {
            return Ok(None);
        }
        let controller = self.controller_for(kind)?;
        if let Err(e) = controller.refresh().await {
            // The banner carries the failure; the page still opens.
            log::warn!("{}: initial load failed: {}", kind, e);
        }
        Ok(Some(controller))
    }

    /// Detach and forget the controller for `kind` (its page unmounted)
    pub fn close(&self, kind: ResourceKind) -> bool {
        let removed = self.lock_controllers().remove(&kind);
        match removed {
            Some(controller) => {
                controller.detach();
                true
            }
            None => false,
        }
    }

    pub fn open_kinds(&self) -> Vec<ResourceKind> {
        let mut kinds: Vec<ResourceKind> = self.lock_controllers().keys().copied().collect();
        kinds.sort_by_key(|k| k.as_str());
        kinds
    }
}
