//! HTTP route handlers.

pub mod admin;
pub mod bookings;
pub mod health;
pub mod metrics;

use domain::{AdminGateway, BookingQueries, BookingWorkflow};
use entity_store::EntityStore;

/// Shared application state accessible from all handlers.
pub struct AppState<S: EntityStore> {
    pub workflow: BookingWorkflow<S>,
    pub gateway: AdminGateway<S>,
    pub queries: BookingQueries<S>,
}

impl<S: EntityStore + Clone> AppState<S> {
    /// Wires the workflow, admin gateway and queries over one store.
    pub fn new(store: S) -> Self {
        let workflow = BookingWorkflow::new(store.clone());
        Self {
            gateway: AdminGateway::new(workflow.clone()),
            queries: BookingQueries::new(store),
            workflow,
        }
    }
}
