pub mod config;
pub mod controllers;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;

use std::sync::Arc;

use services::lifecycle::BookingLifecycle;
use services::qr::QrService;
use services::reservation::ReservationCoordinator;
use store::Store;

// Shared state for the whole application.
pub struct AppState {
    pub store: Arc<Store>,
    pub config: config::Config,
    pub coordinator: ReservationCoordinator,
    pub lifecycle: BookingLifecycle,
    pub qr: QrService,
}

impl AppState {
    pub fn new(config: config::Config) -> Arc<Self> {
        let store = Arc::new(Store::new());
        let coordinator = ReservationCoordinator::new(store.clone(), config.reservation.clone());
        let lifecycle =
            BookingLifecycle::new(store.clone(), coordinator.clone(), config.booking.clone());
        let qr = QrService::new(config.qr.secret.clone());

        Arc::new(Self {
            store,
            config,
            coordinator,
            lifecycle,
            qr,
        })
    }
}
