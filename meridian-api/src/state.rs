use std::sync::Arc;

use meridian_core::repository::{CalendarStore, PaymentMethodStore};
use meridian_trip::checkout::CheckoutService;
use meridian_trip::draft::DraftService;
use meridian_trip::manager::TripManager;
use meridian_trip::repository::TripStore;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub trips: Arc<dyn TripStore>,
    pub calendar: Arc<dyn CalendarStore>,
    pub payments: Arc<dyn PaymentMethodStore>,
    pub checkout: Arc<CheckoutService>,
    pub drafts: Arc<DraftService>,
    pub manager: Arc<TripManager>,
    pub auth: AuthConfig,
}
