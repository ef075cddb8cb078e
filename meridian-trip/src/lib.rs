pub mod checkout;
pub mod conflict;
pub mod draft;
pub mod intent;
pub mod manager;
pub mod memory;
pub mod models;
pub mod repository;

pub use checkout::{CheckoutError, CheckoutRequest, CheckoutService, CheckoutSuccess};
pub use conflict::{detect_conflicts, ConflictPair};
pub use draft::{DraftOutcome, DraftService};
pub use intent::TripIntent;
pub use manager::{TripError, TripManager};
pub use models::{Booking, BookingKind, BookingStatus, ItemRef, Trip, TripStatus};
pub use repository::{CheckoutCommit, TripStore};
