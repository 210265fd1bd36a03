pub mod booking;
pub mod resource;
pub mod review;
pub mod slot;
pub mod user;

pub use booking::{
    Booking, BookingRequest, BookingStatus, CustomerDetails, EarningsSummary, PaymentStatus,
};
pub use resource::{NewResource, Resource};
pub use review::{NewReview, Review};
pub use slot::{AvailabilitySlot, NewSlot, SlotStatus, SlotStatusUpdate};
pub use user::{LoginRequest, RegisterRequest, Role, User};
