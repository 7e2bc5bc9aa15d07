//! Domain services for event check-in.
//!
//! Services contain business logic that operates on domain models.

pub mod check_in;
pub mod memory_store;
pub mod payload_codec;

pub use check_in::{
    CheckInReport, CheckInService, EventStore, RegistrationStore, Requester, StoreError,
    VerificationOutcome,
};
pub use memory_store::InMemoryCheckInStore;
pub use payload_codec::{DecodeError, PayloadFormat, ScanPayload};
