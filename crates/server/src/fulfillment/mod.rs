//! Download credential issuance and redemption.
//!
//! This is the heart of the service. The [`store::CredentialStore`] owns
//! every issued credential and enforces expiry and remaining-use counts; the
//! [`issuer::Issuer`] mints credentials into it; the
//! [`delivery::DeliveryLog`] remembers which credentials belong to which
//! order so the delivery page can be rendered.
//!
//! All three are plain in-memory services with no I/O. Every mutation goes
//! through their synchronized interfaces; nothing else touches a credential's
//! fields.

pub mod clock;
pub mod delivery;
pub mod issuer;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use delivery::{DeliveryItem, DeliveryLog};
pub use issuer::{IssueError, Issuer};
pub use store::{CredentialStore, PutError, RedeemError};
