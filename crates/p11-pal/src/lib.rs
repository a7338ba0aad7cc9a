//! PKCS#11 platform abstraction layer: fixed-slot, label-addressed
//! persistent storage for token objects.
//!
//! The token layer above addresses cryptographic artifacts (device
//! certificate and key pair, code-signing key, provisioning and claim
//! credentials) by symbolic label. This crate translates each recognized
//! label to one of a closed set of storage slots and persists, retrieves
//! and securely erases opaque blobs for those slots through a
//! [`p11_store::BlobStore`] engine.
//!
//! # Operations
//!
//! [`TokenPal`] exposes the PAL contract:
//!
//! - `initialize` — eager one-time partition initialization
//! - `save_object` — persist a blob under a label, returning its handle
//! - `find_object` — label → handle of a currently present object
//! - `get_object_value` — handle → bytes plus privacy flag
//! - [`release_object_value`] — release a fetched value
//! - `destroy_object` — secure erase: overwrite with a same-length
//!   zeroed placeholder, never delete
//!
//! # Design Rules
//!
//! 1. Handle 0 ([`ObjectHandle::Invalid`]) never denotes a real object.
//! 2. The partition is initialized at most once per PAL instance, safely
//!    under concurrent callers; initialization failure is sticky and
//!    fatal.
//! 3. Destroy overwrites in place. A destroyed slot stays physically
//!    present, holding an all-zero blob of the original length.
//! 4. Blobs are opaque. The PAL adds no header, version tag or checksum.
//! 5. Fetched values zeroize their buffers on release.

pub mod config;
pub mod error;
pub mod handle;
mod init;
mod labels;
pub mod pal;

// Re-export primary types at crate root for ergonomic imports.
pub use config::{LabelSet, PalConfig};
pub use error::{PalError, PalResult};
pub use handle::ObjectHandle;
pub use pal::{release_object_value, ObjectValue, TokenPal};
