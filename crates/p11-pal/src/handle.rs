//! The closed enumeration of token object handles and their storage slots.

/// Storage key for the device certificate.
pub(crate) const KEY_DEVICE_CERT: &str = "P11_Cert";
/// Storage key shared by the device private and public key: both halves
/// live in a single key-pair blob whose format is the caller's concern.
pub(crate) const KEY_DEVICE_KEY_PAIR: &str = "P11_Key";
/// Storage key for the code-signing public key.
pub(crate) const KEY_CODE_SIGNING: &str = "P11_CSK";
/// Storage key for the provisioning certificate.
pub(crate) const KEY_PROVISIONING_CERT: &str = "P11_Prov";
/// Storage key for the claim certificate.
pub(crate) const KEY_CLAIM_CERT: &str = "P11_Claim_Cert";
/// Storage key for the claim private key.
pub(crate) const KEY_CLAIM_KEY: &str = "P11_Claim_Key";

/// Handle to a token object slot.
///
/// The object set is closed by design: there is no dynamic object
/// creation, so handles are a fixed enumeration. `Invalid` is 0 and never
/// denotes a real object (per the PKCS#11 convention that 0 is never a
/// valid object handle). Handles are stable for the process lifetime but
/// not across builds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u64)]
pub enum ObjectHandle {
    /// Reserved: no object.
    Invalid = 0,
    /// Device private key used for TLS client authentication.
    DevicePrivateKey = 1,
    /// Device public key (co-located with the private key).
    DevicePublicKey = 2,
    /// Device certificate for TLS.
    DeviceCertificate = 3,
    /// Code verification public key for signed firmware.
    CodeSigningKey = 4,
    /// Provisioning certificate.
    ProvisioningCertificate = 5,
    /// Fleet-claim certificate.
    ClaimCertificate = 6,
    /// Fleet-claim private key.
    ClaimPrivateKey = 7,
}

/// Static per-handle slot attributes: where the blob lives and whether its
/// contents are sensitive. Privacy is a property of the handle, not of the
/// stored blob.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Slot {
    pub storage_key: &'static str,
    pub private: bool,
}

impl ObjectHandle {
    /// Raw handle value as exposed over the token API.
    pub fn raw(self) -> u64 {
        self as u64
    }

    /// Reconstruct a handle from its raw value; unknown values map to
    /// `Invalid`.
    pub fn from_raw(raw: u64) -> Self {
        match raw {
            1 => Self::DevicePrivateKey,
            2 => Self::DevicePublicKey,
            3 => Self::DeviceCertificate,
            4 => Self::CodeSigningKey,
            5 => Self::ProvisioningCertificate,
            6 => Self::ClaimCertificate,
            7 => Self::ClaimPrivateKey,
            _ => Self::Invalid,
        }
    }

    /// Whether this handle denotes a real object slot.
    pub fn is_valid(self) -> bool {
        self != Self::Invalid
    }

    /// Storage slot attributes for this handle; `None` for `Invalid`.
    pub(crate) fn slot(self) -> Option<Slot> {
        let slot = match self {
            Self::Invalid => return None,
            Self::DevicePrivateKey => Slot {
                storage_key: KEY_DEVICE_KEY_PAIR,
                private: true,
            },
            Self::DevicePublicKey => Slot {
                storage_key: KEY_DEVICE_KEY_PAIR,
                private: false,
            },
            Self::DeviceCertificate => Slot {
                storage_key: KEY_DEVICE_CERT,
                private: false,
            },
            Self::CodeSigningKey => Slot {
                storage_key: KEY_CODE_SIGNING,
                private: false,
            },
            Self::ProvisioningCertificate => Slot {
                storage_key: KEY_PROVISIONING_CERT,
                private: false,
            },
            Self::ClaimCertificate => Slot {
                storage_key: KEY_CLAIM_CERT,
                private: false,
            },
            Self::ClaimPrivateKey => Slot {
                storage_key: KEY_CLAIM_KEY,
                private: true,
            },
        };
        Some(slot)
    }
}

impl std::fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Invalid => "invalid",
            Self::DevicePrivateKey => "device-private-key",
            Self::DevicePublicKey => "device-public-key",
            Self::DeviceCertificate => "device-certificate",
            Self::CodeSigningKey => "code-signing-key",
            Self::ProvisioningCertificate => "provisioning-certificate",
            Self::ClaimCertificate => "claim-certificate",
            Self::ClaimPrivateKey => "claim-private-key",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ObjectHandle; 7] = [
        ObjectHandle::DevicePrivateKey,
        ObjectHandle::DevicePublicKey,
        ObjectHandle::DeviceCertificate,
        ObjectHandle::CodeSigningKey,
        ObjectHandle::ProvisioningCertificate,
        ObjectHandle::ClaimCertificate,
        ObjectHandle::ClaimPrivateKey,
    ];

    #[test]
    fn raw_roundtrip() {
        for handle in ALL {
            assert_eq!(ObjectHandle::from_raw(handle.raw()), handle);
            assert!(handle.is_valid());
        }
    }

    #[test]
    fn zero_and_unknown_raw_are_invalid() {
        assert_eq!(ObjectHandle::from_raw(0), ObjectHandle::Invalid);
        assert_eq!(ObjectHandle::from_raw(8), ObjectHandle::Invalid);
        assert_eq!(ObjectHandle::from_raw(u64::MAX), ObjectHandle::Invalid);
        assert!(!ObjectHandle::Invalid.is_valid());
        assert_eq!(ObjectHandle::Invalid.raw(), 0);
    }

    #[test]
    fn invalid_has_no_slot() {
        assert!(ObjectHandle::Invalid.slot().is_none());
        for handle in ALL {
            assert!(handle.slot().is_some());
        }
    }

    #[test]
    fn key_pair_halves_share_storage_key() {
        let private = ObjectHandle::DevicePrivateKey.slot().unwrap();
        let public = ObjectHandle::DevicePublicKey.slot().unwrap();
        assert_eq!(private.storage_key, public.storage_key);
        assert!(private.private);
        assert!(!public.private);
    }

    #[test]
    fn only_private_keys_are_private() {
        for handle in ALL {
            let slot = handle.slot().unwrap();
            let expect_private = matches!(
                handle,
                ObjectHandle::DevicePrivateKey | ObjectHandle::ClaimPrivateKey
            );
            assert_eq!(slot.private, expect_private, "{handle}");
        }
    }
}
