//! PAL configuration: storage namespace and recognized label spellings.

/// The recognized label string for each object slot.
///
/// Labels are deployment-supplied: the token layer above the PAL addresses
/// objects by these byte strings, and different provisioning schemes spell
/// them differently. The mapping from slot to storage key and privacy flag
/// is fixed; only the spellings vary.
#[derive(Clone, Debug)]
pub struct LabelSet {
    pub device_private_key: String,
    pub device_public_key: String,
    pub device_certificate: String,
    pub code_signing_key: String,
    pub provisioning_certificate: String,
    pub claim_certificate: String,
    pub claim_private_key: String,
}

impl Default for LabelSet {
    fn default() -> Self {
        Self {
            device_private_key: "Device Priv TLS Key".into(),
            device_public_key: "Device Pub TLS Key".into(),
            device_certificate: "Device Cert".into(),
            code_signing_key: "Code Verify Key".into(),
            provisioning_certificate: "Provisioning Cert".into(),
            claim_certificate: "Claim Cert".into(),
            claim_private_key: "Claim Priv Key".into(),
        }
    }
}

/// Configuration for a [`TokenPal`] instance.
///
/// Label spellings are validated when the PAL is constructed: every label
/// must be non-empty and no label may be a prefix of another, since label
/// resolution matches on leading bytes.
///
/// [`TokenPal`]: crate::pal::TokenPal
#[derive(Clone, Debug)]
pub struct PalConfig {
    /// Namespace within the storage partition that holds the object blobs.
    pub namespace: String,
    /// Recognized label spellings.
    pub labels: LabelSet,
}

impl Default for PalConfig {
    fn default() -> Self {
        Self {
            namespace: "p11_creds".into(),
            labels: LabelSet::default(),
        }
    }
}
