//! Label resolution: the ordered table mapping recognized labels to
//! storage slots.
//!
//! Resolution uses a prefix rule inherited from the token API above: an
//! input label matches a table entry when its leading bytes equal the
//! entry's full label. Trailing input bytes beyond the entry's length are
//! ignored. First match wins, so table construction rejects label sets in
//! which one label is a prefix of another.

use crate::config::LabelSet;
use crate::error::{PalError, PalResult};
use crate::handle::ObjectHandle;

/// One record of the label table.
#[derive(Clone, Debug)]
pub(crate) struct LabelEntry {
    label: Vec<u8>,
    pub storage_key: &'static str,
    pub handle: ObjectHandle,
}

impl LabelEntry {
    /// The recognized label bytes of this entry.
    pub fn label(&self) -> &[u8] {
        &self.label
    }
}

/// Immutable ordered table of (label, storage key, handle, privacy)
/// records, built once from a [`LabelSet`].
#[derive(Clone, Debug)]
pub(crate) struct LabelTable {
    entries: Vec<LabelEntry>,
}

impl LabelTable {
    /// Build the table from configured label spellings.
    ///
    /// Fails with `InvalidConfig` if any label is empty or is a prefix of
    /// another label (either would make resolution ambiguous).
    pub fn new(labels: &LabelSet) -> PalResult<Self> {
        let entries: Vec<LabelEntry> = [
            (
                &labels.device_certificate,
                ObjectHandle::DeviceCertificate,
            ),
            (&labels.device_private_key, ObjectHandle::DevicePrivateKey),
            (&labels.device_public_key, ObjectHandle::DevicePublicKey),
            (&labels.code_signing_key, ObjectHandle::CodeSigningKey),
            (
                &labels.provisioning_certificate,
                ObjectHandle::ProvisioningCertificate,
            ),
            (&labels.claim_certificate, ObjectHandle::ClaimCertificate),
            (&labels.claim_private_key, ObjectHandle::ClaimPrivateKey),
        ]
        .into_iter()
        .map(|(label, handle)| {
            // Every non-Invalid handle has a slot.
            let slot = handle.slot().expect("slot table covers all handles");
            LabelEntry {
                label: label.as_bytes().to_vec(),
                storage_key: slot.storage_key,
                handle,
            }
        })
        .collect();

        for entry in &entries {
            if entry.label.is_empty() {
                return Err(PalError::InvalidConfig(format!(
                    "label for {} is empty",
                    entry.handle
                )));
            }
        }
        for (i, a) in entries.iter().enumerate() {
            for b in entries.iter().skip(i + 1) {
                if a.label.starts_with(&b.label) || b.label.starts_with(&a.label) {
                    return Err(PalError::InvalidConfig(format!(
                        "label for {} is a prefix of the label for {}",
                        a.handle, b.handle
                    )));
                }
            }
        }

        Ok(Self { entries })
    }

    /// Resolve a caller-supplied label to its table entry.
    ///
    /// Returns `None` for empty or unrecognized labels; never touches
    /// storage.
    pub fn resolve(&self, label: &[u8]) -> Option<&LabelEntry> {
        if label.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|entry| label.len() >= entry.label.len() && label[..entry.label.len()] == entry.label[..])
    }

    /// Reverse lookup: the entry whose handle is `handle`, if any.
    ///
    /// Used by the destroy path, which needs the label to re-save the
    /// zeroed placeholder.
    pub fn entry_for(&self, handle: ObjectHandle) -> Option<&LabelEntry> {
        self.entries.iter().find(|entry| entry.handle == handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle;

    fn table() -> LabelTable {
        LabelTable::new(&LabelSet::default()).unwrap()
    }

    #[test]
    fn resolves_all_recognized_labels() {
        let table = table();
        let cases: [(&str, ObjectHandle, &str); 7] = [
            ("Device Cert", ObjectHandle::DeviceCertificate, handle::KEY_DEVICE_CERT),
            ("Device Priv TLS Key", ObjectHandle::DevicePrivateKey, handle::KEY_DEVICE_KEY_PAIR),
            ("Device Pub TLS Key", ObjectHandle::DevicePublicKey, handle::KEY_DEVICE_KEY_PAIR),
            ("Code Verify Key", ObjectHandle::CodeSigningKey, handle::KEY_CODE_SIGNING),
            ("Provisioning Cert", ObjectHandle::ProvisioningCertificate, handle::KEY_PROVISIONING_CERT),
            ("Claim Cert", ObjectHandle::ClaimCertificate, handle::KEY_CLAIM_CERT),
            ("Claim Priv Key", ObjectHandle::ClaimPrivateKey, handle::KEY_CLAIM_KEY),
        ];
        for (label, expected, key) in cases {
            let entry = table.resolve(label.as_bytes()).unwrap();
            assert_eq!(entry.handle, expected, "{label}");
            assert_eq!(entry.storage_key, key, "{label}");
        }
    }

    #[test]
    fn resolution_is_deterministic() {
        let table = table();
        let first = table.resolve(b"Device Cert").unwrap().handle;
        for _ in 0..10 {
            assert_eq!(table.resolve(b"Device Cert").unwrap().handle, first);
        }
    }

    #[test]
    fn empty_and_unrecognized_labels_resolve_to_nothing() {
        let table = table();
        assert!(table.resolve(b"").is_none());
        assert!(table.resolve(b"unrecognized-xyz").is_none());
        // Shorter than any recognized label.
        assert!(table.resolve(b"Dev").is_none());
    }

    #[test]
    fn trailing_bytes_beyond_label_are_ignored() {
        let table = table();
        let entry = table.resolve(b"Device Cert\x00 with trailing junk").unwrap();
        assert_eq!(entry.handle, ObjectHandle::DeviceCertificate);
    }

    #[test]
    fn entry_for_inverts_resolution() {
        let table = table();
        for raw in 1..=7 {
            let handle = ObjectHandle::from_raw(raw);
            let entry = table.entry_for(handle).unwrap();
            assert_eq!(table.resolve(entry.label()).unwrap().handle, handle);
        }
        assert!(table.entry_for(ObjectHandle::Invalid).is_none());
    }

    #[test]
    fn empty_label_config_is_rejected() {
        let mut labels = LabelSet::default();
        labels.claim_certificate = String::new();
        assert!(matches!(
            LabelTable::new(&labels),
            Err(PalError::InvalidConfig(_))
        ));
    }

    #[test]
    fn prefix_label_config_is_rejected() {
        // "Device" is a prefix of "Device Cert"; resolution order would
        // decide which one wins, so the set is rejected outright.
        let mut labels = LabelSet::default();
        labels.device_private_key = "Device".into();
        assert!(matches!(
            LabelTable::new(&labels),
            Err(PalError::InvalidConfig(_))
        ));

        let mut labels = LabelSet::default();
        labels.device_public_key = labels.device_private_key.clone();
        assert!(matches!(
            LabelTable::new(&labels),
            Err(PalError::InvalidConfig(_))
        ));
    }
}
