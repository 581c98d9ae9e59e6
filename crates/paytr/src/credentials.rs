use crate::security::redacted;

/// Merchant API credentials from the PayTR merchant panel.
///
/// `key` and `salt` are only ever used as signing input; they are never sent
/// to the API and never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct MerchantCredentials {
    merchant_id: String,
    key: Vec<u8>,
    salt: Vec<u8>,
}

impl MerchantCredentials {
    pub fn new(
        merchant_id: impl Into<String>,
        key: impl Into<Vec<u8>>,
        salt: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            key: key.into(),
            salt: salt.into(),
        }
    }

    pub fn merchant_id(&self) -> &str {
        &self.merchant_id
    }

    pub(crate) fn key(&self) -> &[u8] {
        &self.key
    }

    pub(crate) fn salt(&self) -> &[u8] {
        &self.salt
    }
}

impl std::fmt::Debug for MerchantCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MerchantCredentials")
            .field("merchant_id", &self.merchant_id)
            .field("key", &redacted(&self.key))
            .field("salt", &redacted(&self.salt))
            .finish()
    }
}
