use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Shared secret the sensor device must present.
///
/// Candidates are HMAC-tagged with the secret as key and checked against the
/// secret's own tag via `verify_slice`, which compares in constant time.
#[derive(Clone)]
pub struct ApiKey {
    key: Vec<u8>,
    tag: Vec<u8>,
}

impl ApiKey {
    pub fn new(secret: &str) -> Self {
        let key = secret.as_bytes().to_vec();
        let tag = mac(&key, secret.as_bytes()).finalize().into_bytes().to_vec();
        Self { key, tag }
    }

    pub fn verify(&self, candidate: &str) -> bool {
        mac(&self.key, candidate.as_bytes())
            .verify_slice(&self.tag)
            .is_ok()
    }

    /// Short hex fingerprint, safe to log.
    pub fn fingerprint(&self) -> String {
        hex::encode(&self.tag[..4])
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKey")
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

fn mac(key: &[u8], message: &[u8]) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(message);
    mac
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_exact_secret() {
        let key = ApiKey::new("your_rpi_api_key_12345");
        assert!(key.verify("your_rpi_api_key_12345"));
    }

    #[test]
    fn rejects_anything_else() {
        let key = ApiKey::new("secret");
        assert!(!key.verify(""));
        assert!(!key.verify("Secret"));
        assert!(!key.verify("secret "));
        assert!(!key.verify("secretsecret"));
    }

    #[test]
    fn fingerprint_is_stable_and_short() {
        let a = ApiKey::new("secret");
        let b = ApiKey::new("secret");
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 8);
        assert_ne!(a.fingerprint(), ApiKey::new("other").fingerprint());
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let printed = format!("{:?}", ApiKey::new("very-secret"));
        assert!(!printed.contains("very-secret"));
    }
}
