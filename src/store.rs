//! Durable credential and preference storage.
//!
//! Two values live here for the whole app: the bearer token and the UI
//! theme. Each sits in its own sled tree so a failed write to one can
//! never corrupt the other. Values are sealed with AES-256-GCM under a
//! per-install device secret before they touch disk.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use hmac::Hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::SplitmateError;

const TOKEN_KEY: &[u8] = b"bearer_token";
const THEME_KEY: &[u8] = b"theme";
const DEVICE_SECRET_KEY: &[u8] = b"device_secret";
const KDF_SALT: &[u8] = b"splitmate.store.v1";
const KDF_ROUNDS: u32 = 100_000;

/// Encrypted envelope as stored on disk.
#[derive(Serialize, Deserialize)]
struct Sealed {
    nonce: Vec<u8>,
    ciphertext: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
    System,
}

impl FromStr for Theme {
    type Err = SplitmateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            other => Err(SplitmateError::Validation(format!(
                "Unknown theme '{}', expected light, dark or system",
                other
            ))),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
            Theme::System => write!(f, "system"),
        }
    }
}

pub struct CredentialStore {
    db: sled::Db,
    auth: sled::Tree,
    prefs: sled::Tree,
    key: [u8; 32],
}

impl CredentialStore {
    /// Open (or create) the store under `dir`. Generates the device
    /// secret on first open; subsequent opens derive the same key.
    pub fn open(dir: &Path) -> Result<Self, SplitmateError> {
        let db = sled::open(dir.join("store"))?;
        let secret = match db.get(DEVICE_SECRET_KEY)? {
            Some(bytes) => bytes.to_vec(),
            None => {
                let fresh: [u8; 32] = rand::random();
                db.insert(DEVICE_SECRET_KEY, fresh.to_vec())?;
                db.flush()?;
                fresh.to_vec()
            }
        };
        let key = derive_key(&secret);
        let auth = db.open_tree("auth")?;
        let prefs = db.open_tree("prefs")?;
        Ok(Self {
            db,
            auth,
            prefs,
            key,
        })
    }

    pub fn set_token(&self, token: &str) -> Result<(), SplitmateError> {
        self.put(&self.auth, TOKEN_KEY, token.as_bytes())
    }

    pub fn token(&self) -> Result<Option<String>, SplitmateError> {
        self.get_string(&self.auth, TOKEN_KEY)
    }

    /// Removing an absent token is a no-op.
    pub fn clear_token(&self) -> Result<(), SplitmateError> {
        self.remove(&self.auth, TOKEN_KEY)
    }

    pub fn set_theme(&self, theme: Theme) -> Result<(), SplitmateError> {
        self.put(&self.prefs, THEME_KEY, theme.to_string().as_bytes())
    }

    pub fn theme(&self) -> Result<Option<Theme>, SplitmateError> {
        match self.get_string(&self.prefs, THEME_KEY)? {
            Some(s) => Ok(Theme::from_str(&s).ok()),
            None => Ok(None),
        }
    }

    fn put(&self, tree: &sled::Tree, key: &[u8], value: &[u8]) -> Result<(), SplitmateError> {
        let sealed = seal(&self.key, value)?;
        let bytes = bincode::serialize(&sealed)
            .map_err(|e| SplitmateError::Storage(e.to_string()))?;
        tree.insert(key, bytes)?;
        self.db.flush()?;
        Ok(())
    }

    fn get_string(
        &self,
        tree: &sled::Tree,
        key: &[u8],
    ) -> Result<Option<String>, SplitmateError> {
        let Some(bytes) = tree.get(key)? else {
            return Ok(None);
        };
        let sealed: Sealed = match bincode::deserialize(&bytes) {
            Ok(s) => s,
            Err(e) => {
                // A value we can no longer read is treated as absent so a
                // damaged store degrades to "logged out" instead of a
                // crash loop.
                tracing::warn!("Discarding unreadable stored value: {}", e);
                self.remove(tree, key)?;
                return Ok(None);
            }
        };
        match unseal(&self.key, &sealed) {
            Ok(plain) => match String::from_utf8(plain) {
                Ok(s) => Ok(Some(s)),
                Err(_) => {
                    tracing::warn!("Discarding non-utf8 stored value");
                    self.remove(tree, key)?;
                    Ok(None)
                }
            },
            Err(e) => {
                tracing::warn!("Discarding undecryptable stored value: {}", e);
                self.remove(tree, key)?;
                Ok(None)
            }
        }
    }

    fn remove(&self, tree: &sled::Tree, key: &[u8]) -> Result<(), SplitmateError> {
        tree.remove(key)?;
        self.db.flush()?;
        Ok(())
    }
}

fn derive_key(secret: &[u8]) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2::pbkdf2::<Hmac<Sha256>>(secret, KDF_SALT, KDF_ROUNDS, &mut key);
    key
}

fn seal(key: &[u8; 32], plaintext: &[u8]) -> Result<Sealed, SplitmateError> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|_| SplitmateError::Crypto("Invalid key length".to_string()))?;
    let nonce_bytes: [u8; 12] = rand::random();
    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| SplitmateError::Crypto("Encryption failed".to_string()))?;
    Ok(Sealed {
        nonce: nonce_bytes.to_vec(),
        ciphertext,
    })
}

fn unseal(key: &[u8; 32], sealed: &Sealed) -> Result<Vec<u8>, SplitmateError> {
    if sealed.nonce.len() != 12 {
        return Err(SplitmateError::Crypto("Bad nonce length".to_string()));
    }
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|_| SplitmateError::Crypto("Invalid key length".to_string()))?;
    let nonce = Nonce::from_slice(&sealed.nonce);
    cipher
        .decrypt(nonce, sealed.ciphertext.as_slice())
        .map_err(|_| SplitmateError::Crypto("Decryption failed".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_get_clear_token() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::open(dir.path()).unwrap();

        assert_eq!(store.token().unwrap(), None);
        store.set_token("abc123").unwrap();
        assert_eq!(store.token().unwrap(), Some("abc123".to_string()));

        // Overwrites are whole-value replacements
        store.set_token("first").unwrap();
        store.set_token("second").unwrap();
        assert_eq!(store.token().unwrap(), Some("second".to_string()));

        store.clear_token().unwrap();
        assert_eq!(store.token().unwrap(), None);

        // Clearing again is a no-op
        store.clear_token().unwrap();
        assert_eq!(store.token().unwrap(), None);
    }

    #[test]
    fn test_token_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = CredentialStore::open(dir.path()).unwrap();
            store.set_token("persisted").unwrap();
        }
        let store = CredentialStore::open(dir.path()).unwrap();
        assert_eq!(store.token().unwrap(), Some("persisted".to_string()));
    }

    #[test]
    fn test_clear_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = CredentialStore::open(dir.path()).unwrap();
            store.set_token("doomed").unwrap();
            store.set_token("doomed again").unwrap();
            store.clear_token().unwrap();
        }
        let store = CredentialStore::open(dir.path()).unwrap();
        assert_eq!(store.token().unwrap(), None);
    }

    #[test]
    fn test_theme_independent_of_token() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::open(dir.path()).unwrap();

        store.set_theme(Theme::Dark).unwrap();
        store.set_token("tok").unwrap();
        store.clear_token().unwrap();

        assert_eq!(store.theme().unwrap(), Some(Theme::Dark));
        assert_eq!(store.token().unwrap(), None);
    }

    #[test]
    fn test_token_not_plaintext_on_disk() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::open(dir.path()).unwrap();
        store.set_token("super-secret-token").unwrap();

        let raw = store.auth.get(TOKEN_KEY).unwrap().unwrap();
        let haystack = raw.to_vec();
        let needle = b"super-secret-token";
        assert!(!haystack
            .windows(needle.len())
            .any(|window| window == needle));
    }

    #[test]
    fn test_theme_parse() {
        assert_eq!(Theme::from_str("Dark").unwrap(), Theme::Dark);
        assert_eq!(Theme::from_str(" system ").unwrap(), Theme::System);
        assert!(Theme::from_str("sepia").is_err());
    }
}
