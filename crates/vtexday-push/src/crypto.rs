//! Device token encryption
//!
//! Push tokens are credentials: anyone holding one can message the device.
//! They are stored as base64(nonce || AES-256-GCM ciphertext) and
//! deduplicated through a SHA-256 fingerprint of the plaintext.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{engine::general_purpose::STANDARD, Engine};
use sha2::{Digest, Sha256};

use crate::prelude::*;

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

#[derive(Clone)]
pub struct DeviceTokenCipher {
	cipher: Aes256Gcm,
}

impl std::fmt::Debug for DeviceTokenCipher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DeviceTokenCipher").finish_non_exhaustive()
	}
}

impl DeviceTokenCipher {
	pub fn new(key: &[u8]) -> ClResult<Self> {
		if key.len() != KEY_LEN {
			return Err(Error::ConfigError(format!(
				"device token key must be {} bytes, got {}",
				KEY_LEN,
				key.len()
			)));
		}
		let cipher = Aes256Gcm::new_from_slice(key)
			.map_err(|_| Error::ConfigError("invalid device token key".into()))?;
		Ok(Self { cipher })
	}

	/// Build from a base64 encoded 32 byte key
	pub fn from_base64_key(key: &str) -> ClResult<Self> {
		let key = STANDARD
			.decode(key.trim())
			.map_err(|_| Error::ConfigError("device token key is not valid base64".into()))?;
		Self::new(&key)
	}

	/// Generate a random key, base64 encoded
	pub fn generate_key() -> String {
		use rand::Rng;
		let mut key = [0u8; KEY_LEN];
		let mut rng = rand::rng();
		rng.fill_bytes(&mut key);
		STANDARD.encode(key)
	}

	pub fn encrypt(&self, token: &str) -> ClResult<String> {
		use rand::Rng;
		let mut nonce = [0u8; NONCE_LEN];
		let mut rng = rand::rng();
		rng.fill_bytes(&mut nonce);

		let ciphertext = self
			.cipher
			.encrypt(&Nonce::from(nonce), token.as_bytes())
			.map_err(|e| Error::Internal(format!("device token encryption failed: {}", e)))?;

		let mut sealed = nonce.to_vec();
		sealed.extend_from_slice(&ciphertext);
		Ok(STANDARD.encode(sealed))
	}

	pub fn decrypt(&self, sealed: &str) -> ClResult<String> {
		let data = STANDARD.decode(sealed).map_err(|_| Error::Parse)?;
		if data.len() <= NONCE_LEN {
			return Err(Error::Parse);
		}

		let (nonce, ciphertext) = data.split_at(NONCE_LEN);
		let nonce: [u8; NONCE_LEN] = nonce.try_into().map_err(|_| Error::Parse)?;
		let plaintext = self
			.cipher
			.decrypt(&Nonce::from(nonce), ciphertext)
			.map_err(|_| Error::Internal("device token decryption failed".into()))?;

		String::from_utf8(plaintext).map_err(|_| Error::Parse)
	}
}

/// Hex SHA-256 of a plaintext token
pub fn fingerprint(token: &str) -> String {
	format!("{:x}", Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
	use super::*;

	const TOKEN: &str = "ExponentPushToken[xxxxxxxxxxxxxxxxxxxxxx]";

	fn cipher() -> DeviceTokenCipher {
		DeviceTokenCipher::new(&[7u8; 32]).unwrap()
	}

	#[test]
	fn test_encrypt_decrypt() {
		let cipher = cipher();
		let sealed = cipher.encrypt(TOKEN).unwrap();
		assert!(!sealed.contains("ExponentPushToken"));
		assert_eq!(cipher.decrypt(&sealed).unwrap(), TOKEN);
	}

	#[test]
	fn test_fresh_nonce_per_encryption() {
		let cipher = cipher();
		assert_ne!(cipher.encrypt(TOKEN).unwrap(), cipher.encrypt(TOKEN).unwrap());
	}

	#[test]
	fn test_tampered_rejected() {
		let cipher = cipher();
		let mut data = STANDARD.decode(cipher.encrypt(TOKEN).unwrap()).unwrap();
		if let Some(last) = data.last_mut() {
			*last ^= 1;
		}
		assert!(matches!(cipher.decrypt(&STANDARD.encode(data)), Err(Error::Internal(_))));
	}

	#[test]
	fn test_short_or_garbage_rejected() {
		let cipher = cipher();
		assert!(matches!(cipher.decrypt(&STANDARD.encode([0u8; 12])), Err(Error::Parse)));
		assert!(matches!(cipher.decrypt("%%%"), Err(Error::Parse)));
	}

	#[test]
	fn test_wrong_key_rejected() {
		let sealed = cipher().encrypt(TOKEN).unwrap();
		let other = DeviceTokenCipher::new(&[8u8; 32]).unwrap();
		assert!(other.decrypt(&sealed).is_err());
	}

	#[test]
	fn test_key_validation() {
		assert!(matches!(DeviceTokenCipher::new(&[0u8; 16]), Err(Error::ConfigError(_))));
		assert!(matches!(DeviceTokenCipher::from_base64_key("nope!"), Err(Error::ConfigError(_))));

		let key = DeviceTokenCipher::generate_key();
		assert!(DeviceTokenCipher::from_base64_key(&key).is_ok());
	}

	#[test]
	fn test_fingerprint() {
		assert_eq!(fingerprint(TOKEN), fingerprint(TOKEN));
		assert_ne!(fingerprint(TOKEN), fingerprint("ExponentPushToken[other]"));
		assert_eq!(
			fingerprint("abc"),
			"ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
		);
	}
}

// vim: ts=4
