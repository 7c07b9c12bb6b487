//! Cifrado de documentos de identidad
//!
//! AES-256-GCM con una clave por usuario. El blob guardado es
//! `nonce (12 bytes) || ciphertext+tag`.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};

use crate::utils::errors::{AppError, AppResult};

const NONCE_LEN: usize = 12;

/// Nueva clave aleatoria de 32 bytes
pub fn generate_key() -> Vec<u8> {
    Aes256Gcm::generate_key(&mut OsRng).to_vec()
}

fn cipher(key: &[u8]) -> AppResult<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key)
        .map_err(|_| AppError::Internal("Invalid document encryption key".to_string()))
}

/// Cifra con un nonce aleatorio antepuesto al resultado
pub fn seal(key: &[u8], plaintext: &[u8]) -> AppResult<Vec<u8>> {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher(key)?
        .encrypt(&nonce, plaintext)
        .map_err(|_| AppError::Internal("Document encryption failed".to_string()))?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

pub fn open(key: &[u8], sealed: &[u8]) -> AppResult<Vec<u8>> {
    if sealed.len() < NONCE_LEN {
        return Err(AppError::Internal("Stored document is truncated".to_string()));
    }
    let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
    cipher(key)?
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| AppError::Internal("Document decryption failed".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_and_open() {
        let key = generate_key();
        assert_eq!(key.len(), 32);

        let sealed = seal(&key, b"id-card-bytes").unwrap();
        assert_ne!(&sealed[NONCE_LEN..], b"id-card-bytes");
        assert_eq!(open(&key, &sealed).unwrap(), b"id-card-bytes".to_vec());

        // Nonce nuevo en cada llamada
        assert_ne!(seal(&key, b"id-card-bytes").unwrap(), sealed);
    }

    #[test]
    fn test_open_rejects_wrong_key_and_tampering() {
        let key = generate_key();
        let sealed = seal(&key, b"selfie").unwrap();

        assert!(open(&generate_key(), &sealed).is_err());

        let mut tampered = sealed.clone();
        let last = tampered.len() - 1;
        tampered[last] ^= 0x01;
        assert!(open(&key, &tampered).is_err());

        assert!(open(&key, &sealed[..4]).is_err());
        assert!(cipher(&[0u8; 16]).is_err());
    }
}
