//! 凭据文件的 AES-256-GCM 加密
//!
//! 密钥由 PBKDF2-HMAC-SHA256 从 PASSWORD 派生（固定盐，10 万次迭代）。
//! 文件内容为 `base64(nonce(12) || ciphertext || tag)`。

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use sha2::Sha256;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::CryptoError;

pub const SALT: &[u8] = b"ZZU-Electricity-Monitor-Salt-v1";
pub const ITERATIONS: u32 = 100_000;
const NONCE_LEN: usize = 12;

pub fn derive_key(password: &str) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), SALT, ITERATIONS, &mut key);
    key
}

fn cipher(password: &str) -> Aes256Gcm {
    let key = derive_key(password);
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key))
}

/// 加密并返回 base64 文本
pub fn encrypt(plaintext: &[u8], password: &str) -> Result<String, CryptoError> {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher(password)
        .encrypt(&nonce, plaintext)
        .map_err(|_| CryptoError::Encrypt)?;

    let mut data = nonce.to_vec();
    data.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(data))
}

pub fn decrypt(encoded: &str, password: &str) -> Result<Vec<u8>, CryptoError> {
    let data = BASE64.decode(encoded.trim())?;
    if data.len() < NONCE_LEN {
        return Err(CryptoError::Decrypt);
    }
    let (nonce, ciphertext) = data.split_at(NONCE_LEN);
    cipher(password)
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::Decrypt)
}

pub fn encrypt_file(input: &Path, output: &Path, password: &str) -> Result<(), CryptoError> {
    let plaintext = fs::read(input).map_err(|e| io_error(input, e))?;
    let encoded = encrypt(&plaintext, password)?;
    fs::write(output, encoded).map_err(|e| io_error(output, e))?;
    info!(input = %input.display(), output = %output.display(), "File encrypted");
    Ok(())
}

pub fn decrypt_file(input: &Path, output: &Path, password: &str) -> Result<(), CryptoError> {
    let encoded = fs::read_to_string(input).map_err(|e| io_error(input, e))?;
    let plaintext = decrypt(&encoded, password)?;
    fs::write(output, plaintext).map_err(|e| io_error(output, e))?;
    info!(input = %input.display(), output = %output.display(), "File decrypted");
    Ok(())
}

fn io_error(path: &Path, source: std::io::Error) -> CryptoError {
    CryptoError::Io {
        path: path.to_path_buf(),
        source,
    }
}
