//! フィールド暗号化（AES-256-GCM）
//!
//! チェックインのメモやチャット本文など自由記述カラムを保存時に暗号化する。
//! 鍵は設定されたパスフレーズのSHA-256から導出し、出力は
//! `base64(nonce || ciphertext)` 形式の文字列。

use aes_gcm::aead::{Aead, AeadCore, OsRng};
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use sha2::{Digest, Sha256};

use crate::common::error::ApiError;

/// GCMノンス長（バイト）
const NONCE_LEN: usize = 12;

/// 自由記述カラム用のフィールド暗号
#[derive(Clone)]
pub struct FieldCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 鍵材料はDebug出力に含めない
        f.debug_struct("FieldCipher").finish_non_exhaustive()
    }
}

impl FieldCipher {
    /// パスフレーズからフィールド暗号を作成
    ///
    /// # Arguments
    /// * `passphrase` - 暗号化キー（SHA-256で32バイト鍵に導出）
    pub fn new(passphrase: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(passphrase.as_bytes());
        let key_bytes = hasher.finalize();
        let key = Key::<Aes256Gcm>::from_slice(&key_bytes);
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    /// 平文を暗号化
    ///
    /// 空文字列は暗号化せず空文字列のまま返す（NULL相当の扱い）。
    ///
    /// # Returns
    /// * `Ok(String)` - `base64(nonce || ciphertext)`
    /// * `Err(ApiError)` - 暗号化失敗
    pub fn encrypt(&self, plaintext: &str) -> Result<String, ApiError> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| ApiError::Encryption(format!("Failed to encrypt field: {}", e)))?;

        let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        combined.extend_from_slice(&nonce);
        combined.extend_from_slice(&ciphertext);

        Ok(BASE64.encode(combined))
    }

    /// 暗号文を復号
    ///
    /// # Arguments
    /// * `encoded` - `encrypt`が返した`base64(nonce || ciphertext)`文字列
    ///
    /// # Returns
    /// * `Ok(String)` - 復号された平文
    /// * `Err(ApiError)` - 復号失敗（改ざん、鍵違い、形式不正）
    pub fn decrypt(&self, encoded: &str) -> Result<String, ApiError> {
        if encoded.is_empty() {
            return Ok(String::new());
        }

        let combined = BASE64
            .decode(encoded)
            .map_err(|e| ApiError::Encryption(format!("Invalid ciphertext encoding: {}", e)))?;

        if combined.len() <= NONCE_LEN {
            return Err(ApiError::Encryption("Ciphertext too short".to_string()));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| ApiError::Encryption(format!("Failed to decrypt field: {}", e)))?;

        String::from_utf8(plaintext)
            .map_err(|e| ApiError::Encryption(format!("Decrypted field is not UTF-8: {}", e)))
    }
}
