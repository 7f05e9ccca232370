// Nonce codec tests.
//
// Covers:
// * direction (reflection) defense
// * replay / reorder / drop defense in sequential mode
// * exhaustion
// * the weaker random-nonce mode
// * opaque authentication failures

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;

    use crypto_stream::crypto::{
        Aes256GcmCipher, Cipher, CryptoError, Decoder, Encoder, NonceError, SecretBoxCipher,
        SharedCipher,
    };
    use crypto_stream::types::StreamError;

    /// Identity "cipher" with a configurable nonce size, for exercising the
    /// codec without a real primitive.
    struct IdentityCipher {
        nonce_size: usize,
    }

    impl Cipher for IdentityCipher {
        fn encrypt(&self, dst: &mut [u8], plaintext: &[u8], _nonce: &[u8]) -> Result<usize, CryptoError> {
            dst[..plaintext.len()].copy_from_slice(plaintext);
            Ok(plaintext.len())
        }

        fn decrypt(&self, dst: &mut [u8], ciphertext: &[u8], _nonce: &[u8]) -> Result<usize, CryptoError> {
            dst[..ciphertext.len()].copy_from_slice(ciphertext);
            Ok(ciphertext.len())
        }

        fn max_overhead(&self) -> usize {
            0
        }

        fn nonce_size(&self) -> usize {
            self.nonce_size
        }
    }

    fn gcm() -> SharedCipher {
        Arc::new(Aes256GcmCipher::new(&[0x42u8; 32]).unwrap())
    }

    fn seal(encoder: &mut Encoder, plaintext: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; 64 + plaintext.len()];
        let n = encoder.encode(&mut out, plaintext).unwrap();
        out.truncate(n);
        out
    }

    fn open(decoder: &mut Decoder, record: &[u8]) -> Result<Vec<u8>, StreamError> {
        let mut out = vec![0u8; record.len()];
        let n = decoder.decode(&mut out, record)?;
        out.truncate(n);
        Ok(out)
    }

// # ✅ 1. Paired roles decode each other

    #[test]
    fn initiator_to_responder_roundtrip() {
        let cipher = gcm();
        let mut enc = Encoder::new(cipher.clone(), true, true).unwrap();
        let mut dec = Decoder::new(cipher, false, true, false).unwrap();

        for msg in [&b"hello"[..], b"world", b"!"] {
            let record = seal(&mut enc, msg);
            assert_eq!(open(&mut dec, &record).unwrap(), msg);
        }
    }

    #[test]
    fn responder_to_initiator_roundtrip() {
        let cipher: SharedCipher = Arc::new(SecretBoxCipher::new(&[9u8; 32]));
        let mut enc = Encoder::new(cipher.clone(), false, false).unwrap();
        let mut dec = Decoder::new(cipher, true, false, false).unwrap();

        let record = seal(&mut enc, b"from responder");
        assert_eq!(record[0] & 0x80, 0x80);
        assert_eq!(open(&mut dec, &record).unwrap(), b"from responder");
    }

// # ❌ 2. Reflection is rejected

    #[test]
    fn own_records_reflected_back_are_rejected() {
        for sequential in [true, false] {
            let cipher = gcm();
            let mut enc = Encoder::new(cipher.clone(), true, sequential).unwrap();
            let mut dec = Decoder::new(cipher, true, sequential, false).unwrap();

            let record = seal(&mut enc, b"bounced");
            assert!(matches!(
                open(&mut dec, &record),
                Err(StreamError::Nonce(NonceError::WrongDirection))
            ));
        }
    }

    #[test]
    fn responder_rejects_responder_records() {
        let cipher = gcm();
        let mut enc = Encoder::new(cipher.clone(), false, true).unwrap();
        let mut dec = Decoder::new(cipher, false, true, false).unwrap();

        let record = seal(&mut enc, b"bounced");
        assert!(matches!(
            open(&mut dec, &record),
            Err(StreamError::Nonce(NonceError::WrongDirection))
        ));
    }

// # ❌ 3. Replay, reorder and drop are rejected in sequential mode

    #[test]
    fn replayed_record_is_rejected() {
        let cipher = gcm();
        let mut enc = Encoder::new(cipher.clone(), true, true).unwrap();
        let mut dec = Decoder::new(cipher, false, true, false).unwrap();

        let record = seal(&mut enc, b"once");
        open(&mut dec, &record).unwrap();
        assert!(matches!(
            open(&mut dec, &record),
            Err(StreamError::Nonce(NonceError::WrongSequence))
        ));
    }

    #[test]
    fn reordered_records_are_rejected() {
        let cipher = gcm();
        let mut enc = Encoder::new(cipher.clone(), true, true).unwrap();
        let mut dec = Decoder::new(cipher, false, true, false).unwrap();

        let first = seal(&mut enc, b"first");
        let second = seal(&mut enc, b"second");

        assert!(matches!(
            open(&mut dec, &second),
            Err(StreamError::Nonce(NonceError::WrongSequence))
        ));
        // No resynchronization: the expected nonce did not move.
        assert_eq!(open(&mut dec, &first).unwrap(), b"first");
        assert_eq!(open(&mut dec, &second).unwrap(), b"second");
    }

    #[test]
    fn dropped_record_is_detected() {
        let cipher = gcm();
        let mut enc = Encoder::new(cipher.clone(), true, true).unwrap();
        let mut dec = Decoder::new(cipher, false, true, false).unwrap();

        let _dropped = seal(&mut enc, b"lost");
        let next = seal(&mut enc, b"next");
        assert!(matches!(
            open(&mut dec, &next),
            Err(StreamError::Nonce(NonceError::WrongSequence))
        ));
    }

// # ⚠️ 4. Random mode stays the weaker mode

    #[test]
    fn random_mode_checks_direction_only() {
        let cipher = gcm();
        let mut enc = Encoder::new(cipher.clone(), true, false).unwrap();
        let mut dec = Decoder::new(cipher, false, false, false).unwrap();

        let a = seal(&mut enc, b"a");
        let b = seal(&mut enc, b"b");
        assert_ne!(a[..12], b[..12]);
        assert_eq!(a[0] & 0x80, 0);

        // Out of order and replayed records are accepted.
        assert_eq!(open(&mut dec, &b).unwrap(), b"b");
        assert_eq!(open(&mut dec, &a).unwrap(), b"a");
        assert_eq!(open(&mut dec, &a).unwrap(), b"a");
    }

    #[test]
    fn disabled_verification_accepts_any_direction_and_order() {
        let cipher = gcm();
        let mut enc = Encoder::new(cipher.clone(), true, true).unwrap();
        let mut dec = Decoder::new(cipher, true, true, true).unwrap();

        let _skipped = seal(&mut enc, b"skipped");
        let record = seal(&mut enc, b"reflected");
        assert_eq!(open(&mut dec, &record).unwrap(), b"reflected");
    }

// # ❌ 5. Tampering surfaces as an authentication error

    #[test]
    fn tampered_ciphertext_fails_authentication() {
        let cipher = gcm();
        let mut enc = Encoder::new(cipher.clone(), true, true).unwrap();
        let mut dec = Decoder::new(cipher, false, true, false).unwrap();

        let mut record = seal(&mut enc, b"do not touch");
        let last = record.len() - 1;
        record[14] ^= 0x01;
        record[last] ^= 0x80;

        assert!(matches!(
            open(&mut dec, &record),
            Err(StreamError::Crypto(CryptoError::AuthenticationFailed))
        ));
    }

    #[test]
    fn failed_authentication_does_not_advance_sequence() {
        let cipher = gcm();
        let mut enc = Encoder::new(cipher.clone(), true, true).unwrap();
        let mut dec = Decoder::new(cipher, false, true, false).unwrap();

        let record = seal(&mut enc, b"payload");
        let mut forged = record.clone();
        forged[20] ^= 0xFF;

        let expected = dec.next_nonce().to_vec();
        assert!(open(&mut dec, &forged).is_err());
        assert_eq!(dec.next_nonce(), expected.as_slice());
        assert_eq!(open(&mut dec, &record).unwrap(), b"payload");
    }

// # ❌ 6. Size and exhaustion limits

    #[test]
    fn record_not_longer_than_nonce_is_rejected() {
        let mut dec = Decoder::new(gcm(), false, true, false).unwrap();
        let record = [0u8; 12];
        assert!(matches!(
            open(&mut dec, &record),
            Err(StreamError::Nonce(NonceError::InvalidRecordSize { len: 12, nonce_size: 12 }))
        ));
    }

    #[test]
    fn encode_rejects_undersized_output() {
        let mut enc = Encoder::new(gcm(), true, true).unwrap();
        let mut out = [0u8; 20];
        assert!(matches!(
            enc.encode(&mut out, b"needs more room"),
            Err(StreamError::Nonce(NonceError::BufferTooSmall { .. }))
        ));
    }

    #[test]
    fn initiator_counter_exhausts_inside_its_namespace() {
        let cipher: SharedCipher = Arc::new(IdentityCipher { nonce_size: 1 });
        let mut enc = Encoder::new(cipher, true, true).unwrap();

        for i in 0..0x7Fu8 {
            let record = seal(&mut enc, b"x");
            assert_eq!(record[0], i);
        }
        assert_eq!(enc.next_nonce(), &[0x7F]);
        assert!(matches!(
            enc.encode(&mut [0u8; 8], b"x"),
            Err(StreamError::Nonce(NonceError::Exhausted))
        ));
    }

    #[test]
    fn responder_counter_exhausts_at_all_ones() {
        let cipher: SharedCipher = Arc::new(IdentityCipher { nonce_size: 1 });
        let mut enc = Encoder::new(cipher.clone(), false, true).unwrap();
        let mut dec = Decoder::new(cipher, true, true, false).unwrap();

        for i in 0x80..0xFFu8 {
            let record = seal(&mut enc, b"y");
            assert_eq!(record[0], i);
            assert_eq!(open(&mut dec, &record).unwrap(), b"y");
        }
        assert!(matches!(
            enc.encode(&mut [0u8; 8], b"y"),
            Err(StreamError::Nonce(NonceError::Exhausted))
        ));
    }

    #[test]
    fn zero_nonce_size_cipher_is_rejected() {
        let cipher: SharedCipher = Arc::new(IdentityCipher { nonce_size: 0 });
        assert!(matches!(
            Encoder::new(cipher.clone(), true, true),
            Err(NonceError::UnsupportedNonceSize(0))
        ));
        assert!(Decoder::new(cipher, true, true, false).is_err());
    }

// # ✅ 7. Sequential nonces strictly increase

    proptest! {
        #[test]
        fn prop_sequential_nonces_strictly_increase(count in 1usize..200, initiator in any::<bool>()) {
            let cipher = gcm();
            let mut enc = Encoder::new(cipher, initiator, true).unwrap();

            let mut previous: Option<Vec<u8>> = None;
            for _ in 0..count {
                let record = seal(&mut enc, b"p");
                let nonce = record[..12].to_vec();
                prop_assert_eq!(nonce[0] & 0x80 != 0, !initiator);
                if let Some(prev) = &previous {
                    prop_assert!(nonce > *prev);
                }
                previous = Some(nonce);
            }
        }
    }
}
