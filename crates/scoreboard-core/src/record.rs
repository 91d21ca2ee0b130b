//! Credential record and its byte layout.
//!
//! The record is stored as 258 contiguous bytes:
//!
//! ```text
//! offset  size  field
//!      0     1  ssid length (0..=127)
//!      1   128  ssid bytes, 0 at index `length`
//!    129     1  password length (0..=127)
//!    130   128  password bytes, 0 at index `length`
//! ```
//!
//! [`CredentialRecord::encode`] and [`CredentialRecord::decode`] are the only
//! way in and out of that layout. Decoding never fails: out-of-range lengths
//! are kept as read and reported by [`CredentialRecord::is_within_bounds`].

/// Bytes reserved for each field, terminator included.
pub const FIELD_CAPACITY: usize = 128;

/// Longest value a field can hold.
pub const MAX_FIELD_LEN: usize = FIELD_CAPACITY - 1;

/// Encoded size of one field: length byte plus payload.
const FIELD_SIZE: usize = 1 + FIELD_CAPACITY;

/// Encoded size of the whole record.
pub const RECORD_SIZE: usize = 2 * FIELD_SIZE;

const SSID_OFFSET: usize = 0;
const PASSWORD_OFFSET: usize = FIELD_SIZE;

/// A length-prefixed, zero-terminated byte string of fixed capacity.
#[derive(Clone, PartialEq, Eq)]
pub struct LengthPrefixedField {
    len: u8,
    bytes: [u8; FIELD_CAPACITY],
}

impl LengthPrefixedField {
    /// Empty field (length 0, all bytes zero).
    pub const fn empty() -> Self {
        Self {
            len: 0,
            bytes: [0; FIELD_CAPACITY],
        }
    }

    /// Declared length. May exceed [`MAX_FIELD_LEN`] for data read from memory.
    pub fn declared_len(&self) -> usize {
        usize::from(self.len)
    }

    pub fn is_within_bounds(&self) -> bool {
        self.declared_len() <= MAX_FIELD_LEN
    }

    /// Raw payload bytes, including anything past the terminator.
    pub fn raw(&self) -> &[u8; FIELD_CAPACITY] {
        &self.bytes
    }

    /// Bytes up to the declared length, cut at the first zero byte.
    ///
    /// Returns `None` when the declared length is out of range.
    pub fn value(&self) -> Option<&[u8]> {
        if !self.is_within_bounds() {
            return None;
        }
        let declared = &self.bytes[..self.declared_len()];
        let end = declared.iter().position(|&b| b == 0).unwrap_or(declared.len());
        Some(&declared[..end])
    }

    /// Replace the value. The caller has already checked the length.
    fn assign(&mut self, value: &[u8]) {
        debug_assert!(value.len() <= MAX_FIELD_LEN);
        self.bytes[..value.len()].copy_from_slice(value);
        self.bytes[value.len()] = 0;
        self.len = value.len() as u8;
    }

    fn terminate(&mut self) {
        if self.is_within_bounds() {
            self.bytes[self.declared_len()] = 0;
        }
    }

    fn encode_into(&self, out: &mut [u8]) {
        out[0] = self.len;
        out[1..FIELD_SIZE].copy_from_slice(&self.bytes);
    }

    fn decode_from(input: &[u8]) -> Self {
        let mut bytes = [0; FIELD_CAPACITY];
        bytes.copy_from_slice(&input[1..FIELD_SIZE]);
        Self {
            len: input[0],
            bytes,
        }
    }
}

impl Default for LengthPrefixedField {
    fn default() -> Self {
        Self::empty()
    }
}

impl core::fmt::Debug for LengthPrefixedField {
    // Payload may be a secret, so only the length is shown.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LengthPrefixedField")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

/// WiFi network name and password as stored in non-volatile memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialRecord {
    pub ssid: LengthPrefixedField,
    pub password: LengthPrefixedField,
}

impl CredentialRecord {
    /// Serialize to the 258-byte layout.
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut out = [0; RECORD_SIZE];
        self.ssid
            .encode_into(&mut out[SSID_OFFSET..SSID_OFFSET + FIELD_SIZE]);
        self.password
            .encode_into(&mut out[PASSWORD_OFFSET..PASSWORD_OFFSET + FIELD_SIZE]);
        out
    }

    /// Parse the 258-byte layout. Lengths are not checked here.
    pub fn decode(bytes: &[u8; RECORD_SIZE]) -> Self {
        Self {
            ssid: LengthPrefixedField::decode_from(&bytes[SSID_OFFSET..SSID_OFFSET + FIELD_SIZE]),
            password: LengthPrefixedField::decode_from(
                &bytes[PASSWORD_OFFSET..PASSWORD_OFFSET + FIELD_SIZE],
            ),
        }
    }

    /// Both declared lengths are at most [`MAX_FIELD_LEN`].
    pub fn is_within_bounds(&self) -> bool {
        self.ssid.is_within_bounds() && self.password.is_within_bounds()
    }

    /// Validate and, when valid, write the terminator after each field.
    ///
    /// This is the single validity rule shared by load and commit.
    pub fn validate(&mut self) -> bool {
        if !self.is_within_bounds() {
            return false;
        }
        self.ssid.terminate();
        self.password.terminate();
        true
    }

    pub(crate) fn set_ssid(&mut self, value: &[u8]) {
        self.ssid.assign(value);
    }

    pub(crate) fn set_password(&mut self, value: &[u8]) {
        self.password.assign(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw_record(ssid_len: u8, ssid: &[u8], pwd_len: u8, pwd: &[u8]) -> [u8; RECORD_SIZE] {
        let mut bytes = [0xAA; RECORD_SIZE];
        bytes[0] = ssid_len;
        bytes[1..1 + ssid.len()].copy_from_slice(ssid);
        bytes[129] = pwd_len;
        bytes[130..130 + pwd.len()].copy_from_slice(pwd);
        bytes
    }

    #[test]
    fn test_layout_constants() {
        assert_eq!(RECORD_SIZE, 258);
        assert_eq!(MAX_FIELD_LEN, 127);
        assert_eq!(PASSWORD_OFFSET, 129);
    }

    #[test]
    fn test_encode_places_fields_at_fixed_offsets() {
        let mut record = CredentialRecord::default();
        record.set_ssid(b"home");
        record.set_password(b"secret");

        let bytes = record.encode();
        assert_eq!(bytes[0], 4);
        assert_eq!(&bytes[1..5], b"home");
        assert_eq!(bytes[5], 0);
        assert_eq!(bytes[129], 6);
        assert_eq!(&bytes[130..136], b"secret");
        assert_eq!(bytes[136], 0);
    }

    #[test]
    fn test_decode_keeps_out_of_range_length() {
        let record = CredentialRecord::decode(&raw_record(200, b"x", 3, b"abc"));
        assert_eq!(record.ssid.declared_len(), 200);
        assert!(!record.is_within_bounds());
        assert_eq!(record.ssid.value(), None);
        assert_eq!(record.password.value(), Some(&b"abc"[..]));
    }

    #[test]
    fn test_validate_writes_terminators() {
        // Filler bytes past each length are non-zero until validated.
        let mut record = CredentialRecord::decode(&raw_record(2, b"ab", 1, b"p"));
        assert_eq!(record.ssid.raw()[2], 0xAA);

        assert!(record.validate());
        assert_eq!(record.ssid.raw()[2], 0);
        assert_eq!(record.password.raw()[1], 0);
        assert_eq!(record.ssid.value(), Some(&b"ab"[..]));
    }

    #[test]
    fn test_validate_leaves_invalid_record_untouched() {
        let bytes = raw_record(5, b"abcde", 128, b"");
        let mut record = CredentialRecord::decode(&bytes);
        assert!(!record.validate());
        assert_eq!(record.encode(), bytes);
    }

    #[test]
    fn test_max_length_field() {
        let mut record = CredentialRecord::default();
        let value = [b'z'; MAX_FIELD_LEN];
        record.set_password(&value);
        assert!(record.validate());
        assert_eq!(record.password.value(), Some(&value[..]));
        assert_eq!(record.password.raw()[MAX_FIELD_LEN], 0);
    }

    #[test]
    fn test_value_stops_at_embedded_zero() {
        let mut record = CredentialRecord::default();
        record.set_ssid(b"ab\0cd");
        assert_eq!(record.ssid.declared_len(), 5);
        assert_eq!(record.ssid.value(), Some(&b"ab"[..]));
    }

    #[test]
    fn test_debug_hides_payload() {
        let mut record = CredentialRecord::default();
        record.set_password(b"hunter2");
        let debug = format!("{:?}", record);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("len: 7"));
    }
}
