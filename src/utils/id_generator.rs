// src/utils/id_generator.rs
use chrono::{DateTime, Utc};
use nanoid::nanoid;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of the random part of internal ids. 62^8 combinations per day and
/// type keeps collisions rare; the store still guards every insert.
const SUFFIX_LEN: usize = 8;
const REFERENCE_LEN: usize = 8;

/// Uppercase alphabet without look-alikes (0/O, 1/I) for codes read out loud.
const REFERENCE_ALPHABET: [char; 32] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L', 'M', 'N', 'P', 'Q', 'R',
    'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', '2', '3', '4', '5', '6', '7', '8', '9',
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdType {
    User,
    Vehicle,
    Route,
    Shipment,
    Complaint,
}

impl IdType {
    pub fn to_prefix(&self) -> &'static str {
        match self {
            IdType::User => "usr",
            IdType::Vehicle => "veh",
            IdType::Route => "rte",
            IdType::Shipment => "shp",
            IdType::Complaint => "cmp",
        }
    }

    fn from_prefix(prefix: &str) -> Option<IdType> {
        match prefix {
            "usr" => Some(IdType::User),
            "veh" => Some(IdType::Vehicle),
            "rte" => Some(IdType::Route),
            "shp" => Some(IdType::Shipment),
            "cmp" => Some(IdType::Complaint),
            _ => None,
        }
    }
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_prefix())
    }
}

/// Human-facing references printed on receipts and tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceType {
    Shipment,
    Ticket,
}

impl ReferenceType {
    pub fn to_prefix(&self) -> &'static str {
        match self {
            ReferenceType::Shipment => "SHP",
            ReferenceType::Ticket => "TKT",
        }
    }
}

pub struct IdGenerator;

impl IdGenerator {
    /// Generate a unique ID with format: {prefix}-{yymmdd}-{random_suffix}
    pub fn generate(id_type: IdType) -> String {
        Self::generate_with_timestamp(id_type, Utc::now())
    }

    /// Generate ID with a specific timestamp (useful for testing)
    pub fn generate_with_timestamp(id_type: IdType, timestamp: DateTime<Utc>) -> String {
        let date_part = timestamp.format("%y%m%d").to_string();
        let random_suffix = Self::generate_alphanumeric_chars(SUFFIX_LEN);

        format!("{}-{}-{}", id_type.to_prefix(), date_part, random_suffix)
    }

    /// Generate a readable reference such as `SHP-7KQ2M9XA`
    pub fn generate_reference(reference_type: ReferenceType) -> String {
        format!(
            "{}-{}",
            reference_type.to_prefix(),
            nanoid!(REFERENCE_LEN, &REFERENCE_ALPHABET)
        )
    }

    /// Four-digit one-time code, never starting with zero.
    pub fn generate_otp() -> String {
        rand::rng().random_range(1000..=9999u32).to_string()
    }

    fn generate_alphanumeric_chars(n: usize) -> String {
        const ALPHANUMERIC_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

        let mut rng = rand::rng();
        (0..n)
            .map(|_| {
                let idx = rng.random_range(0..ALPHANUMERIC_CHARS.len());
                ALPHANUMERIC_CHARS[idx] as char
            })
            .collect()
    }

    /// Parse an ID to extract its components
    pub fn parse_id(id: &str) -> Result<ParsedId, IdError> {
        let parts: Vec<&str> = id.split('-').collect();
        let [prefix, date_part, random_suffix] = parts.as_slice() else {
            return Err(IdError::InvalidFormat);
        };

        if date_part.len() != 6 || random_suffix.len() != SUFFIX_LEN {
            return Err(IdError::InvalidFormat);
        }
        if !date_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IdError::InvalidDate);
        }
        if !random_suffix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(IdError::InvalidFormat);
        }

        let id_type = IdType::from_prefix(prefix)
            .ok_or_else(|| IdError::UnknownType(prefix.to_string()))?;

        // Parse date (YYMMDD format)
        let year = 2000 + date_part[0..2].parse::<i32>().map_err(|_| IdError::InvalidDate)?;
        let month = date_part[2..4].parse::<u32>().map_err(|_| IdError::InvalidDate)?;
        let day = date_part[4..6].parse::<u32>().map_err(|_| IdError::InvalidDate)?;

        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return Err(IdError::InvalidDate);
        }

        Ok(ParsedId {
            id_type,
            year,
            month,
            day,
            random_suffix: random_suffix.to_string(),
        })
    }

    /// Validate if an ID matches the expected format and type
    pub fn validate_id(id: &str, expected_type: Option<IdType>) -> bool {
        match Self::parse_id(id) {
            Ok(parsed) => expected_type.is_none_or(|expected| parsed.id_type == expected),
            Err(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedId {
    pub id_type: IdType,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub random_suffix: String,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum IdError {
    #[error("Invalid ID format")]
    InvalidFormat,

    #[error("Unknown ID type: {0}")]
    UnknownType(String),

    #[error("Invalid date component in ID")]
    InvalidDate,
}

pub trait WithGeneratedId {
    fn set_generated_id(&mut self, id_type: IdType);

    fn with_generated_id(mut self, id_type: IdType) -> Self
    where
        Self: Sized,
    {
        self.set_generated_id(id_type);
        self
    }
}

impl WithGeneratedId for crate::models::user::User {
    fn set_generated_id(&mut self, id_type: IdType) {
        self.id = IdGenerator::generate(id_type);
    }
}

impl WithGeneratedId for crate::models::vehicle::Vehicle {
    fn set_generated_id(&mut self, id_type: IdType) {
        self.id = IdGenerator::generate(id_type);
    }
}

impl WithGeneratedId for crate::models::route::Route {
    fn set_generated_id(&mut self, id_type: IdType) {
        self.id = IdGenerator::generate(id_type);
    }
}

impl WithGeneratedId for crate::models::shipment::Shipment {
    fn set_generated_id(&mut self, id_type: IdType) {
        self.id = IdGenerator::generate(id_type);
        self.shipment_code = IdGenerator::generate_reference(ReferenceType::Shipment);
    }
}

impl WithGeneratedId for crate::models::complaint::Complaint {
    fn set_generated_id(&mut self, id_type: IdType) {
        self.id = IdGenerator::generate(id_type);
        self.ticket_id = IdGenerator::generate_reference(ReferenceType::Ticket);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_id_generation() {
        let user_id = IdGenerator::generate(IdType::User);
        assert!(user_id.starts_with("usr-"));
        assert_eq!(user_id.split('-').count(), 3);

        let shipment_id = IdGenerator::generate(IdType::Shipment);
        assert!(IdGenerator::validate_id(&shipment_id, Some(IdType::Shipment)));
    }

    #[test]
    fn test_id_parsing() {
        let test_date = Utc.with_ymd_and_hms(2025, 12, 7, 0, 0, 0).unwrap();
        let id = IdGenerator::generate_with_timestamp(IdType::Vehicle, test_date);

        let parsed = IdGenerator::parse_id(&id).unwrap();
        assert_eq!(parsed.id_type, IdType::Vehicle);
        assert_eq!(parsed.year, 2025);
        assert_eq!(parsed.month, 12);
        assert_eq!(parsed.day, 7);
        assert_eq!(parsed.random_suffix.len(), SUFFIX_LEN);
    }

    #[test]
    fn test_validation() {
        let valid_id = "usr-251207-a1b2c3d4";
        assert!(IdGenerator::validate_id(valid_id, Some(IdType::User)));
        assert!(!IdGenerator::validate_id(valid_id, Some(IdType::Shipment)));

        assert!(!IdGenerator::validate_id("invalid-format", None));
        assert_eq!(IdGenerator::parse_id("xyz-251207-a1b2c3d4"), Err(IdError::UnknownType("xyz".to_string())));
        assert_eq!(IdGenerator::parse_id("usr-251307-a1b2c3d4"), Err(IdError::InvalidDate));
    }

    #[test]
    fn test_non_ascii_date_is_rejected() {
        assert_eq!(IdGenerator::parse_id("usr-1é234-abcdefgh"), Err(IdError::InvalidDate));
        assert_eq!(IdGenerator::parse_id("usr-25+207-abcdefgh"), Err(IdError::InvalidDate));
        assert!(!IdGenerator::validate_id("usr-1é234-abcdefgh", None));
    }

    #[test]
    fn test_references() {
        let code = IdGenerator::generate_reference(ReferenceType::Shipment);
        assert!(code.starts_with("SHP-"));
        assert_eq!(code.len(), 4 + REFERENCE_LEN);
        assert!(code[4..].chars().all(|c| REFERENCE_ALPHABET.contains(&c)));

        let ticket = IdGenerator::generate_reference(ReferenceType::Ticket);
        assert!(ticket.starts_with("TKT-"));
    }

    #[test]
    fn test_otp_is_four_digits() {
        for _ in 0..200 {
            let otp = IdGenerator::generate_otp();
            assert_eq!(otp.len(), 4);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(otp.as_bytes()[0], b'0');
        }
    }
}
