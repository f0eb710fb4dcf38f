use regex::Regex;
use std::sync::OnceLock;

pub const PHONE_ERROR: &str = "Please enter a valid 10-digit phone number";

/// Exactly ten ASCII digits, nothing else.
pub fn is_valid_phone(phone: &str) -> bool {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE
        .get_or_init(|| Regex::new(r"^[0-9]{10}$").expect("phone pattern compiles"))
        .is_match(phone)
}
