use crate::types::{ClientType, DeliveryType};
use rand::Rng;

// ---------------------------------------------------------------------------
// Intake-field normalization
// ---------------------------------------------------------------------------
//
// The intake system stores free-form, capitalized Spanish labels. Everything
// entering this core goes through these helpers first.

/// Map an intake client-type label to the closed enum. Unknown labels fall
/// back to `Individual`.
pub fn client_type(label: &str) -> ClientType {
    match label.trim().to_lowercase().as_str() {
        "particular" | "individual" => ClientType::Individual,
        "hotel" => ClientType::Hotel,
        // The label sometimes carries the accent.
        "institucion" | "institución" | "institution" => ClientType::Institution,
        "empresa" | "company" => ClientType::Company,
        _ => ClientType::Individual,
    }
}

/// Map an intake delivery-type label to the closed enum. Defaults to pickup.
pub fn delivery_type(label: &str) -> DeliveryType {
    match label.trim().to_lowercase().as_str() {
        "despacho" | "dispatch" => DeliveryType::Dispatch,
        _ => DeliveryType::Pickup,
    }
}

/// Map the intake "Activa"/"Inactiva" order status to a flag. Missing or
/// unknown values count as active.
pub fn active_flag(label: Option<&str>) -> bool {
    match label {
        Some(s) => !s.trim().eq_ignore_ascii_case("inactiva"),
        None => true,
    }
}

/// Normalize a phone number to the +56XXXXXXXXX form expected by the
/// notification collaborator.
pub fn phone(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|c| c.is_ascii_digit() || *c == '+').collect();
    if cleaned.starts_with('+') {
        cleaned
    } else if cleaned.starts_with("56") {
        format!("+{cleaned}")
    } else {
        format!("+56{cleaned}")
    }
}

// ---------------------------------------------------------------------------
// Dispatch verification code
// ---------------------------------------------------------------------------

/// Alphabet for verification codes. Excludes I, O, 0 and 1, which read
/// ambiguously over the phone and in print.
const CODE_CHARS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_LEN: usize = 5;

/// Generate a random 5-character dispatch verification code.
pub fn dispatch_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| CODE_CHARS[rng.gen_range(0..CODE_CHARS.len())] as char)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
