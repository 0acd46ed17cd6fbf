use std::fmt;

// ============== Secret Masking ==============

const MASK: &str = "*****";

/// Mask a secret for logging: first two and last two characters only.
///
/// Tokens too short to keep four characters hidden are masked completely.
pub fn mask_token(token: &str) -> String {
    if token.is_empty() {
        return "No token provided".to_string();
    }

    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 4 {
        return MASK.to_string();
    }

    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{head}{MASK}{tail}")
}

// ============== API Token ==============

/// Shortening-API secret.
///
/// `Debug` and `Display` print the masked form, so the token can sit inside
/// `Config` and still be logged safely.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw secret, for building outbound requests only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn masked(&self) -> String {
        mask_token(&self.0)
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiToken").field(&self.masked()).finish()
    }
}

impl fmt::Display for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}
