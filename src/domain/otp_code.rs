use rand::Rng;

// Codes are drawn from [100000, 999999], so they are always six digits and
// never collapse a leading zero.
const OTP_MIN: u32 = 100_000;
const OTP_MAX: u32 = 999_999;

#[derive(Debug, Clone, serde::Serialize)]
pub struct OtpCode(String);

impl OtpCode {
    pub fn generate() -> OtpCode {
        // thread_rng is cryptographically secure; codes must not be predictable
        let mut rng = rand::thread_rng();

        OtpCode(rng.gen_range(OTP_MIN..=OTP_MAX).to_string())
    }

    pub fn parse(code: String) -> Result<OtpCode, String> {
        let is_six_digits = code.len() == 6 && code.chars().all(|char| char.is_ascii_digit());

        if !is_six_digits {
            return Err(format!("{} is not a valid one-time code", code));
        }

        Ok(Self(code))
    }
}

impl AsRef<str> for OtpCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
