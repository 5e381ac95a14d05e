// utils/otp_generator.rs
use rand::Rng;

/// Six digit verification code.
pub fn generate_otp() -> String {
    let mut rng = rand::rng();
    format!("{:06}", rng.random_range(0..1_000_000))
}
