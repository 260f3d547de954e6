use rand::distributions::Alphanumeric;
use rand::Rng;

const USER_ID_PREFIX: &str = "user_";
const USER_ID_SUFFIX_LEN: usize = 9;

/// Generate a pseudo-random local user id such as `user_k3f9a0zq1`.
///
/// Anonymous sessions have no server-issued identity; the id is minted once
/// and persisted with the messaging state.
pub fn generate_user_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    let suffix: String = rng
        .sample_iter(&Alphanumeric)
        .take(USER_ID_SUFFIX_LEN)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect();
    format!("{}{}", USER_ID_PREFIX, suffix)
}

/// Keep a persisted id when there is one, otherwise mint a new one
pub fn resolve_user_id<R: Rng + ?Sized>(persisted: Option<&str>, rng: &mut R) -> String {
    match persisted.map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => generate_user_id(rng),
    }
}
