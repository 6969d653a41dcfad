// SteamID64 validation

const STEAM_ID64_PREFIX: &str = "7656";
const STEAM_ID64_LEN: usize = 17;

/// A SteamID64 is exactly 17 decimal digits starting with "7656".
///
/// The candidate is taken as-is: no trimming, no normalization.
pub fn is_valid_steam_id(candidate: &str) -> bool {
    candidate.len() == STEAM_ID64_LEN
        && candidate.starts_with(STEAM_ID64_PREFIX)
        && candidate.bytes().all(|b| b.is_ascii_digit())
}
