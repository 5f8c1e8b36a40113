use crate::event::DeviceType;

/// Lowercase substrings identifying tablets. Checked before [`MOBILE_TOKENS`]
/// because many tablet UAs also carry a generic "mobile" token.
pub const TABLET_TOKENS: &[&str] = &["tablet", "ipad", "playbook", "silk"];

/// Lowercase substrings identifying phones and other handhelds.
pub const MOBILE_TOKENS: &[&str] = &[
    "mobile",
    "iphone",
    "ipod",
    "android",
    "blackberry",
    "opera mini",
    "iemobile",
];

/// Classify a raw `User-Agent` header into a [`DeviceType`].
///
/// Runs once at ingestion; the result is stored with the event and never
/// recomputed during aggregation. Anything that matches neither token list,
/// including an empty UA, is `Desktop`.
pub fn classify_device(user_agent: &str) -> DeviceType {
    let ua = user_agent.to_lowercase();
    if TABLET_TOKENS.iter().any(|t| ua.contains(t)) {
        DeviceType::Tablet
    } else if MOBILE_TOKENS.iter().any(|t| ua.contains(t)) {
        DeviceType::Mobile
    } else {
        DeviceType::Desktop
    }
}
