use sage_reply::clip_chars;

/// Maximum characters for plain reply content (2000 is the platform limit;
/// 1900 leaves headroom for action notes).
pub const CONTENT_MAX: usize = 1900;

/// Clip reply text to fit the platform's content limit.
pub fn clip_content(text: &str) -> String {
    clip_chars(text, CONTENT_MAX)
}
