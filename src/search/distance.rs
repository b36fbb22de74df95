//! Edit distance between words.

/// Case-insensitive Levenshtein distance counted in characters.
pub fn distance(a: &str, b: &str) -> usize {
    strsim::levenshtein(&a.to_lowercase(), &b.to_lowercase())
}

/// `(max_len - distance) / max_len`, in `[0, 1]`. Two empty strings score 0.
pub fn similarity(a: &str, b: &str) -> f32 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();

    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 0.0;
    }

    let distance = strsim::levenshtein(&a, &b);
    (max_len - distance) as f32 / max_len as f32
}
