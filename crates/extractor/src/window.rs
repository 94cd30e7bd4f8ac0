/// Split `text` into contiguous windows of `size` characters.
///
/// Windows are counted in Unicode scalar values and ignore word boundaries.
/// The final window may be shorter; empty input produces no windows.
pub fn split_windows(text: &str, size: usize) -> Vec<&str> {
    assert!(size > 0, "window size must be > 0");

    let mut windows = Vec::with_capacity(text.len() / size + 1);
    let mut start = 0usize;
    let mut count = 0usize;
    for (idx, _) in text.char_indices() {
        if count == size {
            windows.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        windows.push(&text[start..]);
    }
    windows
}
