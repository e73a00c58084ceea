/// Truncates `s` to at most `max_len` chars, replacing the tail with an ellipsis
/// when truncation occurred.
pub fn truncate_with_ellipsis(s: impl AsRef<str>, max_len: usize) -> String {
  let s = s.as_ref();
  if s.chars().count() <= max_len {
    return s.to_owned();
  }
  if max_len <= 1 {
    return "…".repeat(max_len);
  }
  let keep = max_len - 1;
  let mut out: String = s.chars().take(keep).collect();
  out.push('…');
  out
}
