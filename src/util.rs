//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Split a comma-separated query value ("a,b, c") into trimmed, non-empty items.
pub fn split_csv(s: &str) -> Vec<String> {
  s.split(',')
    .map(str::trim)
    .filter(|p| !p.is_empty())
    .map(str::to_string)
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn template_and_csv() {
    assert_eq!(fill_template("第{rank}名", &[("rank", "3")]), "第3名");
    assert_eq!(split_csv(" 日, 月,,水 "), vec!["日", "月", "水"]);
  }
}
