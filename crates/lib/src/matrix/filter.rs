use crate::config::Declaration;

/// Returns true if a selector admits `value`.
///
/// An absent or empty selector matches anything.
pub fn selector_matches(selector: Option<&str>, value: &str) -> bool {
  match selector {
    None => true,
    Some(s) if s.is_empty() => true,
    Some(s) => s == value,
  }
}

impl Declaration {
  /// Returns true if every selector this declaration carries admits the matrix point.
  pub fn applies_to(&self, version: &str, os: &str, arch: &str) -> bool {
    selector_matches(self.version.as_deref(), version)
      && selector_matches(self.os.as_deref(), os)
      && selector_matches(self.arch.as_deref(), arch)
  }
}

/// Values of the declarations that apply to (version, os, arch), in declaration order.
pub fn filter_declarations(declarations: &[Declaration], version: &str, os: &str, arch: &str) -> Vec<String> {
  declarations
    .iter()
    .filter(|d| d.applies_to(version, os, arch))
    .map(|d| d.value.clone())
    .collect()
}
