//! Scope formatting for the QuickBooks consent page.

// self
use crate::_prelude::*;

/// Namespace prefixed to the scope parameter sent to the consent page.
pub const SCOPE_NAMESPACE: &str = "com.intuit.quickbooks.";

/// Scope list parsed from comma-separated short names (`"accounting, payment"`).
///
/// Entries are trimmed and empty entries are dropped; order is preserved. Rendering joins the
/// entries with single spaces and prefixes the whole string once with [`SCOPE_NAMESPACE`], so
/// `"accounting, payment"` becomes `com.intuit.quickbooks.accounting payment`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ScopeList(Vec<String>);
impl ScopeList {
	/// Parses a comma-separated scope list.
	pub fn parse(raw: &str) -> Self {
		Self(
			raw.split(',')
				.map(str::trim)
				.filter(|scope| !scope.is_empty())
				.map(str::to_owned)
				.collect(),
		)
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterator over the short scope names.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}

	/// Renders the provider-namespaced scope parameter.
	pub fn to_provider_scope(&self) -> String {
		format!("{SCOPE_NAMESPACE}{}", self.0.join(" "))
	}
}
impl Display for ScopeList {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.to_provider_scope())
	}
}
impl From<&str> for ScopeList {
	fn from(raw: &str) -> Self {
		Self::parse(raw)
	}
}
