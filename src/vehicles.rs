//! Vehicle search: type-ahead suggestions and query resolution over VINs.

use serde::Serialize;

/// Maximum number of suggestions returned for one query.
pub const MAX_SUGGESTIONS: usize = 20;

/// Outcome of resolving a search query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "vin", rename_all = "lowercase")]
pub enum SearchHit {
    /// The query equals a known VIN
    Exact(String),
    /// First known VIN containing the query, case-insensitively
    Partial(String),
    /// No match; the trimmed query is passed through as-is
    Unmatched(String),
}

impl SearchHit {
    pub fn vin(&self) -> &str {
        match self {
            SearchHit::Exact(v) | SearchHit::Partial(v) | SearchHit::Unmatched(v) => v,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, SearchHit::Unmatched(_))
    }
}

/// Ordered list of known vehicle identifiers.
#[derive(Debug, Clone, Default)]
pub struct VehicleIndex {
    vins: Vec<String>,
    lowered: Vec<String>,
}

impl VehicleIndex {
    pub fn new<I, S>(vins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let vins: Vec<String> = vins.into_iter().map(Into::into).collect();
        let lowered = vins.iter().map(|v| v.to_lowercase()).collect();
        Self { vins, lowered }
    }

    pub fn len(&self) -> usize {
        self.vins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vins.is_empty()
    }

    /// First entry, used as the initial selection.
    pub fn first(&self) -> Option<&str> {
        self.vins.first().map(String::as_str)
    }

    /// Up to [`MAX_SUGGESTIONS`] VINs containing `query` (case-insensitive).
    /// A blank query lists the first entries.
    pub fn suggestions(&self, query: &str) -> Vec<&str> {
        let q = query.trim().to_lowercase();
        self.vins
            .iter()
            .zip(&self.lowered)
            .filter(|(_, lower)| q.is_empty() || lower.contains(&q))
            .map(|(vin, _)| vin.as_str())
            .take(MAX_SUGGESTIONS)
            .collect()
    }

    /// Resolve a submitted query. Blank queries resolve to nothing.
    pub fn resolve(&self, query: &str) -> Option<SearchHit> {
        let q = query.trim();
        if q.is_empty() {
            return None;
        }
        if let Some(vin) = self.vins.iter().find(|v| v.as_str() == q) {
            return Some(SearchHit::Exact(vin.clone()));
        }
        let lower = q.to_lowercase();
        let partial = self
            .vins
            .iter()
            .zip(&self.lowered)
            .find(|(_, l)| l.contains(&lower))
            .map(|(vin, _)| SearchHit::Partial(vin.clone()));
        Some(partial.unwrap_or_else(|| SearchHit::Unmatched(q.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> VehicleIndex {
        VehicleIndex::new(["KMHXX00XXXX000001", "KMHXX00XXXX000002", "WDB1234567ABC0003"])
    }

    #[test]
    fn exact_match_wins() {
        assert_eq!(
            index().resolve("  KMHXX00XXXX000002 "),
            Some(SearchHit::Exact("KMHXX00XXXX000002".into()))
        );
    }

    #[test]
    fn partial_match_is_case_insensitive_and_first() {
        let hit = index().resolve("kmhxx").unwrap();
        assert_eq!(hit, SearchHit::Partial("KMHXX00XXXX000001".into()));
        assert!(hit.is_known());
        assert_eq!(index().resolve("abc").unwrap().vin(), "WDB1234567ABC0003");
    }

    #[test]
    fn unknown_query_passes_through_trimmed() {
        let hit = index().resolve(" ZZZ9 ").unwrap();
        assert_eq!(hit, SearchHit::Unmatched("ZZZ9".into()));
        assert!(!hit.is_known());
    }

    #[test]
    fn blank_query_resolves_to_none() {
        assert_eq!(index().resolve("   "), None);
    }

    #[test]
    fn suggestions_filter_and_cap() {
        assert_eq!(index().suggestions("000"), vec![
            "KMHXX00XXXX000001",
            "KMHXX00XXXX000002",
            "WDB1234567ABC0003"
        ]);
        assert_eq!(index().suggestions("wdb"), vec!["WDB1234567ABC0003"]);

        let many = VehicleIndex::new((0..50).map(|i| format!("VIN{i:04}")));
        assert_eq!(many.suggestions("").len(), MAX_SUGGESTIONS);
        assert_eq!(many.suggestions("vin00").len(), MAX_SUGGESTIONS);
        assert_eq!(many.suggestions("vin004").len(), 10);
    }
}
