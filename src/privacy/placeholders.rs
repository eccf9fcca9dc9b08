// Placeholder Engine
// Detects sensitive spans by category and swaps them for reversible tokens

use regex::Regex;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Redaction categories supported by the engine. String names are only
/// accepted at the configuration boundary; everything past that point works
/// with this closed enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Email,
    Phone,
    Address,
    Gps,
    Card,
    Id,
    Name,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Email => "EMAIL",
            Category::Phone => "PHONE",
            Category::Address => "ADDRESS",
            Category::Gps => "GPS",
            Category::Card => "CARD",
            Category::Id => "ID",
            Category::Name => "NAME",
        }
    }

    pub fn parse(name: &str) -> Option<Category> {
        match name {
            "EMAIL" => Some(Category::Email),
            "PHONE" => Some(Category::Phone),
            "ADDRESS" => Some(Category::Address),
            "GPS" => Some(Category::Gps),
            "CARD" => Some(Category::Card),
            "ID" => Some(Category::Id),
            "NAME" => Some(Category::Name),
            _ => None,
        }
    }

    /// Parse a caller-supplied category list, silently dropping unknown names.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Vec<Category> {
        names
            .iter()
            .filter_map(|n| Category::parse(n.as_ref()))
            .collect()
    }

    pub fn all() -> Vec<Category> {
        vec![
            Category::Email,
            Category::Phone,
            Category::Address,
            Category::Gps,
            Category::Card,
            Category::Id,
            Category::Name,
        ]
    }
}

/// Ordered mapping from placeholder token to the original matched span.
/// Tokens are unique within a single redaction pass and keep their insertion
/// order; the map serializes as a JSON object in that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceholderMap {
    entries: Vec<(String, String)>,
}

impl PlaceholderMap {
    pub fn insert(&mut self, token: String, original: String) {
        self.entries.push((token, original));
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, o)| o.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(t, o)| (t.as_str(), o.as_str()))
    }

    /// Token keys in insertion order. Safe to persist; never includes the
    /// original values.
    pub fn tokens(&self) -> Vec<String> {
        self.entries.iter().map(|(t, _)| t.clone()).collect()
    }
}

impl Serialize for PlaceholderMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (token, original) in &self.entries {
            map.serialize_entry(token, original)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PlaceholderMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MapVisitor;

        impl<'de> Visitor<'de> for MapVisitor {
            type Value = PlaceholderMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of placeholder tokens to original values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((token, original)) = access.next_entry::<String, String>()? {
                    entries.push((token, original));
                }
                Ok(PlaceholderMap { entries })
            }
        }

        deserializer.deserialize_map(MapVisitor)
    }
}

/// Result of a redaction pass. `counts` has one entry per requested category,
/// zero included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionResult {
    pub sanitized_text: String,
    pub placeholder_map: PlaceholderMap,
    pub counts: BTreeMap<Category, usize>,
}

impl RedactionResult {
    /// Categories that substituted at least one span.
    pub fn matched_categories(&self) -> Vec<Category> {
        self.counts
            .iter()
            .filter(|(_, n)| **n > 0)
            .map(|(c, _)| *c)
            .collect()
    }
}

const STREET_SUFFIXES: [&str; 12] = [
    "Road", "Rd", "Street", "St", "Ave", "Avenue", "Boulevard", "Blvd", "Lane", "Ln", "Drive",
    "Dr",
];

/// Pure substitution engine; compile the regexes once and share per process.
pub struct PlaceholderEngine {
    email_regex: Regex,
    phone_regex: Regex,
    address_regex: Regex,
    gps_regex: Regex,
    card_regex: Regex,
    id_regex: Regex,
    // Candidate pair only; the street-suffix exclusion is applied by a
    // bump-along scan since the regex crate has no lookahead.
    name_regex: Regex,
}

impl Default for PlaceholderEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaceholderEngine {
    pub fn new() -> Self {
        Self {
            email_regex: Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap(),

            // Grouped 3-4 digit runs, optional country code
            phone_regex: Regex::new(r"\b(?:\+?\d{1,3}[- ]?)?(?:\d{3,4}[- ]?){2,3}\b").unwrap(),

            // House number + street name words + suffix; trailing punctuation
            // (or end of text) is part of the match
            address_regex: Regex::new(
                r"\b\d+\s+[A-Za-z][A-Za-z\s]+\s(?:Road|Rd|Street|St|Ave|Avenue|Boulevard|Blvd|Lane|Ln|Drive|Dr)(?:[\.;,]|$)",
            )
            .unwrap(),

            // lat,lng with at least 3 decimal digits each
            gps_regex: Regex::new(r"\b-?\d{1,2}\.\d{3,},\s*-?\d{1,3}\.\d{3,}\b").unwrap(),

            // 13-19 digits, optionally grouped by spaces or hyphens
            card_regex: Regex::new(r"\b(?:\d[ -]*?){13,19}\b").unwrap(),

            // NRIC-shaped letter+7 digits+checksum, or SSN-shaped 3-2-4
            id_regex: Regex::new(r"\b(?:[STFG]\d{7}[A-Z]|\d{3}-\d{2}-\d{4})\b").unwrap(),

            name_regex: Regex::new(r"\b([A-Z][a-z]+)\s+([A-Z][a-z]+)\b").unwrap(),
        }
    }

    /// Apply category passes progressively in caller order: a later pass sees
    /// earlier substitutions, so earlier categories win overlapping spans.
    /// Tokens are `[CATEGORY_n]`, n counted from 1 per category per call by
    /// order of first appearance. Empty input is a valid outcome, not an
    /// error.
    pub fn detect_and_substitute(&self, text: &str, categories: &[Category]) -> RedactionResult {
        let mut counts: BTreeMap<Category, usize> =
            categories.iter().map(|c| (*c, 0)).collect();
        let mut placeholder_map = PlaceholderMap::default();
        let mut sanitized = text.to_string();

        for &category in categories {
            sanitized = match category {
                Category::Name => {
                    self.substitute_names(&sanitized, &mut placeholder_map, &mut counts)
                }
                _ => self.substitute_pass(
                    &sanitized,
                    category,
                    &mut placeholder_map,
                    &mut counts,
                ),
            };
        }

        RedactionResult {
            sanitized_text: sanitized,
            placeholder_map,
            counts,
        }
    }

    /// Reinsert originals for every token in the map. Tokens are replaced in
    /// descending token-string length so that no token is partially consumed
    /// by a shorter one sharing its prefix.
    pub fn reinsert(&self, text: &str, placeholder_map: &PlaceholderMap) -> String {
        let mut items: Vec<(&str, &str)> = placeholder_map.iter().collect();
        items.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        let mut result = text.to_string();
        for (token, original) in items {
            result = result.replace(token, original);
        }
        result
    }

    fn regex_for(&self, category: Category) -> &Regex {
        match category {
            Category::Email => &self.email_regex,
            Category::Phone => &self.phone_regex,
            Category::Address => &self.address_regex,
            Category::Gps => &self.gps_regex,
            Category::Card => &self.card_regex,
            Category::Id => &self.id_regex,
            Category::Name => &self.name_regex,
        }
    }

    fn substitute_pass(
        &self,
        text: &str,
        category: Category,
        placeholder_map: &mut PlaceholderMap,
        counts: &mut BTreeMap<Category, usize>,
    ) -> String {
        let regex = self.regex_for(category);
        let mut out = String::with_capacity(text.len());
        let mut last = 0;

        for m in regex.find_iter(text) {
            out.push_str(&text[last..m.start()]);
            let token = mint_token(category, counts);
            placeholder_map.insert(token.clone(), m.as_str().to_string());
            out.push_str(&token);
            last = m.end();
        }
        out.push_str(&text[last..]);
        out
    }

    // Two consecutive capitalized words where the second is not a street
    // suffix. A rejected candidate resumes one byte past its start so a
    // trailing pair like "Road Smith" is still considered.
    fn substitute_names(
        &self,
        text: &str,
        placeholder_map: &mut PlaceholderMap,
        counts: &mut BTreeMap<Category, usize>,
    ) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        let mut at = 0;

        while at <= text.len() {
            let caps = match self.name_regex.captures_at(text, at) {
                Some(c) => c,
                None => break,
            };
            let whole = caps.get(0).unwrap();
            let first = caps.get(1).unwrap();
            let second = caps.get(2).unwrap();

            if STREET_SUFFIXES.contains(&second.as_str()) {
                at = first.start() + 1;
                continue;
            }

            out.push_str(&text[last..whole.start()]);
            let token = mint_token(Category::Name, counts);
            placeholder_map.insert(token.clone(), whole.as_str().to_string());
            out.push_str(&token);
            last = whole.end();
            at = whole.end();
        }
        out.push_str(&text[last..]);
        out
    }
}

fn mint_token(category: Category, counts: &mut BTreeMap<Category, usize>) -> String {
    let n = counts.entry(category).or_insert(0);
    *n += 1;
    format!("[{}_{}]", category.label(), n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_four() -> Vec<Category> {
        vec![
            Category::Email,
            Category::Name,
            Category::Phone,
            Category::Address,
        ]
    }

    #[test]
    fn test_example_submission() {
        let engine = PlaceholderEngine::new();
        let text =
            "Email a@b.com and a@b.com again; John Tan called 9123-4567; ship to 123 Tampines Road.";
        let result = engine.detect_and_substitute(text, &all_four());

        assert!(result.sanitized_text.contains("[EMAIL_1]"));
        assert!(result.sanitized_text.contains("[EMAIL_2]"));
        assert!(result.sanitized_text.contains("[NAME_1]"));
        assert!(result.sanitized_text.contains("[PHONE_1]"));
        assert!(result.sanitized_text.contains("[ADDRESS_1]"));
        assert!(!result.sanitized_text.contains("a@b.com"));
        assert!(!result.sanitized_text.contains("John Tan"));

        assert_eq!(result.counts[&Category::Email], 2);
        assert_eq!(result.counts[&Category::Name], 1);
        assert_eq!(result.counts[&Category::Phone], 1);
        assert_eq!(result.counts[&Category::Address], 1);

        let restored = engine.reinsert(&result.sanitized_text, &result.placeholder_map);
        assert_eq!(restored, text);
    }

    #[test]
    fn test_round_trip_mixed_categories() {
        let engine = PlaceholderEngine::new();
        let text = "Meet at 1.3521, 103.8198, card 4111 1111 1111 1111, id S1234567D or 123-45-6789.";
        let categories = vec![Category::Gps, Category::Card, Category::Id];
        let result = engine.detect_and_substitute(text, &categories);

        assert_eq!(result.counts[&Category::Gps], 1);
        assert_eq!(result.counts[&Category::Card], 1);
        assert_eq!(result.counts[&Category::Id], 2);

        let restored = engine.reinsert(&result.sanitized_text, &result.placeholder_map);
        assert_eq!(restored, text);
    }

    #[test]
    fn test_deterministic_token_assignment() {
        let engine = PlaceholderEngine::new();
        let text = "Reach x@y.com or z@w.org, or call 555-123-4567.";
        let categories = vec![Category::Email, Category::Phone];

        let first = engine.detect_and_substitute(text, &categories);
        let second = engine.detect_and_substitute(text, &categories);

        assert_eq!(first.sanitized_text, second.sanitized_text);
        assert_eq!(first.placeholder_map, second.placeholder_map);
        assert_eq!(first.counts, second.counts);
    }

    #[test]
    fn test_no_partial_collision_with_literal_token_text() {
        let engine = PlaceholderEngine::new();
        // Ten real names push the token ordinals to [NAME_10]; the literal
        // substring NAME_10 in the input must survive the round trip.
        let text = "Alice Smith, Bob Jones, Carol White, David Brown, Emma Davis, \
                    Frank Miller, Grace Wilson, Henry Moore, Irene Taylor, Jack Anderson \
                    wrote NAME_10 on the whiteboard.";
        let result = engine.detect_and_substitute(text, &[Category::Name]);

        assert_eq!(result.counts[&Category::Name], 10);
        assert!(result.sanitized_text.contains("[NAME_10]"));
        assert!(result.sanitized_text.contains("wrote NAME_10 on"));

        let restored = engine.reinsert(&result.sanitized_text, &result.placeholder_map);
        assert_eq!(restored, text);
        assert!(restored.contains("wrote NAME_10 on"));
    }

    #[test]
    fn test_reinsert_longest_token_first() {
        let engine = PlaceholderEngine::new();
        let mut map = PlaceholderMap::default();
        map.insert("[NAME_1]".to_string(), "Ada Lovelace".to_string());
        map.insert("[NAME_10]".to_string(), "Grace Hopper".to_string());

        let restored = engine.reinsert("[NAME_10] met [NAME_1]", &map);
        assert_eq!(restored, "Grace Hopper met Ada Lovelace");
    }

    #[test]
    fn test_name_pass_skips_street_fragments() {
        let engine = PlaceholderEngine::new();
        let result =
            engine.detect_and_substitute("Alice Road Smith lives on Tampines Road", &[Category::Name]);

        // "Alice Road" is rejected; the scan resumes and takes "Road Smith",
        // matching the reference lookahead behavior.
        assert_eq!(result.counts[&Category::Name], 1);
        assert_eq!(result.placeholder_map.get("[NAME_1]"), Some("Road Smith"));
        assert!(result.sanitized_text.contains("Tampines Road"));
    }

    #[test]
    fn test_category_order_decides_overlaps() {
        let engine = PlaceholderEngine::new();
        let text = "ship to 45 Orchard Road.";

        // ADDRESS first consumes the span before NAME can see it
        let addr_first =
            engine.detect_and_substitute(text, &[Category::Address, Category::Name]);
        assert_eq!(addr_first.counts[&Category::Address], 1);
        assert_eq!(addr_first.counts[&Category::Name], 0);

        let restored = engine.reinsert(&addr_first.sanitized_text, &addr_first.placeholder_map);
        assert_eq!(restored, text);
    }

    #[test]
    fn test_unknown_categories_dropped_at_boundary() {
        let names = vec!["EMAIL".to_string(), "SOCIAL".to_string(), "GPS".to_string()];
        let parsed = Category::parse_list(&names);
        assert_eq!(parsed, vec![Category::Email, Category::Gps]);
        assert_eq!(Category::parse("email"), None);
    }

    #[test]
    fn test_empty_input_yields_empty_result() {
        let engine = PlaceholderEngine::new();
        let result = engine.detect_and_substitute("", &Category::all());

        assert_eq!(result.sanitized_text, "");
        assert!(result.placeholder_map.is_empty());
        assert_eq!(result.counts.len(), 7);
        assert!(result.counts.values().all(|n| *n == 0));
    }

    #[test]
    fn test_gps_precision_requirement() {
        let engine = PlaceholderEngine::new();
        let hit = engine.detect_and_substitute("at 1.3521, 103.8198 now", &[Category::Gps]);
        assert_eq!(hit.counts[&Category::Gps], 1);

        // Two decimal digits is below the precision floor
        let miss = engine.detect_and_substitute("at 1.35, 103.81 now", &[Category::Gps]);
        assert_eq!(miss.counts[&Category::Gps], 0);
    }

    #[test]
    fn test_placeholder_map_serializes_in_insertion_order() {
        let engine = PlaceholderEngine::new();
        let result = engine.detect_and_substitute(
            "first a@b.com then c@d.com",
            &[Category::Email],
        );
        let json = serde_json::to_string(&result.placeholder_map).unwrap();
        assert!(json.find("[EMAIL_1]").unwrap() < json.find("[EMAIL_2]").unwrap());

        let parsed: PlaceholderMap = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result.placeholder_map);
    }

    #[test]
    fn test_matched_categories() {
        let engine = PlaceholderEngine::new();
        let result = engine.detect_and_substitute(
            "mail a@b.com",
            &[Category::Email, Category::Phone],
        );
        assert_eq!(result.matched_categories(), vec![Category::Email]);
    }
}
