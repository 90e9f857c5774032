/// Ranks links by keyword relevance
///
/// The score is the fraction of configured keywords found in the text
/// (case-insensitive substring match), multiplied by the configured weight.
/// With no keywords every link scores zero, which leaves visiting order to
/// discovery order.
#[derive(Debug, Clone)]
pub struct KeywordRelevanceScorer {
    keywords: Vec<String>,
    weight: f64,
}

impl KeywordRelevanceScorer {
    pub fn new(keywords: &[String], weight: f64) -> Self {
        Self {
            keywords: keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            weight,
        }
    }

    /// Scores a URL (or any text describing a link)
    pub fn score(&self, text: &str) -> f64 {
        if self.keywords.is_empty() {
            return 0.0;
        }

        let haystack = text.to_lowercase();
        let matched = self
            .keywords
            .iter()
            .filter(|k| haystack.contains(k.as_str()))
            .count();

        (matched as f64 / self.keywords.len() as f64) * self.weight
    }
}

/// One-off scoring without building a scorer
pub fn score(text: &str, keywords: &[String], weight: f64) -> f64 {
    KeywordRelevanceScorer::new(keywords, weight).score(text)
}
