//! Name similarity strategies.
//!
//! Every strategy returns a score in `0.0..=1.0` computed over
//! [`name_key`]-normalized names, so case and spacing never affect a match.
//! The index does not depend on any particular algorithm; it scores through
//! the [`SimilarityStrategy`] trait and the strategy is chosen from
//! configuration.

use std::fmt::Debug;

use crate::config::SimilarityWeights;
use crate::models::name_key;

/// A pluggable name-similarity algorithm.
pub trait SimilarityStrategy: Send + Sync + Debug {
    /// Short name used in logs and audit output.
    fn name(&self) -> &'static str;

    /// Scores two names, `1.0` meaning identical.
    fn score(&self, a: &str, b: &str) -> f64;
}

/// Token-level similarity.
///
/// Each word of one name is paired with its closest word (by Jaro-Winkler)
/// in the other, the pair scores are averaged, and the result is averaged
/// over both directions. Tolerates reordered names ("Smith Jon").
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenSimilarity;

impl SimilarityStrategy for TokenSimilarity {
    fn name(&self) -> &'static str {
        "token"
    }

    fn score(&self, a: &str, b: &str) -> f64 {
        let a = name_key(a);
        let b = name_key(b);
        let a_tokens: Vec<&str> = a.split(' ').filter(|t| !t.is_empty()).collect();
        let b_tokens: Vec<&str> = b.split(' ').filter(|t| !t.is_empty()).collect();
        if a_tokens.is_empty() || b_tokens.is_empty() {
            return 0.0;
        }

        let directed = |from: &[&str], to: &[&str]| {
            from.iter()
                .map(|x| to.iter().map(|y| jaro_winkler(x, y)).fold(0.0, f64::max))
                .sum::<f64>()
                / from.len() as f64
        };

        (directed(&a_tokens, &b_tokens) + directed(&b_tokens, &a_tokens)) / 2.0
    }
}

/// Character-level Jaro-Winkler similarity of the whole name.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharacterSimilarity;

impl SimilarityStrategy for CharacterSimilarity {
    fn name(&self) -> &'static str {
        "character"
    }

    fn score(&self, a: &str, b: &str) -> f64 {
        jaro_winkler(&name_key(a), &name_key(b))
    }
}

/// Phonetic similarity: the share of words whose Soundex codes agree.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhoneticSimilarity;

impl SimilarityStrategy for PhoneticSimilarity {
    fn name(&self) -> &'static str {
        "phonetic"
    }

    fn score(&self, a: &str, b: &str) -> f64 {
        let codes = |name: &str| -> Vec<String> {
            name_key(name)
                .split(' ')
                .map(soundex)
                .filter(|code| !code.is_empty())
                .collect()
        };
        let a_codes = codes(a);
        let b_codes = codes(b);
        if a_codes.is_empty() || b_codes.is_empty() {
            return 0.0;
        }

        let directed = |from: &[String], to: &[String]| {
            from.iter().filter(|code| to.contains(code)).count() as f64 / from.len() as f64
        };

        (directed(&a_codes, &b_codes) + directed(&b_codes, &a_codes)) / 2.0
    }
}

/// Weighted composite of the token, character and phonetic strategies.
///
/// Components with a zero weight are skipped. The result is normalized by
/// the total weight so it stays within `0.0..=1.0`.
#[derive(Debug)]
pub struct WeightedSimilarity {
    components: Vec<(Box<dyn SimilarityStrategy>, f64)>,
}

impl WeightedSimilarity {
    /// Builds the composite from configured weights.
    ///
    /// If every weight is zero or negative, plain character similarity is
    /// used.
    ///
    /// # Example
    ///
    /// ```
    /// use timesheet_engine::config::SimilarityWeights;
    /// use timesheet_engine::identity::{SimilarityStrategy, WeightedSimilarity};
    ///
    /// let strategy = WeightedSimilarity::from_weights(&SimilarityWeights::default());
    /// assert!(strategy.score("Jon Smtih", "Jon Smith") >= 0.95);
    /// assert!(strategy.score("Jon Smith", "Maria Garcia") < 0.70);
    /// ```
    pub fn from_weights(weights: &SimilarityWeights) -> Self {
        let candidates: [(Box<dyn SimilarityStrategy>, f64); 3] = [
            (Box::new(TokenSimilarity), weights.token),
            (Box::new(CharacterSimilarity), weights.character),
            (Box::new(PhoneticSimilarity), weights.phonetic),
        ];

        let mut components: Vec<_> = candidates
            .into_iter()
            .filter(|(_, weight)| weight.is_finite() && *weight > 0.0)
            .collect();
        if components.is_empty() {
            components.push((Box::new(CharacterSimilarity), 1.0));
        }

        Self { components }
    }
}

impl Default for WeightedSimilarity {
    fn default() -> Self {
        Self::from_weights(&SimilarityWeights::default())
    }
}

impl SimilarityStrategy for WeightedSimilarity {
    fn name(&self) -> &'static str {
        "weighted"
    }

    fn score(&self, a: &str, b: &str) -> f64 {
        let total: f64 = self.components.iter().map(|(_, weight)| weight).sum();
        let weighted: f64 = self
            .components
            .iter()
            .map(|(strategy, weight)| strategy.score(a, b) * weight)
            .sum();
        (weighted / total).clamp(0.0, 1.0)
    }
}

/// Jaro-Winkler similarity with the standard 0.1 prefix scale and a
/// four-character prefix cap.
pub fn jaro_winkler(a: &str, b: &str) -> f64 {
    let jaro = jaro(a, b);
    let prefix = a
        .chars()
        .zip(b.chars())
        .take(4)
        .take_while(|(x, y)| x == y)
        .count() as f64;
    jaro + prefix * 0.1 * (1.0 - jaro)
}

fn jaro(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let window = (a.len().max(b.len()) / 2).saturating_sub(1);
    let mut a_matched = vec![false; a.len()];
    let mut b_matched = vec![false; b.len()];
    let mut matches = 0usize;

    for (i, ca) in a.iter().enumerate() {
        let start = i.saturating_sub(window);
        let end = (i + window + 1).min(b.len());
        for j in start..end {
            if !b_matched[j] && b[j] == *ca {
                a_matched[i] = true;
                b_matched[j] = true;
                matches += 1;
                break;
            }
        }
    }

    if matches == 0 {
        return 0.0;
    }

    let a_sequence = a.iter().zip(&a_matched).filter(|(_, m)| **m).map(|(c, _)| c);
    let b_sequence = b.iter().zip(&b_matched).filter(|(_, m)| **m).map(|(c, _)| c);
    let transpositions = a_sequence.zip(b_sequence).filter(|(x, y)| x != y).count() / 2;

    let m = matches as f64;
    (m / a.len() as f64 + m / b.len() as f64 + (m - transpositions as f64) / m) / 3.0
}

/// American Soundex code of a single word, or an empty string if the word
/// has no letters.
///
/// # Example
///
/// ```
/// use timesheet_engine::identity::soundex;
///
/// assert_eq!(soundex("Robert"), "R163");
/// assert_eq!(soundex("Rupert"), "R163");
/// ```
pub fn soundex(word: &str) -> String {
    let letters: Vec<char> = word
        .chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let Some(&first) = letters.first() else {
        return String::new();
    };

    let mut code = String::with_capacity(4);
    code.push(first.to_ascii_uppercase());
    let mut last = soundex_digit(first);

    for &c in &letters[1..] {
        if code.len() == 4 {
            break;
        }
        match c {
            'h' | 'w' => {}
            'a' | 'e' | 'i' | 'o' | 'u' | 'y' => last = None,
            _ => {
                let digit = soundex_digit(c);
                if let Some(d) = digit.filter(|_| digit != last) {
                    code.push(d);
                }
                last = digit;
            }
        }
    }

    while code.len() < 4 {
        code.push('0');
    }
    code
}

fn soundex_digit(c: char) -> Option<char> {
    match c {
        'b' | 'f' | 'p' | 'v' => Some('1'),
        'c' | 'g' | 'j' | 'k' | 'q' | 's' | 'x' | 'z' => Some('2'),
        'd' | 't' => Some('3'),
        'l' => Some('4'),
        'm' | 'n' => Some('5'),
        'r' => Some('6'),
        _ => None,
    }
}
