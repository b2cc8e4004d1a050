//! Generate instances from patterns such as `"I {like|love} {name}!"`.
//!
//! `{a|b|c}` picks one of the alternatives; `{name}` is replaced by each
//! value bound to `name`. Every combination is one instance.

use std::collections::BTreeMap;

use rand::Rng;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Choice(Vec<String>),
}

/// Parsed pattern with placeholders resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    segments: Vec<Segment>,
}

impl Pattern {
    pub fn parse(pattern: &str, bindings: &BTreeMap<String, Vec<String>>) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = pattern.chars();

        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    let mut inner = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        inner.push(c);
                    }
                    if !closed {
                        return Err(Error::InvalidArgument(format!("unclosed '{{' in pattern {pattern:?}")));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Self::choice(&inner, bindings)?);
                }
                '}' => {
                    return Err(Error::InvalidArgument(format!("unmatched '}}' in pattern {pattern:?}")));
                }
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    fn choice(inner: &str, bindings: &BTreeMap<String, Vec<String>>) -> Result<Segment> {
        if inner.contains('|') {
            return Ok(Segment::Choice(inner.split('|').map(str::to_string).collect()));
        }
        match bindings.get(inner) {
            Some(values) if !values.is_empty() => Ok(Segment::Choice(values.clone())),
            Some(_) => Err(Error::InvalidArgument(format!("no values bound to {{{inner}}}"))),
            None => Err(Error::unknown_identifier("placeholder", inner, bindings.keys().cloned())),
        }
    }

    /// Number of distinct instances the pattern generates.
    pub fn len(&self) -> Result<usize> {
        self.segments.iter().try_fold(1usize, |acc, segment| match segment {
            Segment::Literal(_) => Ok(acc),
            Segment::Choice(options) => acc
                .checked_mul(options.len())
                .ok_or_else(|| Error::InvalidArgument("pattern generates too many instances".to_string())),
        })
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.len(), Ok(0))
    }

    /// The `index`-th combination, last choice varying fastest.
    fn nth(&self, mut index: usize) -> String {
        let mut picks = Vec::with_capacity(self.segments.len());
        for segment in self.segments.iter().rev() {
            match segment {
                Segment::Literal(text) => picks.push(text.as_str()),
                Segment::Choice(options) => {
                    picks.push(options[index % options.len()].as_str());
                    index /= options.len();
                }
            }
        }
        picks.into_iter().rev().collect()
    }

    /// Every combination, or `n_samples` distinct ones drawn at random.
    pub fn generate<R: Rng>(&self, n_samples: Option<usize>, rng: &mut R) -> Result<Vec<String>> {
        let total = self.len()?;
        match n_samples {
            Some(n) if n < total => Ok(rand::seq::index::sample(rng, total, n)
                .into_iter()
                .map(|i| self.nth(i))
                .collect()),
            _ => Ok((0..total).map(|i| self.nth(i)).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn bindings() -> BTreeMap<String, Vec<String>> {
        let mut b = BTreeMap::new();
        b.insert("name".to_string(), vec!["Ann".to_string(), "Bo".to_string(), "Cy".to_string()]);
        b
    }

    #[test]
    fn expands_alternatives_and_placeholders() {
        let pattern = Pattern::parse("I {like|love} {name}!", &bindings()).unwrap();
        assert_eq!(pattern.len().unwrap(), 6);
        let mut rng = StdRng::seed_from_u64(0);
        let all = pattern.generate(None, &mut rng).unwrap();
        assert_eq!(all[0], "I like Ann!");
        assert_eq!(all[1], "I like Bo!");
        assert_eq!(all[5], "I love Cy!");
    }

    #[test]
    fn samples_are_distinct() {
        let pattern = Pattern::parse("{a|b|c}{x|y}", &BTreeMap::new()).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let mut picked = pattern.generate(Some(4), &mut rng).unwrap();
        picked.sort();
        picked.dedup();
        assert_eq!(picked.len(), 4);
    }

    #[test]
    fn literal_only_pattern() {
        let pattern = Pattern::parse("plain text", &BTreeMap::new()).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(pattern.generate(Some(10), &mut rng).unwrap(), vec!["plain text"]);
    }

    #[test]
    fn malformed_patterns() {
        assert!(Pattern::parse("{oops", &BTreeMap::new()).is_err());
        assert!(Pattern::parse("oops}", &BTreeMap::new()).is_err());
        assert!(matches!(
            Pattern::parse("{city}", &bindings()),
            Err(Error::UnknownIdentifier { kind: "placeholder", .. })
        ));
    }
}
