//! Chemical formula parsing.
//!
//! Formulas follow the usual notation: `H2O`, `Ca(HCO3)2`, `CaSO4*2H2O`,
//! charge suffixes `CO3--`, `Fe+3`, and an optional state suffix such as
//! `(aq)`, `(g)`, `(l)` or `(s)`.

use crate::error::{ThermoError, ThermoResult};
use std::collections::BTreeMap;

const STATE_SUFFIXES: [&str; 4] = ["(aq)", "(g)", "(l)", "(s)"];

/// Strip the aggregate-state suffix, if any.
fn strip_state(formula: &str) -> &str {
    STATE_SUFFIXES
        .iter()
        .find_map(|s| formula.strip_suffix(s))
        .unwrap_or(formula)
}

/// Split `text` into the neutral body and the charge suffix.
fn split_charge(text: &str) -> (&str, &str) {
    let body_end = text
        .char_indices()
        .find(|&(i, c)| (c == '+' || c == '-') && text[i..].chars().all(|c| c == '+' || c == '-' || c.is_ascii_digit()))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    (&text[..body_end], &text[body_end..])
}

/// Electric charge of a species from its name or formula.
///
/// Accepts repeated signs (`Ca++`, `CO3--`) and sign followed by a count
/// (`Fe+3`, `SO4-2`).
pub fn parse_charge(formula: &str) -> ThermoResult<f64> {
    let (_, suffix) = split_charge(strip_state(formula.trim()));
    if suffix.is_empty() {
        return Ok(0.0);
    }
    let sign = if suffix.starts_with('+') { 1.0 } else { -1.0 };
    let signs = suffix.chars().take_while(|c| *c == '+' || *c == '-').count();
    let digits = &suffix[signs..];
    if suffix[..signs].chars().any(|c| c != suffix.chars().next().unwrap_or('+')) {
        return Err(ThermoError::InvalidArg {
            what: format!("mixed charge signs in '{formula}'"),
        });
    }
    if digits.is_empty() {
        return Ok(sign * signs as f64);
    }
    if signs != 1 {
        return Err(ThermoError::InvalidArg {
            what: format!("ambiguous charge suffix in '{formula}'"),
        });
    }
    let count: f64 = digits.parse().map_err(|_| ThermoError::InvalidArg {
        what: format!("invalid charge count in '{formula}'"),
    })?;
    Ok(sign * count)
}

/// Element composition of a formula.
///
/// Charge and state suffixes are ignored. Parenthesised groups and
/// hydrate separators (`*` or `·`) are supported.
pub fn parse_formula(formula: &str) -> ThermoResult<BTreeMap<String, f64>> {
    let (body, _) = split_charge(strip_state(formula.trim()));
    if body.is_empty() {
        return Err(ThermoError::InvalidArg {
            what: format!("empty formula '{formula}'"),
        });
    }
    let mut elements = BTreeMap::new();
    for part in body.split(['*', '·']) {
        let chars: Vec<char> = part.chars().collect();
        let (factor, start) = read_number(&chars, 0);
        let mut parser = Parser {
            chars: &chars,
            pos: start,
            source: formula,
        };
        let group = parser.group()?;
        if parser.pos != chars.len() {
            return Err(parser.error("unexpected character"));
        }
        for (name, count) in group {
            *elements.entry(name).or_insert(0.0) += count * factor.unwrap_or(1.0);
        }
    }
    Ok(elements)
}

/// Read an unsigned decimal number starting at `pos`.
fn read_number(chars: &[char], pos: usize) -> (Option<f64>, usize) {
    let mut end = pos;
    while end < chars.len() && (chars[end].is_ascii_digit() || chars[end] == '.') {
        end += 1;
    }
    if end == pos {
        return (None, pos);
    }
    let text: String = chars[pos..end].iter().collect();
    (text.parse().ok(), end)
}

struct Parser<'a> {
    chars: &'a [char],
    pos: usize,
    source: &'a str,
}

impl Parser<'_> {
    fn error(&self, what: &str) -> ThermoError {
        ThermoError::InvalidArg {
            what: format!("{what} at position {} in formula '{}'", self.pos, self.source),
        }
    }

    fn group(&mut self) -> ThermoResult<BTreeMap<String, f64>> {
        let mut out = BTreeMap::new();
        while let Some(&c) = self.chars.get(self.pos) {
            let inner = match c {
                '(' | '[' => {
                    let close = if c == '(' { ')' } else { ']' };
                    self.pos += 1;
                    let inner = self.group()?;
                    if self.chars.get(self.pos) != Some(&close) {
                        return Err(self.error("unbalanced bracket"));
                    }
                    self.pos += 1;
                    inner
                }
                c if c.is_ascii_uppercase() => {
                    let mut name = c.to_string();
                    self.pos += 1;
                    while let Some(&l) = self.chars.get(self.pos) {
                        if !l.is_ascii_lowercase() {
                            break;
                        }
                        name.push(l);
                        self.pos += 1;
                    }
                    BTreeMap::from([(name, 1.0)])
                }
                ')' | ']' => break,
                _ => return Err(self.error("unexpected character")),
            };
            let (count, next) = read_number(self.chars, self.pos);
            self.pos = next;
            let count = count.unwrap_or(1.0);
            for (name, n) in inner {
                *out.entry(name).or_insert(0.0) += n * count;
            }
        }
        Ok(out)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn repeated_group_scales_counts(k in 1u32..9, m in 1u32..9) {
            let f = parse_formula(&format!("Ca(CO{m}){k}")).unwrap();
            prop_assert_eq!(f["Ca"], 1.0);
            prop_assert_eq!(f["C"], k as f64);
            prop_assert_eq!(f["O"], (k * m) as f64);
        }
    }
}
