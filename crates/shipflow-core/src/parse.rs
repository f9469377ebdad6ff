//! Resource-rate string tokenizer.
//!
//! Part configuration declares rates as a comma separated list of
//! `ResourceName@rate` tokens, e.g. `ElectricCharge@0.5,Oxygen@0.01`.
//!
//! Parsing is lenient: a token with the wrong arity, an unknown resource,
//! an unparseable rate or a rate that is not strictly positive is dropped and
//! the remaining tokens are kept in declaration order. Callers that want to
//! report the dropped tokens pass a sink to [`parse_resource_rates_with`].

use crate::library::ResourceLookup;
use serde::{Deserialize, Serialize};

/// A `(resource, rate)` pair, in units per second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRate {
    pub resource: String,
    pub rate: f64,
}

impl ResourceRate {
    pub fn new(resource: impl Into<String>, rate: f64) -> Self {
        Self {
            resource: resource.into(),
            rate,
        }
    }
}

/// Why a token was dropped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RateTokenError {
    #[error("token '{token}' must have the form Resource@rate")]
    Arity { token: String },
    #[error("unknown resource '{name}'")]
    UnknownResource { name: String },
    #[error("rate '{value}' for {name} is not a number")]
    InvalidRate { name: String, value: String },
    #[error("rate {rate} for {name} must be finite and positive")]
    NonPositiveRate { name: String, rate: f64 },
}

/// Parse a rate string, silently dropping malformed tokens.
pub fn parse_resource_rates(input: &str, lookup: &impl ResourceLookup) -> Vec<ResourceRate> {
    parse_resource_rates_with(input, lookup, &mut |_| {})
}

/// Parse a rate string, reporting every dropped token to `sink`.
///
/// Returns exactly what [`parse_resource_rates`] returns for the same input.
pub fn parse_resource_rates_with(
    input: &str,
    lookup: &impl ResourceLookup,
    sink: &mut dyn FnMut(RateTokenError),
) -> Vec<ResourceRate> {
    let mut rates = Vec::new();
    for token in tokenize(input, ',') {
        match parse_token(token, lookup) {
            Ok(rate) => rates.push(rate),
            Err(err) => sink(err),
        }
    }
    rates
}

fn tokenize(input: &str, separator: char) -> impl Iterator<Item = &str> {
    input
        .split(separator)
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn parse_token(token: &str, lookup: &impl ResourceLookup) -> Result<ResourceRate, RateTokenError> {
    let fields: Vec<&str> = tokenize(token, '@').collect();
    let [name, value] = fields.as_slice() else {
        return Err(RateTokenError::Arity {
            token: token.to_string(),
        });
    };

    if !lookup.contains(name) {
        return Err(RateTokenError::UnknownResource {
            name: name.to_string(),
        });
    }

    let rate: f64 = value.parse().map_err(|_| RateTokenError::InvalidRate {
        name: name.to_string(),
        value: value.to_string(),
    })?;

    if !rate.is_finite() || rate < f64::EPSILON {
        return Err(RateTokenError::NonPositiveRate {
            name: name.to_string(),
            rate,
        });
    }

    Ok(ResourceRate::new(*name, rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::ResourceLibrary;

    fn library() -> ResourceLibrary {
        ResourceLibrary::from_names(["ElectricCharge", "Oxygen", "Water"]).unwrap()
    }

    #[test]
    fn parses_valid_tokens_in_order() {
        let rates = parse_resource_rates("ElectricCharge@0.5,Oxygen@0.01", &library());
        assert_eq!(
            rates,
            vec![
                ResourceRate::new("ElectricCharge", 0.5),
                ResourceRate::new("Oxygen", 0.01),
            ]
        );
    }

    #[test]
    fn lenient_parse_drops_bad_tokens() {
        let rates = parse_resource_rates("ElectricCharge@0.5,Bogus@abc,Oxygen@-1", &library());
        assert_eq!(rates, vec![ResourceRate::new("ElectricCharge", 0.5)]);
    }

    #[test]
    fn sink_receives_each_dropped_token() {
        let mut dropped = Vec::new();
        let rates = parse_resource_rates_with(
            "ElectricCharge@0.5,Bogus@abc,Oxygen@-1,Water,Water@x,Oxygen@1@2",
            &library(),
            &mut |e| dropped.push(e),
        );
        assert_eq!(rates.len(), 1);
        assert_eq!(
            dropped,
            vec![
                RateTokenError::UnknownResource {
                    name: "Bogus".into()
                },
                RateTokenError::NonPositiveRate {
                    name: "Oxygen".into(),
                    rate: -1.0
                },
                RateTokenError::Arity {
                    token: "Water".into()
                },
                RateTokenError::InvalidRate {
                    name: "Water".into(),
                    value: "x".into()
                },
                RateTokenError::Arity {
                    token: "Oxygen@1@2".into()
                },
            ]
        );
    }

    #[test]
    fn whitespace_and_empty_tokens_are_ignored() {
        let mut dropped = 0;
        let rates = parse_resource_rates_with(
            " ElectricCharge @ 2 ,, ,Water@1,",
            &library(),
            &mut |_| dropped += 1,
        );
        assert_eq!(
            rates,
            vec![
                ResourceRate::new("ElectricCharge", 2.0),
                ResourceRate::new("Water", 1.0),
            ]
        );
        assert_eq!(dropped, 0);
    }

    #[test]
    fn zero_and_non_finite_rates_are_dropped() {
        let rates = parse_resource_rates("Water@0,Water@inf,Water@NaN,Oxygen@1e-20", &library());
        assert!(rates.is_empty(), "got: {rates:?}");
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(parse_resource_rates("", &library()).is_empty());
    }

    #[test]
    fn parsing_twice_is_identical() {
        let input = "Water@3,ElectricCharge@0.25,Nope@1";
        let lib = library();
        assert_eq!(
            parse_resource_rates(input, &lib),
            parse_resource_rates(input, &lib)
        );
    }

    #[test]
    fn error_messages_name_the_resource() {
        let err = RateTokenError::NonPositiveRate {
            name: "Oxygen".into(),
            rate: -1.0,
        };
        assert!(err.to_string().contains("Oxygen"));
    }
}
