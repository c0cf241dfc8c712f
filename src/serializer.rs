//! Canonical token encoding for job step sequences
//!
//! A token is the compact JSON form of a step list, base64url encoded without
//! padding, so it only ever contains `A-Z a-z 0-9 - _` and can be used as a
//! single URL path segment without escaping.
//!
//! Decoding treats its input as hostile:
//! - the token length is checked before anything proportional to it is
//!   allocated
//! - unknown fields, wrong shapes and trailing data are rejected
//! - the decoded steps must re-encode to exactly the input token, so each
//!   step sequence has one and only one accepted token
//! - step count and argument nesting are capped by [`DecodeLimits`]

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use thiserror::Error;

use crate::job::Step;

pub const DEFAULT_MAX_TOKEN_BYTES: usize = 2048;
pub const DEFAULT_MAX_STEPS: usize = 32;
pub const DEFAULT_MAX_ARG_DEPTH: usize = 8;

/// Largest accepted `max_arg_depth`. Tokens within it stay below the
/// nesting serde_json itself refuses, so depth is always reported as
/// [`DecodeError::ArgsTooDeep`].
pub const MAX_ARG_DEPTH_LIMIT: usize = 56;

/// Brackets around the args of a step: list, step, fields, args list
const STEP_NESTING: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("token is {len} bytes, limit is {max}")]
    TokenTooLong { len: usize, max: usize },

    #[error("token is not valid base64url")]
    InvalidEncoding,

    #[error("token payload is malformed: {0}")]
    Malformed(String),

    #[error("token is not in canonical form")]
    NonCanonical,

    #[error("token contains no steps")]
    EmptyJob,

    #[error("step {index} cannot appear at that position")]
    InvalidSequence { index: usize },

    #[error("token has {count} steps, limit is {max}")]
    TooManySteps { count: usize, max: usize },

    #[error("arguments nest deeper than {max} levels")]
    ArgsTooDeep { max: usize },
}

impl DecodeError {
    /// Whether the token was rejected for its cost rather than its shape
    pub fn is_abusive(&self) -> bool {
        matches!(
            self,
            DecodeError::TokenTooLong { .. }
                | DecodeError::TooManySteps { .. }
                | DecodeError::ArgsTooDeep { .. }
        )
    }
}

/// Upper bounds applied while decoding untrusted tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    pub max_token_bytes: usize,
    pub max_steps: usize,
    pub max_arg_depth: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_token_bytes: DEFAULT_MAX_TOKEN_BYTES,
            max_steps: DEFAULT_MAX_STEPS,
            max_arg_depth: DEFAULT_MAX_ARG_DEPTH,
        }
    }
}

/// Encode a step sequence into its canonical token
pub fn encode(steps: &[Step]) -> String {
    // Steps hold only strings, integers, booleans, string-keyed maps and
    // floats rendered as text, none of which can fail to serialize.
    let json = serde_json::to_vec(steps).expect("step sequences always serialize");
    URL_SAFE_NO_PAD.encode(json)
}

/// Decode a token produced by [`encode`]
pub fn decode(token: &str, limits: &DecodeLimits) -> Result<Vec<Step>, DecodeError> {
    if token.len() > limits.max_token_bytes {
        return Err(DecodeError::TokenTooLong {
            len: token.len(),
            max: limits.max_token_bytes,
        });
    }

    let json = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| DecodeError::InvalidEncoding)?;

    if json_nesting_exceeds(&json, max_json_nesting(limits.max_arg_depth)) {
        return Err(DecodeError::ArgsTooDeep {
            max: limits.max_arg_depth,
        });
    }

    let steps: Vec<Step> =
        serde_json::from_slice(&json).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    validate(&steps, limits)?;

    if encode(&steps) != token {
        return Err(DecodeError::NonCanonical);
    }

    Ok(steps)
}

/// Deepest JSON nesting an encoding within `max_arg_depth` can reach.
///
/// A map argument takes two levels (variant object and map) and a scalar
/// one, so depth `d` needs at most `2 * d` levels inside a step.
fn max_json_nesting(max_arg_depth: usize) -> usize {
    STEP_NESTING + 2 * max_arg_depth.min(MAX_ARG_DEPTH_LIMIT)
}

/// Whether brackets outside string literals nest deeper than `max`.
/// Runs before parsing so overly deep input never reaches serde_json.
fn json_nesting_exceeds(json: &[u8], max: usize) -> bool {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for &byte in json {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                if depth > max {
                    return true;
                }
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    false
}

/// Check structural invariants and cost limits of a step sequence
pub fn validate(steps: &[Step], limits: &DecodeLimits) -> Result<(), DecodeError> {
    if steps.len() > limits.max_steps {
        return Err(DecodeError::TooManySteps {
            count: steps.len(),
            max: limits.max_steps,
        });
    }

    let (head, rest) = steps.split_first().ok_or(DecodeError::EmptyJob)?;
    if !head.is_source() {
        return Err(DecodeError::InvalidSequence { index: 0 });
    }
    if let Some(offset) = rest.iter().position(Step::is_source) {
        return Err(DecodeError::InvalidSequence { index: offset + 1 });
    }

    let too_deep = steps
        .iter()
        .flat_map(Step::args)
        .any(|arg| arg.depth() > limits.max_arg_depth);
    if too_deep {
        return Err(DecodeError::ArgsTooDeep {
            max: limits.max_arg_depth,
        });
    }

    Ok(())
}
