//! Binary-compatibility parity checks between two compiler argument lists.
//!
//! Two translation unit sets that share symbols must agree on language
//! standard, exception model, RTTI, threading model and memory model. A
//! divergence links fine and fails at runtime, so the check compares the
//! effective value of each key on both sides and reports every difference.

mod matcher;
mod result;

pub use matcher::{KeyError, MatchKind, ParityKey, ParityKeySet};
pub use result::{CheckedKey, ParityMismatch, ParityResult, ABSENT};

/// Compare the sketch and library argument lists over `keys`.
///
/// For each key the last matching token on each side is its effective value.
/// A key present on one side and absent on the other is a mismatch.
pub fn check<S: AsRef<str>>(sketch: &[S], library: &[S], keys: &ParityKeySet) -> ParityResult {
    let mut matched = Vec::new();
    let mut mismatches = Vec::new();

    for key in keys.keys() {
        let sketch_value = key.extract(sketch);
        let library_value = key.extract(library);

        if sketch_value == library_value {
            matched.push(CheckedKey {
                key: key.name.clone(),
                value: sketch_value.map(str::to_string),
            });
        } else {
            mismatches.push(ParityMismatch {
                key: key.name.clone(),
                sketch: sketch_value.map(str::to_string),
                library: library_value.map(str::to_string),
            });
        }
    }

    ParityResult {
        consistent: mismatches.is_empty(),
        matched,
        mismatches,
    }
}
