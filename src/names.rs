//! Short-name allocation.
//!
//! Names are drawn from a bijective base-26 counter over `a..z`:
//! `a, b, ..., z, aa, ab, ..., az, ba, ..., zz, aaa, ...`. Each issued name
//! is appended to an append-only history, and the next name is always the
//! successor of the last history entry, so the sequence is strictly
//! increasing (shorter first, then lexicographic) and can never repeat.
//!
//! Candidates that collide with a reserved word still take their slot in the
//! history but are never handed out; allocation moves on to the successor.

use crate::ts::python::{BUILTINS, KEYWORDS, SOFT_KEYWORDS};
use std::collections::HashSet;
use tracing::trace;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const FIRST: u8 = ALPHABET[0];
const LAST: u8 = ALPHABET[ALPHABET.len() - 1];

/// Successor of `name` in the base-26 sequence.
///
/// The last letter is advanced; a `z` wraps to `a` and carries into the
/// preceding letter. A carry out of the first letter prepends one `a`.
/// Names containing characters outside `a..z` restart the sequence at `a`.
pub fn successor(name: &str) -> String {
    let mut letters = name.as_bytes().to_vec();
    if letters.is_empty() || !letters.iter().all(u8::is_ascii_lowercase) {
        return (FIRST as char).to_string();
    }

    let mut pos = letters.len();
    loop {
        if pos == 0 {
            letters.insert(0, FIRST);
            break;
        }
        pos -= 1;
        if letters[pos] == LAST {
            letters[pos] = FIRST;
        } else {
            letters[pos] += 1;
            break;
        }
    }

    // Only ASCII lowercase bytes were written above.
    letters.into_iter().map(char::from).collect()
}

/// Process-wide allocator state: the append-only history of issued slots
/// plus the set of names that must never be handed out.
#[derive(Debug, Clone, Default)]
pub struct NameAllocator {
    history: Vec<String>,
    issued: HashSet<String>,
    reserved: HashSet<String>,
}

impl NameAllocator {
    /// A bare counter with no reserved words.
    pub fn new() -> Self {
        Self::default()
    }

    /// A counter that never hands out Python keywords, soft keywords or builtins.
    pub fn for_python() -> Self {
        let mut allocator = Self::new();
        allocator.reserve(
            KEYWORDS
                .iter()
                .chain(SOFT_KEYWORDS)
                .chain(BUILTINS)
                .map(|s| s.to_string()),
        );
        allocator
    }

    /// Add names that must never be issued.
    pub fn reserve<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved.extend(names.into_iter().map(Into::into));
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains(name)
    }

    /// Whether `name` was handed out by this allocator.
    pub fn is_issued(&self, name: &str) -> bool {
        self.issued.contains(name)
    }

    /// Every slot taken so far, including discarded reserved candidates.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Number of names actually handed out.
    pub fn issued_count(&self) -> usize {
        self.issued.len()
    }

    /// Issue the next name. Never returns a name issued before, nor a reserved one.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> String {
        loop {
            let candidate = match self.history.last() {
                Some(last) => successor(last),
                None => (FIRST as char).to_string(),
            };
            self.history.push(candidate.clone());

            if self.reserved.contains(&candidate) {
                trace!(name = %candidate, "skipping reserved name");
                continue;
            }

            self.issued.insert(candidate.clone());
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successor_advances_last_letter() {
        assert_eq!(successor("a"), "b");
        assert_eq!(successor("ab"), "ac");
    }

    #[test]
    fn successor_carries() {
        assert_eq!(successor("z"), "aa");
        assert_eq!(successor("az"), "ba");
        assert_eq!(successor("zz"), "aaa");
        assert_eq!(successor("azz"), "baa");
        assert_eq!(successor("zzz"), "aaaa");
    }

    #[test]
    fn successor_restarts_on_foreign_input() {
        assert_eq!(successor(""), "a");
        assert_eq!(successor("A1"), "a");
    }

    #[test]
    fn first_twenty_eight_names() {
        let mut names = NameAllocator::new();
        let issued: Vec<String> = (0..28).map(|_| names.next()).collect();

        let alphabet: Vec<String> = ('a'..='z').map(|c| c.to_string()).collect();
        assert_eq!(&issued[..26], alphabet.as_slice());
        assert_eq!(issued[26], "aa");
        assert_eq!(issued[27], "ab");
    }

    #[test]
    fn reserved_names_take_a_slot_but_are_never_issued() {
        let mut names = NameAllocator::new();
        names.reserve(["b"]);

        assert_eq!(names.next(), "a");
        assert_eq!(names.next(), "c");
        assert_eq!(names.history(), ["a", "b", "c"]);
        assert!(!names.is_issued("b"));
        assert_eq!(names.issued_count(), 2);
    }

    #[test]
    fn python_allocator_skips_keywords() {
        let mut names = NameAllocator::for_python();
        let issued: Vec<String> = (0..26 * 27).map(|_| names.next()).collect();

        assert!(!issued.iter().any(|n| n == "as" || n == "if" || n == "id" || n == "in"));
        assert!(issued.iter().any(|n| n == "ar"));
        assert!(issued.iter().any(|n| n == "at"));
    }

    #[test]
    fn consecutive_reserved_names_are_all_skipped() {
        let mut names = NameAllocator::new();
        names.reserve(["a", "b", "c"]);
        assert_eq!(names.next(), "d");
    }
}
