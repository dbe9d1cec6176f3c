//! Lexical analysis of one operator line into an argument vector.
//!
//! Splitting is destructive in spirit only: the line is never copied, every
//! token is a slice borrowed from it, so an [`Argv`] cannot outlive the line
//! it was produced from.

use std::collections::TryReserveError;
use thiserror::Error;

/// Characters that separate tokens: space, tab, carriage return, newline and bell.
pub const DELIMITERS: [char; 5] = [' ', '\t', '\r', '\n', '\x07'];

const INITIAL_CAPACITY: usize = 64;

/// Errors that can occur during the lexical analysis process.
#[derive(Error, Debug)]
pub enum LexingError {
    /// The token list could not grow.
    #[error("allocation error: {0}")]
    Allocation(#[from] TryReserveError),
}

/// Ordered tokens of one line. The first token is the command name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Argv<'line> {
    tokens: Vec<&'line str>,
}

impl<'line> Argv<'line> {
    /// The command name, or `None` for an empty line.
    pub fn command(&self) -> Option<&'line str> {
        self.tokens.first().copied()
    }

    pub fn as_slice(&self) -> &[&'line str] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingWord(usize), // byte offset where the word began
}

struct LexingFSM<'line> {
    input: &'line str,
    state: LexingState,
    tokens: Vec<&'line str>,
}

impl<'line> LexingFSM<'line> {
    fn new(input: &'line str) -> Result<Self, LexingError> {
        let mut tokens = Vec::new();
        tokens.try_reserve(INITIAL_CAPACITY)?;
        Ok(LexingFSM {
            input,
            state: LexingState::Start,
            tokens,
        })
    }

    /// Walks the line once, cutting a token at every delimiter run.
    fn make_tokens(mut self) -> Result<Argv<'line>, LexingError> {
        for (pos, ch) in self.input.char_indices() {
            match (self.state, is_delimiter(ch)) {
                (LexingState::Start, true) => {}
                (LexingState::Start, false) => self.state = LexingState::ReadingWord(pos),
                (LexingState::ReadingWord(start), true) => {
                    self.push_token(start, pos)?;
                    self.state = LexingState::Start;
                }
                (LexingState::ReadingWord(_), false) => {}
            }
        }

        if let LexingState::ReadingWord(start) = self.state {
            self.push_token(start, self.input.len())?;
        }

        Ok(Argv {
            tokens: self.tokens,
        })
    }

    fn push_token(&mut self, start: usize, end: usize) -> Result<(), LexingError> {
        if self.tokens.len() == self.tokens.capacity() {
            // Grow geometrically, but through the fallible API so exhaustion is
            // reported instead of aborting.
            let additional = self.tokens.capacity().max(INITIAL_CAPACITY);
            self.tokens.try_reserve(additional)?;
        }
        self.tokens.push(&self.input[start..end]);
        Ok(())
    }
}

fn is_delimiter(ch: char) -> bool {
    DELIMITERS.contains(&ch)
}

/// Splits `line` into its non-empty tokens, in order.
///
/// An empty or all-delimiter line yields an empty [`Argv`].
///
/// # Errors
/// [`LexingError::Allocation`] when the token list cannot grow any further.
pub fn split_into_tokens(line: &str) -> Result<Argv<'_>, LexingError> {
    LexingFSM::new(line)?.make_tokens()
}
