//! Quiz attempts
//!
//! A [`QuizAttempt`] walks a quiz one question at a time:
//!
//! ```text
//! AwaitingSelection(i) --submit--> Answered(i) --advance--> AwaitingSelection(i + 1)
//!                                               \--advance (last)--> Finished(score)
//! ```
//!
//! Attempts borrow their quiz and are scored independently; starting again
//! means building a new attempt with a zero score.

use thiserror::Error;

use crate::catalog::{Question, Quiz};
use crate::progress::percentage;

/// Misuse of the attempt state machine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    /// Operation not legal in the current state
    #[error("cannot {action} while {state}")]
    InvalidTransition { action: &'static str, state: &'static str },

    /// Option index past the end of the question's options
    #[error("option {index} out of range ({len} options)")]
    OptionOutOfRange { index: usize, len: usize },

    /// Quiz has no questions to attempt
    #[error("quiz has no questions")]
    EmptyQuiz,
}

/// Where an attempt currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    /// Waiting for the answer to question `index`; `selection` is tentative
    AwaitingSelection { index: usize, selection: Option<usize> },
    /// Question `index` was submitted with `selection`
    Answered { index: usize, selection: usize, correct: bool },
    /// All questions answered
    Finished(QuizScore),
}

impl AttemptState {
    fn name(&self) -> &'static str {
        match self {
            AttemptState::AwaitingSelection { .. } => "awaiting a selection",
            AttemptState::Answered { .. } => "the answer is submitted",
            AttemptState::Finished(_) => "the quiz is finished",
        }
    }
}

/// Final result of an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizScore {
    /// Questions answered correctly
    pub correct: usize,
    /// Questions in the quiz
    pub total: usize,
}

impl QuizScore {
    /// Rounded percentage of correct answers
    pub fn percentage(&self) -> u8 {
        percentage(self.correct, self.total)
    }
}

/// What [`QuizAttempt::advance`] moved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Now on question `index`
    Next(usize),
    /// Attempt is over
    Finished(QuizScore),
}

/// One run through a quiz
///
/// Finished attempts are consumed when recorded.
#[derive(Debug)]
pub struct QuizAttempt<'q> {
    quiz: &'q Quiz,
    state: AttemptState,
    /// Submitted answer per question
    answers: Vec<Option<usize>>,
    score: usize,
}

impl<'q> QuizAttempt<'q> {
    /// Begin a fresh attempt at the first question
    pub fn start(quiz: &'q Quiz) -> Result<Self, QuizError> {
        if quiz.is_empty() {
            return Err(QuizError::EmptyQuiz);
        }
        Ok(Self {
            quiz,
            state: AttemptState::AwaitingSelection { index: 0, selection: None },
            answers: vec![None; quiz.len()],
            score: 0,
        })
    }

    pub fn state(&self) -> AttemptState {
        self.state
    }

    /// The quiz being attempted
    pub fn quiz(&self) -> &'q Quiz {
        self.quiz
    }

    /// Running count of correct answers
    pub fn score(&self) -> usize {
        self.score
    }

    pub fn total_questions(&self) -> usize {
        self.quiz.len()
    }

    /// Index of the question being shown, `None` once finished
    pub fn current_index(&self) -> Option<usize> {
        match self.state {
            AttemptState::AwaitingSelection { index, .. } | AttemptState::Answered { index, .. } => {
                Some(index)
            }
            AttemptState::Finished(_) => None,
        }
    }

    /// The question being shown
    pub fn current_question(&self) -> Option<&'q Question> {
        self.current_index().map(|i| &self.quiz.questions[i])
    }

    /// Submitted answers so far, by question
    pub fn answers(&self) -> &[Option<usize>] {
        &self.answers
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, AttemptState::Finished(_))
    }

    fn invalid(&self, action: &'static str) -> QuizError {
        QuizError::InvalidTransition { action, state: self.state.name() }
    }

    /// Choose an option for the current question
    ///
    /// The choice can change freely until it is submitted; afterwards this
    /// is a no-op.
    pub fn select_option(&mut self, option: usize) -> Result<(), QuizError> {
        match self.state {
            AttemptState::AwaitingSelection { index, .. } => {
                let len = self.quiz.questions[index].options().len();
                if option >= len {
                    return Err(QuizError::OptionOutOfRange { index: option, len });
                }
                self.state = AttemptState::AwaitingSelection { index, selection: Some(option) };
                Ok(())
            }
            AttemptState::Answered { .. } => {
                tracing::debug!("Ignoring selection after submit");
                Ok(())
            }
            AttemptState::Finished(_) => Err(self.invalid("select an option")),
        }
    }

    /// Lock in the selected option and score it
    pub fn submit(&mut self) -> Result<bool, QuizError> {
        match self.state {
            AttemptState::AwaitingSelection { index, selection: Some(selection) } => {
                let correct = self.quiz.questions[index].is_correct(selection);
                if correct {
                    self.score += 1;
                }
                self.answers[index] = Some(selection);
                self.state = AttemptState::Answered { index, selection, correct };
                Ok(correct)
            }
            AttemptState::AwaitingSelection { selection: None, .. } => {
                Err(self.invalid("submit without a selection"))
            }
            _ => Err(self.invalid("submit")),
        }
    }

    /// Move past an answered question
    pub fn advance(&mut self) -> Result<Advance, QuizError> {
        match self.state {
            AttemptState::Answered { index, .. } if index + 1 < self.quiz.len() => {
                let next = index + 1;
                self.state = AttemptState::AwaitingSelection { index: next, selection: None };
                Ok(Advance::Next(next))
            }
            AttemptState::Answered { .. } => {
                let score = QuizScore { correct: self.score, total: self.quiz.len() };
                self.state = AttemptState::Finished(score);
                Ok(Advance::Finished(score))
            }
            _ => Err(self.invalid("advance")),
        }
    }
}
