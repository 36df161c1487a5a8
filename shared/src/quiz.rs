//! Butterfly knowledge quiz.
//!
//! The question bank is authoritative for both the client (which scores
//! answers locally) and the backend (which checks the reported total).

use serde::Serialize;

use crate::QuizAttempt;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuizQuestion {
    pub question: &'static str,
    pub options: &'static [&'static str],
    pub answer: &'static str,
}

pub const QUESTION_BANK: &[QuizQuestion] = &[
    QuizQuestion {
        question: "Which is the largest butterfly in Sri Lanka?",
        options: &["Common Jezebel", "Sri Lankan Birdwing", "Tree Nymph"],
        answer: "Sri Lankan Birdwing",
    },
    QuizQuestion {
        question: "Why do butterflies have bright colors?",
        options: &["To attract mates", "To warn predators", "For camouflage"],
        answer: "To warn predators",
    },
    QuizQuestion {
        question: "Which butterfly is known for its slow, floating flight?",
        options: &["Blue Mormon", "Tree Nymph", "Tawny Coster"],
        answer: "Tree Nymph",
    },
    QuizQuestion {
        question: "Which butterfly has transparent wings?",
        options: &["Glasswing", "Common Rose", "Blue Tiger"],
        answer: "Glasswing",
    },
    QuizQuestion {
        question: "How many butterfly species are endemic to Sri Lanka?",
        options: &["10", "23", "45"],
        answer: "23",
    },
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuizState {
    InProgress { current: usize, score: u32 },
    Complete { score: u32, total: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// No option selected, or the quiz is already complete.
    Blocked,
    Advanced,
    Completed(QuizAttempt),
}

/// Receives the final attempt. Called once, on the transition into `Complete`.
pub trait ScoreReporter {
    fn report(&mut self, attempt: QuizAttempt);
}

impl<F: FnMut(QuizAttempt)> ScoreReporter for F {
    fn report(&mut self, attempt: QuizAttempt) {
        self(attempt)
    }
}

pub struct Quiz<'a> {
    questions: &'a [QuizQuestion],
    state: QuizState,
    selected: Option<&'a str>,
}

impl<'a> Quiz<'a> {
    pub fn new(questions: &'a [QuizQuestion]) -> Self {
        Self {
            questions,
            state: QuizState::InProgress { current: 0, score: 0 },
            selected: None,
        }
    }

    pub fn state(&self) -> QuizState {
        self.state
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn current_question(&self) -> Option<&'a QuizQuestion> {
        match self.state {
            QuizState::InProgress { current, .. } => self.questions.get(current),
            QuizState::Complete { .. } => None,
        }
    }

    pub fn selected(&self) -> Option<&'a str> {
        self.selected
    }

    /// Selects one of the current question's options. Returns false (and keeps
    /// the previous selection) when the option is not offered.
    pub fn select(&mut self, option: &str) -> bool {
        let Some(question) = self.current_question() else {
            return false;
        };
        match question.options.iter().find(|o| **o == option) {
            Some(found) => {
                self.selected = Some(*found);
                true
            }
            None => false,
        }
    }

    pub fn can_submit(&self) -> bool {
        self.selected.is_some() && self.current_question().is_some()
    }

    pub fn submit<R: ScoreReporter + ?Sized>(&mut self, reporter: &mut R) -> Transition {
        let (current, mut score) = match self.state {
            QuizState::InProgress { current, score } => (current, score),
            QuizState::Complete { .. } => return Transition::Blocked,
        };
        let (Some(question), Some(selected)) = (self.questions.get(current), self.selected)
        else {
            return Transition::Blocked;
        };

        if selected == question.answer {
            score += 1;
        }
        self.selected = None;

        if current + 1 < self.questions.len() {
            self.state = QuizState::InProgress { current: current + 1, score };
            Transition::Advanced
        } else {
            let total = self.questions.len() as u32;
            self.state = QuizState::Complete { score, total };
            let attempt = QuizAttempt {
                score: i64::from(score),
                total: i64::from(total),
            };
            reporter.report(attempt);
            Transition::Completed(attempt)
        }
    }
}
