#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlannerError {
    #[error("unexpected end of predicate")]
    UnexpectedEnd,
    #[error("unexpected character '{found}' at position {position}")]
    UnexpectedCharacter { position: usize, found: char },
    #[error("invalid number literal '{literal}'")]
    InvalidNumber { literal: String },
    #[error("unterminated text literal starting at position {position}")]
    UnterminatedText { position: usize },
    #[error("expected a predicate, found {found}")]
    ExpectedPredicate { found: String },
    #[error("unexpected trailing input starting with {found}")]
    TrailingTokens { found: String },
}
