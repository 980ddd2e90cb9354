/// Which validator layer reported an error (§4.3, §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationLevel {
    Structural,
    Semantic,
    Policy,
}

impl std::fmt::Display for ValidationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ValidationLevel::Structural => "structural",
            ValidationLevel::Semantic => "semantic",
            ValidationLevel::Policy => "policy",
        };
        write!(f, "{s}")
    }
}

/// One validation failure: a field path, the layer that found it, a message
/// and a suggestion. All fields are non-blank by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field_path: String,
    pub level: ValidationLevel,
    pub message: String,
    pub suggestion: String,
}

impl ValidationError {
    pub fn new(
        field_path: impl Into<String>,
        level: ValidationLevel,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        let field_path = field_path.into();
        let message = message.into();
        let suggestion = suggestion.into();
        debug_assert!(!field_path.is_empty(), "field_path must be non-blank");
        debug_assert!(!message.is_empty(), "message must be non-blank");
        debug_assert!(!suggestion.is_empty(), "suggestion must be non-blank");
        ValidationError {
            field_path,
            level,
            message,
            suggestion,
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}: {} (suggestion: {})",
            self.level, self.field_path, self.message, self.suggestion
        )
    }
}

/// A collected set of [`ValidationError`]s from one validator layer.
///
/// Layers never short-circuit within themselves (§4.3): every rule runs and
/// contributes whatever errors it finds to the same `ValidationResult`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        ValidationResult::default()
    }

    pub fn with_error(mut self, error: ValidationError) -> Self {
        self.errors.push(error);
        self
    }

    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn merge(mut self, other: ValidationResult) -> Self {
        self.errors.extend(other.errors);
        self
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }
}

impl FromIterator<ValidationError> for ValidationResult {
    fn from_iter<T: IntoIterator<Item = ValidationError>>(iter: T) -> Self {
        ValidationResult {
            errors: iter.into_iter().collect(),
        }
    }
}
