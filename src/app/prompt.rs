//! Prompt context and the request-name validator

use crate::error::ValidationError;

/// What a prompt answer will be used for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptOp {
    CreateSimple,
    CreateComplex,
    Rename,
    Copy,
}

impl PromptOp {
    pub fn title(&self) -> &str {
        match self {
            PromptOp::CreateSimple => " New request name ",
            PromptOp::CreateComplex => " New scripted request name ",
            PromptOp::Rename => " Rename request ",
            PromptOp::Copy => " Copy request as ",
        }
    }
}

/// Operation, starting text and the list index of the targeted request
#[derive(Clone, Debug, PartialEq)]
pub struct PromptContext {
    pub op: PromptOp,
    pub initial: String,
    pub target: Option<usize>,
}

/// Live prompt: context plus the text being typed
#[derive(Clone, Debug)]
pub struct PromptState {
    pub context: PromptContext,
    pub input: String,
    pub cursor_position: usize,
    pub error: Option<ValidationError>,
}

impl PromptState {
    pub fn new(context: PromptContext) -> Self {
        let input = context.initial.clone();
        PromptState {
            cursor_position: input.len(),
            input,
            context,
            error: None,
        }
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position = self.input[..self.cursor_position]
                .char_indices()
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_position < self.input.len() {
            self.cursor_position = self.input[self.cursor_position..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor_position + i)
                .unwrap_or(self.input.len());
        }
    }

    pub fn enter_char(&mut self, c: char) {
        self.input.insert(self.cursor_position, c);
        self.cursor_position += c.len_utf8();
    }

    pub fn delete_char(&mut self) {
        if self.cursor_position > 0 {
            let prev_pos = self.input[..self.cursor_position]
                .char_indices()
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
            self.input.remove(prev_pos);
            self.cursor_position = prev_pos;
        }
    }
}

/// Check a proposed request name and return it trimmed.
///
/// Names are compared trimmed and case-sensitively against `existing`;
/// `current` (the target's own name) is not counted as a collision.
pub fn validate_name<'a>(
    input: &str,
    existing: impl IntoIterator<Item = &'a str>,
    current: Option<&str>,
) -> Result<String, ValidationError> {
    let name = input.trim();
    if name.is_empty() {
        return Err(ValidationError::Empty);
    }
    if name.contains('/') || name.contains('\\') {
        return Err(ValidationError::PathSeparator);
    }

    let current = current.map(str::trim);
    let taken = existing
        .into_iter()
        .map(str::trim)
        .filter(|other| Some(*other) != current)
        .any(|other| other == name);
    if taken {
        return Err(ValidationError::Duplicate(name.to_string()));
    }

    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMES: [&str; 3] = ["get-user", "ping", "Login"];

    #[test]
    fn test_accepts_new_name_trimmed() {
        assert_eq!(validate_name("  fresh ", NAMES, None).unwrap(), "fresh");
    }

    #[test]
    fn test_rejects_empty_and_duplicates() {
        assert_eq!(validate_name("   ", NAMES, None), Err(ValidationError::Empty));
        assert_eq!(
            validate_name(" ping ", NAMES, None),
            Err(ValidationError::Duplicate("ping".to_string()))
        );
        assert_eq!(validate_name("a/b", NAMES, None), Err(ValidationError::PathSeparator));
    }

    #[test]
    fn test_case_sensitive() {
        assert!(validate_name("login", NAMES, None).is_ok());
    }

    #[test]
    fn test_own_name_is_not_a_collision() {
        assert!(validate_name("ping", NAMES, Some("ping")).is_ok());
        assert!(validate_name("get-user", NAMES, Some("ping")).is_err());
    }

    #[test]
    fn test_prompt_editing_is_utf8_safe() {
        let mut prompt = PromptState::new(PromptContext {
            op: PromptOp::Rename,
            initial: "café".to_string(),
            target: Some(0),
        });
        prompt.move_cursor_left();
        prompt.delete_char();
        assert_eq!(prompt.input, "caé");
        prompt.move_cursor_right();
        prompt.enter_char('!');
        assert_eq!(prompt.input, "caé!");
    }
}
