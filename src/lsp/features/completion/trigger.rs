/// Why the editor asked for completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// A space was typed
    Space,
    /// An opening brace was typed
    Brace,
    /// Explicit invocation or typing an identifier; every provider runs
    Invoked,
}

impl Trigger {
    pub const CHARACTERS: [&'static str; 2] = [" ", "{"];

    pub fn from_character(character: Option<&str>) -> Self {
        match character {
            Some(" ") => Trigger::Space,
            Some("{") => Trigger::Brace,
            _ => Trigger::Invoked,
        }
    }

    /// Whether a provider registered for `self` runs for a request triggered by `request`.
    pub fn accepts(self, request: Trigger) -> bool {
        request == Trigger::Invoked || self == request
    }
}
