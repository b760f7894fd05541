use std::collections::BTreeSet;

use crate::parser::{MessageKind, MessageParser};

/// Configures which message kinds a [`MessageParser`] decodes.
///
/// Defaults to every built-in kind. A disabled kind is treated exactly like a
/// kind the crate has never heard of: the parser skips it.
#[derive(Debug, Clone)]
pub struct MessageParserBuilder {
    pub(crate) known: BTreeSet<MessageKind>,
}

impl Default for MessageParserBuilder {
    fn default() -> Self {
        Self {
            known: MessageKind::ALL.into_iter().collect(),
        }
    }
}

impl MessageParserBuilder {
    pub fn enable(mut self, kind: MessageKind) -> Self {
        self.known.insert(kind);
        self
    }

    pub fn disable(mut self, kind: MessageKind) -> Self {
        self.known.remove(&kind);
        self
    }

    /// Replaces the enabled set with exactly `kinds`.
    pub fn only(mut self, kinds: impl IntoIterator<Item = MessageKind>) -> Self {
        self.known = kinds.into_iter().collect();
        self
    }

    pub fn build(self) -> MessageParser {
        MessageParser { known: self.known }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_then_enable_composes() {
        let parser = MessageParserBuilder::default()
            .only([MessageKind::Assistant])
            .enable(MessageKind::Result)
            .build();
        let kinds: Vec<_> = parser.known_kinds().collect();
        assert_eq!(kinds, vec![MessageKind::Assistant, MessageKind::Result]);
    }

    #[test]
    fn default_matches_parser_default() {
        assert_eq!(MessageParserBuilder::default().build(), MessageParser::default());
    }
}
