use crate::event::Timestamp;

/// Tokens are used to handle the case where a buffering timeout fires after the buffer it was
/// scheduled for has already been drained, and possibly reopened.
///
/// Each drain advances the key's token, so a timeout carrying an older token is stale.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, PartialOrd, Ord)]
pub(crate) struct Token(u64);

impl Token {
    pub(crate) fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

/// Buffering state for one key.
///
/// `opened_at` is `None` exactly when nothing is buffered.
#[derive(Debug, Clone, Default)]
pub(crate) struct KeyState {
    buffered: usize,
    opened_at: Option<Timestamp>,
    token: Token,
}

/// What the caller must do after an arrival.
#[derive(Debug, PartialEq)]
pub(crate) enum OnArrival {
    /// The buffer was empty and has just opened. Schedule a timeout with this token.
    Opened(Token),
    /// Nothing to schedule.
    Buffered,
}

/// Result of draining a buffer.
#[derive(Debug, PartialEq)]
pub(crate) struct Drained {
    /// Messages taken out of the buffer.
    pub(crate) count: usize,
    /// Some messages were left behind and the buffer reopened with this token.
    pub(crate) reopened: Option<Token>,
}

impl KeyState {
    pub(crate) fn buffered(&self) -> usize {
        self.buffered
    }

    #[cfg(test)]
    pub(crate) fn opened_at(&self) -> Option<Timestamp> {
        self.opened_at
    }

    #[cfg(test)]
    pub(crate) fn token(&self) -> Token {
        self.token
    }

    pub(crate) fn is_live(&self, token: Token) -> bool {
        self.token == token
    }

    /// Buffer one more message.
    pub(crate) fn push(&mut self, now: Timestamp) -> OnArrival {
        let outcome = if self.buffered == 0 {
            OnArrival::Opened(self.open(now))
        } else {
            OnArrival::Buffered
        };

        self.buffered += 1;
        outcome
    }

    /// Take up to `max` messages out of the buffer.
    ///
    /// Always invalidates the current token. Any remainder reopens the buffer at `now`.
    pub(crate) fn drain(&mut self, max: usize, now: Timestamp) -> Drained {
        let count = self.buffered.min(max);
        self.buffered -= count;

        let reopened = if self.buffered > 0 {
            Some(self.open(now))
        } else {
            self.opened_at = None;
            self.token = self.token.next();
            None
        };

        debug_assert_eq!(self.opened_at.is_none(), self.buffered == 0);

        Drained { count, reopened }
    }

    fn open(&mut self, now: Timestamp) -> Token {
        self.opened_at = Some(now);
        self.token = self.token.next();
        self.token
    }
}
