use serde::{Deserialize, Serialize};
use std::fmt;

/// The REST calls the request client knows how to make
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// GET a sentence rewritten by the transformed-text service
    YodaSpeak,
    /// POST a category and receive a random quote
    RandomQuotes,
}

impl Operation {
    /// Name used in log lines and events
    pub fn name(&self) -> &'static str {
        match self {
            Operation::YodaSpeak => "yoda_speak",
            Operation::RandomQuotes => "random_quotes",
        }
    }

    /// Media type requested through `Accept`
    pub fn accept(&self) -> &'static str {
        match self {
            Operation::YodaSpeak => "text/plain",
            Operation::RandomQuotes => "application/json",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
