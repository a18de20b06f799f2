/// Events produced by engine operations.
///
/// The engine mutates the session and reports what happened through
/// these; the binary turns them into fetch requests and sound cues.
/// Rendering never consumes events, it reads the session directly.

/// The three single-use lifelines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifeline {
    FiftyFifty,
    CallFriend,
    ChangeQuestion,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    /// A fresh run began from the title or an end screen.
    GameStarted,
    /// The session wants a question for `level`. The caller starts the fetch.
    QuestionRequested { level: u8 },
    /// A question was installed and play (re)opened.
    QuestionLoaded { level: u8 },
    /// A question fetch failed; the session now holds the error text.
    QuestionFailed,
    /// The player locked in option `index`; the checking hold began.
    AnswerLockedIn { index: usize },
    /// The checking hold expired and the verdict is showing.
    AnswerRevealed { correct: bool },
    /// The reveal hold expired on a correct answer below the summit.
    LevelAdvanced { level: u8 },
    LifelineUsed { which: Lifeline },
    /// The session wants friend advice. The caller starts the fetch.
    AdviceRequested,
    AdviceArrived,
    GameWon,
    /// The run ended on a wrong answer; `prize` is what the player keeps.
    GameLost { prize: &'static str },
}
