use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three audience tiers a session can run at.
///
/// The level is chosen once on the start screen and is immutable for the rest
/// of the session. It selects both the question bank and the report schema
/// variant the coach is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Elementary,
    Middle,
    Advanced,
}

impl Level {
    /// Human-readable name used in prompts and on screen.
    pub fn label(&self) -> &'static str {
        match self {
            Level::Elementary => "elementary school student",
            Level::Middle => "middle school student",
            Level::Advanced => "high school student",
        }
    }

    pub fn all() -> [Level; 3] {
        [Level::Elementary, Level::Middle, Level::Advanced]
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Elementary => "elementary",
            Level::Middle => "middle",
            Level::Advanced => "advanced",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "elementary" => Ok(Level::Elementary),
            "middle" => Ok(Level::Middle),
            "advanced" => Ok(Level::Advanced),
            other => Err(format!(
                "unknown level '{other}', expected one of: elementary, middle, advanced"
            )),
        }
    }
}

/// Returns the ordered question bank for a level.
///
/// The banks are static configuration; the session never mutates them and only
/// tracks a cursor into the returned slice.
pub fn questions_for(level: Level) -> &'static [&'static str] {
    match level {
        Level::Elementary => ELEMENTARY_QUESTIONS,
        Level::Middle => MIDDLE_QUESTIONS,
        Level::Advanced => ADVANCED_QUESTIONS,
    }
}

const ELEMENTARY_QUESTIONS: &[&str] = &[
    "Make up a nickname that describes you best, and tell us why you picked it.",
    "Have you helped someone recently? Tell us what happened and how it made you feel.",
    "If you could make one new rule to make your class more fun, what rule would it be?",
    "What do you think a 'true friend' is? Explain your thinking with an example.",
    "Imagine what you will be like ten years from now, and tell us concretely what you \
     can start doing today to make that dream come true.",
];

const MIDDLE_QUESTIONS: &[&str] = &[
    "What is your greatest strength, and what experience first made you aware of it?",
    "What has been the most challenging task or activity of your middle school years, \
     and what did you learn from going through it?",
    "Should students be required to wear school uniforms? State your position and \
     argue it logically.",
    "What does it mean to use social media wisely? Explain your view with concrete \
     examples.",
    "Do you think AI is an essential technology for the future? Argue your view on the \
     positive roles of AI and on what we should guard against.",
];

const ADVANCED_QUESTIONS: &[&str] = &[
    "Describe in detail the most meaningful independent study or research activity you \
     pursued to build competence toward your intended career path.",
    "When a conflict arose with a teammate who held a different opinion during a team \
     project, how did you communicate to resolve it, and what was your role in that \
     process?",
    "What do you consider the most important virtue for a leader in modern society? \
     Support your argument with the example of a historical or contemporary figure.",
    "Choose one important issue facing our society today (for example climate change, \
     misinformation, or falling birth rates), analyze its root causes, and propose a \
     feasible solution.",
    "Between 'equality of outcome' and 'equality of opportunity', which value should \
     our society prioritize? Develop your position logically using a concrete \
     institution or policy as an example.",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_level_has_five_questions() {
        for level in Level::all() {
            assert_eq!(
                questions_for(level).len(),
                5,
                "question bank for {level} should have five entries"
            );
        }
    }

    #[test]
    fn level_parses_from_cli_spelling() {
        assert_eq!("elementary".parse::<Level>(), Ok(Level::Elementary));
        assert_eq!("Middle".parse::<Level>(), Ok(Level::Middle));
        assert_eq!("ADVANCED".parse::<Level>(), Ok(Level::Advanced));
        assert!("college".parse::<Level>().is_err());
    }

    #[test]
    fn banks_are_distinct_per_level() {
        assert_ne!(questions_for(Level::Elementary), questions_for(Level::Middle));
        assert_ne!(questions_for(Level::Middle), questions_for(Level::Advanced));
    }
}
