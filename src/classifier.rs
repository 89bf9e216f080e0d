use regex::Regex;
use std::sync::LazyLock;

/// What the user is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Start,
    Centers,
    Schedules,
    Tutors,
    Requirements,
    Menu,
    Fallback,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Start => "start",
            Intent::Centers => "centers",
            Intent::Schedules => "schedules",
            Intent::Tutors => "tutors",
            Intent::Requirements => "requirements",
            Intent::Menu => "menu",
            Intent::Fallback => "fallback",
        }
    }
}

struct Rule {
    intent: Intent,
    /// Whole-message keyword (e.g. a keyboard button label).
    exact: Option<&'static str>,
    pattern: Option<Regex>,
}

impl Rule {
    fn new(intent: Intent, exact: Option<&'static str>, pattern: Option<&str>) -> Self {
        Self {
            intent,
            exact,
            pattern: pattern.map(|p| Regex::new(p).unwrap()),
        }
    }

    fn matches(&self, s: &str) -> bool {
        self.exact == Some(s) || self.pattern.as_ref().is_some_and(|p| p.is_match(s))
    }
}

// Order is priority: "centro" beats "horario" when both appear.
static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(Intent::Start, Some("/start"), None),
        Rule::new(
            Intent::Centers,
            Some("centros"),
            Some(r"centro|centros|lugares|ubicaci[oó]n|dónde"),
        ),
        Rule::new(
            Intent::Schedules,
            Some("horarios"),
            Some(r"horario|horarios|cu[aá]ndo|a qu[eé] hora"),
        ),
        Rule::new(Intent::Tutors, Some("tutores"), Some(r"tutor|encargad|responsable")),
        Rule::new(
            Intent::Requirements,
            Some("requisitos"),
            Some(r"requisito|inscrip|requer|qu[eé] necesito"),
        ),
        Rule::new(Intent::Menu, None, Some(r"menu|men[uú]|opciones|ayuda")),
    ]
});

/// Maps raw message text to an intent. Matching is done on the trimmed,
/// lowercased text; the first matching rule wins.
pub fn classify(text: &str) -> Intent {
    let s = text.trim().to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.matches(&s))
        .map(|rule| rule.intent)
        .unwrap_or(Intent::Fallback)
}
