//! Reply texts. Everything here is a pure function of its inputs.

use regex::Regex;
use std::sync::LazyLock;

use crate::classifier::Intent;
use crate::knowledge::KnowledgeBase;
use crate::telegram::ReplyKeyboard;

static CONTACT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)contacto|hablar|tutor").unwrap());

/// Two buttons per row, kept visible after each answer.
pub fn main_menu() -> ReplyKeyboard {
    ReplyKeyboard {
        rows: vec![
            vec!["Centros".to_string(), "Horarios".to_string()],
            vec!["Tutores".to_string(), "Requisitos".to_string()],
        ],
        resize: true,
        one_time: false,
    }
}

pub fn welcome(kb: &KnowledgeBase) -> String {
    [
        format!("¡Hola! Soy el asistente virtual de *{}* 🤝", kb.program),
        "Puedo ayudarte con información del *Voluntariado*.".to_string(),
    ]
    .join("\n")
}

/// Primary answer for any intent except [`Intent::Start`].
pub fn primary(intent: Intent, text: &str, kb: &KnowledgeBase) -> String {
    match intent {
        Intent::Centers => centers(kb),
        Intent::Schedules => schedules(text, kb),
        Intent::Tutors => tutors(text, kb),
        Intent::Requirements => requirements(kb),
        Intent::Menu => menu(),
        Intent::Start => welcome(kb),
        Intent::Fallback => fallback(),
    }
}

pub fn centers(kb: &KnowledgeBase) -> String {
    let mut lines = vec![format!("📍 *Centros de Voluntariado en {}*", kb.city)];
    lines.extend(kb.centers.iter().map(|c| {
        format!("• *{}* — {}\n   Actividades: {}", c.name, c.address, c.activities)
    }));
    lines.push(String::new());
    lines.push(
        "¿Te interesa alguno? Dime el *nombre del centro* para ver horarios y tutor.".to_string(),
    );
    lines.join("\n")
}

pub fn schedules(text: &str, kb: &KnowledgeBase) -> String {
    if let Some(found) = kb.schedule_mentioned_in(text) {
        return format!(
            "🕒 *Horarios – {}*: {}\n¿Deseas contacto del tutor o ver requisitos?",
            found.center, found.hours
        );
    }
    let all = kb
        .schedules
        .iter()
        .map(|s| format!("• *{}*: {}", s.center, s.hours))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "🕒 *Horarios por Centro*\n{all}\n\nPuedes escribir: *Horarios {}*, por ejemplo.",
        example_center(kb)
    )
}

pub fn tutors(text: &str, kb: &KnowledgeBase) -> String {
    if let Some(found) = kb.tutor_mentioned_in(text) {
        return format!(
            "👤 *Tutor – {}*: {}\n📧 {}\n¿Te comparto también horarios o requisitos?",
            found.center, found.name, found.contact
        );
    }
    let all = kb
        .tutors
        .iter()
        .map(|t| format!("• *{}*: {} — {}", t.center, t.name, t.contact))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "👤 *Tutores por Centro*\n{all}\n\nPuedes escribir: *Tutor {}*, por ejemplo.",
        example_center(kb)
    )
}

pub fn requirements(kb: &KnowledgeBase) -> String {
    let items = kb
        .requirements
        .iter()
        .map(|r| format!("• {r}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "📝 *Requisitos para Participar*\n{items}\n\n¿Deseas el *formulario de inscripción* o hablar con un tutor?"
    )
}

pub fn menu() -> String {
    "Aquí tienes las opciones 👇".to_string()
}

pub fn fallback() -> String {
    "No logré entender del todo tu consulta 🤔\n\nPrueba con *Centros*, *Horarios*, *Tutores* o *Requisitos*, o escribe *menú*."
        .to_string()
}

pub fn closing_prompt() -> String {
    "¿Esta información te fue útil? Puedes escribir *menú* para ver opciones o *contacto* para hablar con un tutor."
        .to_string()
}

pub fn contact(kb: &KnowledgeBase) -> String {
    format!(
        "Puedes escribirnos a: {}\nSi me indicas el *centro*, te paso el contacto del tutor correspondiente.",
        kb.department_contact
    )
}

/// True when the raw text asks for a person to talk to.
pub fn wants_contact(text: &str) -> bool {
    CONTACT_PATTERN.is_match(text)
}

fn example_center(kb: &KnowledgeBase) -> &str {
    kb.centers.first().map(|c| c.name.as_str()).unwrap_or("Centro A")
}
