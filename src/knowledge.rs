//! Static knowledge base the bot answers from.

use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Errors that can occur when loading a knowledge base file.
#[derive(Debug)]
pub enum KnowledgeError {
    /// Failed to read the file.
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// The data is inconsistent.
    Validation(String),
}

impl fmt::Display for KnowledgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read knowledge file '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse knowledge file '{}': {}", path.display(), source)
            }
            Self::Validation(msg) => write!(f, "knowledge validation error: {}", msg),
        }
    }
}

impl std::error::Error for KnowledgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
            Self::Validation(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Center {
    pub name: String,
    pub address: String,
    pub activities: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Schedule {
    /// Must equal a `Center::name`.
    pub center: String,
    pub hours: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Tutor {
    /// Must equal a `Center::name`.
    pub center: String,
    pub name: String,
    pub contact: String,
}

/// Read-only data shared by every request.
///
/// Schedule and tutor entries keep file order; lookups by center name walk
/// them front to back and stop at the first hit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KnowledgeBase {
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_city")]
    pub city: String,
    pub centers: Vec<Center>,
    #[serde(default)]
    pub schedules: Vec<Schedule>,
    #[serde(default)]
    pub tutors: Vec<Tutor>,
    #[serde(default)]
    pub requirements: Vec<String>,
    pub department_contact: String,
}

fn default_program() -> String {
    "Misiones Universitarias – UTPL".to_string()
}

fn default_city() -> String {
    "Loja".to_string()
}

impl KnowledgeBase {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, KnowledgeError> {
        let path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| KnowledgeError::ReadFile { path: path.clone(), source: e })?;
        let kb: KnowledgeBase = serde_json::from_str(&content)
            .map_err(|e| KnowledgeError::ParseJson { path: path.clone(), source: e })?;
        kb.validate()?;
        Ok(kb)
    }

    /// Checks that every schedule and tutor entry points at a known center.
    pub fn validate(&self) -> Result<(), KnowledgeError> {
        if self.centers.is_empty() {
            return Err(KnowledgeError::Validation(
                "centers must contain at least one center".into(),
            ));
        }

        let mut names = HashSet::new();
        for center in &self.centers {
            if center.name.trim().is_empty() {
                return Err(KnowledgeError::Validation("center name must not be empty".into()));
            }
            if !names.insert(center.name.as_str()) {
                return Err(KnowledgeError::Validation(format!(
                    "duplicate center name '{}'",
                    center.name
                )));
            }
        }

        let keys = self
            .schedules
            .iter()
            .map(|s| ("schedule", s.center.as_str()))
            .chain(self.tutors.iter().map(|t| ("tutor", t.center.as_str())));
        for (kind, key) in keys {
            if !names.contains(key) {
                return Err(KnowledgeError::Validation(format!(
                    "{kind} entry refers to unknown center '{key}'"
                )));
            }
        }

        Ok(())
    }

    /// First schedule whose center name appears in `text`, ignoring case.
    pub fn schedule_mentioned_in(&self, text: &str) -> Option<&Schedule> {
        let text = text.to_lowercase();
        self.schedules
            .iter()
            .find(|s| text.contains(&s.center.to_lowercase()))
    }

    /// First tutor whose center name appears in `text`, ignoring case.
    pub fn tutor_mentioned_in(&self, text: &str) -> Option<&Tutor> {
        let text = text.to_lowercase();
        self.tutors
            .iter()
            .find(|t| text.contains(&t.center.to_lowercase()))
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        let center = |name: &str, address: &str, activities: &str| Center {
            name: name.to_string(),
            address: address.to_string(),
            activities: activities.to_string(),
        };
        let schedule = |center: &str, hours: &str| Schedule {
            center: center.to_string(),
            hours: hours.to_string(),
        };
        let tutor = |center: &str, name: &str, contact: &str| Tutor {
            center: center.to_string(),
            name: name.to_string(),
            contact: contact.to_string(),
        };

        Self {
            program: default_program(),
            city: default_city(),
            centers: vec![
                center("Centro A", "Barrio San Pedro, Loja", "Apoyo escolar y lúdico"),
                center(
                    "Centro B",
                    "Av. Universitaria 123, Loja",
                    "Acompañamiento a adultos mayores",
                ),
            ],
            schedules: vec![
                schedule("Centro A", "Lun-Mié-Vie 14:30–17:30"),
                schedule("Centro B", "Mar-Jue 09:00–12:00"),
            ],
            tutors: vec![
                tutor("Centro A", "Ing. María Pérez", "maria.perez@utpl.edu.ec"),
                tutor("Centro B", "Lic. Jorge Ruiz", "jorge.ruiz@utpl.edu.ec"),
            ],
            requirements: vec![
                "Ser estudiante UTPL".to_string(),
                "Completar formulario de inscripción".to_string(),
                "Compromiso mínimo de 2–4 h/semana".to_string(),
            ],
            department_contact: "misiones@utpl.edu.ec".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn assert_err<T>(result: Result<T, KnowledgeError>) -> KnowledgeError {
        match result {
            Ok(_) => panic!("expected error, got Ok"),
            Err(e) => e,
        }
    }

    #[test]
    fn test_default_is_valid() {
        KnowledgeBase::default().validate().expect("built-in data should validate");
    }

    #[test]
    fn test_load_valid_file() {
        let file = write_file(r#"{
            "city": "Quito",
            "centers": [
                {"name": "Casa Norte", "address": "Calle 1", "activities": "Lectura"}
            ],
            "schedules": [{"center": "Casa Norte", "hours": "Sáb 08:00–10:00"}],
            "tutors": [{"center": "Casa Norte", "name": "Ana", "contact": "ana@example.org"}],
            "requirements": ["Ser mayor de edad"],
            "department_contact": "voluntariado@example.org"
        }"#);
        let kb = KnowledgeBase::load(file.path()).expect("should load");
        assert_eq!(kb.city, "Quito");
        assert_eq!(kb.program, default_program());
        assert_eq!(kb.centers.len(), 1);
        assert_eq!(kb.tutors[0].name, "Ana");
    }

    #[test]
    fn test_unknown_center_key() {
        let file = write_file(r#"{
            "centers": [{"name": "Centro A", "address": "x", "activities": "y"}],
            "schedules": [{"center": "centro a", "hours": "Lun"}],
            "department_contact": "a@b.c"
        }"#);
        let err = assert_err(KnowledgeBase::load(file.path()));
        assert!(matches!(err, KnowledgeError::Validation(_)));
        assert!(err.to_string().contains("centro a"));
    }

    #[test]
    fn test_duplicate_center() {
        let file = write_file(r#"{
            "centers": [
                {"name": "Centro A", "address": "x", "activities": "y"},
                {"name": "Centro A", "address": "z", "activities": "w"}
            ],
            "department_contact": "a@b.c"
        }"#);
        let err = assert_err(KnowledgeBase::load(file.path()));
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_no_centers() {
        let file = write_file(r#"{"centers": [], "department_contact": "a@b.c"}"#);
        let err = assert_err(KnowledgeBase::load(file.path()));
        assert!(matches!(err, KnowledgeError::Validation(_)));
    }

    #[test]
    fn test_file_not_found() {
        let err = assert_err(KnowledgeBase::load("/nonexistent/path/knowledge.json"));
        assert!(matches!(err, KnowledgeError::ReadFile { .. }));
    }

    #[test]
    fn test_invalid_json() {
        let file = write_file("{ not json }");
        let err = assert_err(KnowledgeBase::load(file.path()));
        assert!(matches!(err, KnowledgeError::ParseJson { .. }));
    }

    #[test]
    fn test_mention_lookup_is_case_insensitive() {
        let kb = KnowledgeBase::default();
        assert_eq!(kb.schedule_mentioned_in("horario CENTRO b").unwrap().center, "Centro B");
        assert_eq!(kb.tutor_mentioned_in("tutor centro a").unwrap().name, "Ing. María Pérez");
        assert!(kb.schedule_mentioned_in("horarios").is_none());
    }

    #[test]
    fn test_mention_lookup_first_entry_wins() {
        let kb = KnowledgeBase::default();
        let found = kb.schedule_mentioned_in("centro b o centro a").unwrap();
        assert_eq!(found.center, "Centro A");
    }
}
