//! Question catalog
//!
//! Questions come from the backend's `/questions` route. When that list is
//! empty the built-in groups below are offered instead; they cover the
//! backend's demo world (Smaug, Arthur, Camelot, Excalibur, Tiên Nữ).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Question identifier; the backend uses numbers but strings are accepted
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionId {
    Number(i64),
    Text(String),
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
}

impl Question {
    pub fn new(id: QuestionId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}

/// Named set of questions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionGroup {
    pub name: String,
    pub questions: Vec<String>,
}

const YES_NO: &[&str] = &[
    "Smaug là rồng phải không?",
    "Arthur là hiệp sĩ phải không?",
    "Kẻ thù tấn công Camelot phải không?",
    "Tiên Nữ là bạn Arthur phải không?",
    "Smaug là kẻ thù phải không?",
    "Excalibur là kiếm phải không?",
];

const WHO: &[&str] = &[
    "Ai bảo vệ Camelot?",
    "Ai tấn công Camelot?",
    "Ai trao Excalibur cho Arthur?",
    "Ai là bạn của Arthur?",
    "Ai sở hữu Excalibur?",
];

const WHAT: &[&str] = &["Tiên Nữ trao cái gì cho Arthur?"];

/// Yes/No, Who and What groups, in display order
pub fn builtin_groups() -> Vec<QuestionGroup> {
    [
        ("Nhóm Câu hỏi Yes/No", YES_NO),
        ("Nhóm Câu hỏi Who", WHO),
        ("Nhóm Câu hỏi What", WHAT),
    ]
    .into_iter()
    .map(|(name, questions)| QuestionGroup {
        name: name.to_string(),
        questions: questions.iter().map(|q| q.to_string()).collect(),
    })
    .collect()
}

/// Question preselected on start-up
pub fn default_question() -> &'static str {
    YES_NO[0]
}

/// Flat, selectable list of question texts
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Group name, or `None` for questions from the backend
    pub group: Option<String>,
    pub text: String,
}

impl Catalog {
    /// Remote questions when there are any, built-in groups otherwise
    pub fn from_remote(questions: Vec<Question>) -> Self {
        if questions.is_empty() {
            return Self::builtin();
        }
        Self {
            entries: questions
                .into_iter()
                .map(|q| CatalogEntry {
                    group: None,
                    text: q.text,
                })
                .collect(),
        }
    }

    pub fn builtin() -> Self {
        let entries = builtin_groups()
            .into_iter()
            .flat_map(|group| {
                let name = group.name;
                group.questions.into_iter().map(move |text| CatalogEntry {
                    group: Some(name.clone()),
                    text,
                })
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CatalogEntry> {
        self.entries.get(index)
    }

    pub fn position(&self, text: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.text == text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_group_sizes() {
        let groups = builtin_groups();
        let sizes: Vec<_> = groups.iter().map(|g| g.questions.len()).collect();
        assert_eq!(sizes, vec![6, 5, 1]);
        assert_eq!(groups[2].questions[0], "Tiên Nữ trao cái gì cho Arthur?");
    }

    #[test]
    fn test_default_question_is_first_builtin() {
        assert_eq!(default_question(), "Smaug là rồng phải không?");
        assert_eq!(Catalog::builtin().position(default_question()), Some(0));
    }

    #[test]
    fn test_question_id_accepts_number_or_string() {
        let qs: Vec<Question> =
            serde_json::from_str(r#"[{"id": 1, "text": "a"}, {"id": "q2", "text": "b"}]"#)
                .unwrap();
        assert_eq!(qs[0].id, QuestionId::Number(1));
        assert_eq!(qs[1].id, QuestionId::Text("q2".to_string()));
        assert_eq!(qs[1].id.to_string(), "q2");
    }

    #[test]
    fn test_empty_remote_falls_back_to_builtin() {
        let catalog = Catalog::from_remote(Vec::new());
        assert_eq!(catalog.len(), 12);
        assert!(catalog.entries()[0].group.is_some());
    }

    #[test]
    fn test_remote_questions_are_used_as_is() {
        let catalog = Catalog::from_remote(vec![Question::new(QuestionId::Number(7), "Ai?")]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(0).map(|e| e.text.as_str()), Some("Ai?"));
        assert_eq!(catalog.get(0).and_then(|e| e.group.clone()), None);
    }
}
