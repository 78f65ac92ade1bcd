//! Shared domain enumerations aligned with the persisted legacy schema.
//!
//! Serialized values keep the Portuguese wire contract the marketing site
//! and the upstream generator already speak (`receita`, `publicado`,
//! `automático`, …).

use serde::{Deserialize, Serialize};

/// Content sub-type discriminator. A post without one renders as a plain
/// article; the sub-type controls which optional field groups are
/// meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostType {
    #[serde(rename = "receita")]
    Receita,
    #[serde(rename = "noticia")]
    Noticia,
}

impl PostType {
    pub fn as_str(self) -> &'static str {
        match self {
            PostType::Receita => "receita",
            PostType::Noticia => "noticia",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "receita" => Some(PostType::Receita),
            "noticia" => Some(PostType::Noticia),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostStatus {
    #[serde(rename = "publicado")]
    Publicado,
    #[serde(rename = "rascunho")]
    Rascunho,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Publicado => "publicado",
            PostStatus::Rascunho => "rascunho",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "publicado" => Some(PostStatus::Publicado),
            "rascunho" => Some(PostStatus::Rascunho),
            _ => None,
        }
    }
}

/// How a post (or a generation run) was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationMode {
    #[serde(rename = "automático")]
    Automatico,
    #[serde(rename = "personalizado")]
    Personalizado,
}

impl GenerationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationMode::Automatico => "automático",
            GenerationMode::Personalizado => "personalizado",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "automático" | "automatico" => Some(GenerationMode::Automatico),
            "personalizado" => Some(GenerationMode::Personalizado),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_round_trip_through_wire_values() {
        assert_eq!(
            GenerationMode::parse("automático"),
            Some(GenerationMode::Automatico)
        );
        assert_eq!(
            GenerationMode::parse(GenerationMode::Personalizado.as_str()),
            Some(GenerationMode::Personalizado)
        );
        assert_eq!(GenerationMode::parse("manual"), None);
    }

    #[test]
    fn unaccented_mode_spelling_is_accepted() {
        assert_eq!(
            GenerationMode::parse("automatico"),
            Some(GenerationMode::Automatico)
        );
    }

    #[test]
    fn status_serializes_to_portuguese_values() {
        let json = serde_json::to_string(&PostStatus::Rascunho).expect("serialize");
        assert_eq!(json, "\"rascunho\"");
    }
}
