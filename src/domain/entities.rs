//! Persisted entities for the blog content collection.
//!
//! The legacy schema stores every numbered field group as individually named
//! optional columns (`ingrediente_7`, `subtitulo_3`, …). Here each group is
//! an explicit sparse index→value mapping with a per-group bound, preserving
//! the contract that consumers probe every index independently: absence at
//! index N says nothing about index N+1.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::{GenerationMode, PostStatus, PostType};

/// Slot bounds of the numbered field groups in the persisted schema.
pub const INGREDIENT_SLOTS: u8 = 15;
pub const STEP_SLOTS: u8 = 15;
pub const DYNAMIC_SECTION_SLOTS: u8 = 10;
pub const LEGACY_SECTION_SLOTS: u8 = 7;

/// Legacy sections that may carry an image in the persisted shape.
pub const LEGACY_IMAGE_SLOTS: [u8; 2] = [3, 6];

/// A sparse, 1-based group of optional string fields with a fixed bound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparseFields {
    entries: BTreeMap<u8, String>,
}

impl SparseFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` at 1-based `index`. Out-of-bound indexes are ignored;
    /// the persisted schema simply has no column for them.
    pub fn set(&mut self, index: u8, bound: u8, value: impl Into<String>) {
        if (1..=bound).contains(&index) {
            self.entries.insert(index, value.into());
        }
    }

    pub fn get(&self, index: u8) -> Option<&str> {
        self.entries.get(&index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &str)> {
        self.entries.iter().map(|(index, value)| (*index, value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// One of the up-to-ten (subtitle, paragraph) pairs shared by recipes and
/// news posts. Either side may be present on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicSection {
    pub subtitulo: Option<String>,
    pub paragrafo: Option<String>,
}

impl DynamicSection {
    pub fn is_empty(&self) -> bool {
        self.subtitulo.is_none() && self.paragrafo.is_none()
    }
}

/// One of the seven fixed legacy sections. Only slots 3 and 6 carry images
/// in the legacy shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacySection {
    pub subtitulo: Option<String>,
    pub texto: Option<String>,
    pub imagem: Option<String>,
    pub imagem_alt: Option<String>,
}

impl LegacySection {
    pub fn is_empty(&self) -> bool {
        self.subtitulo.is_none()
            && self.texto.is_none()
            && self.imagem.is_none()
            && self.imagem_alt.is_none()
    }
}

/// Recipe-only field group: list titles plus sparse numbered entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeFields {
    pub titulo_ingredientes: Option<String>,
    pub ingredientes: SparseFields,
    pub titulo_modo_de_preparo: Option<String>,
    pub modo_de_preparo: SparseFields,
}

impl RecipeFields {
    pub fn is_empty(&self) -> bool {
        self.titulo_ingredientes.is_none()
            && self.ingredientes.is_empty()
            && self.titulo_modo_de_preparo.is_none()
            && self.modo_de_preparo.is_empty()
    }
}

/// Call-to-action block appended after the sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CtaSection {
    pub titulo: Option<String>,
    pub texto: Option<String>,
}

impl CtaSection {
    pub fn is_empty(&self) -> bool {
        self.titulo.is_none() && self.texto.is_none()
    }
}

/// SEO shadow fields. Each falls back to a content field when absent; the
/// fallback resolution happens at normalization time, so persisted records
/// carry the resolved values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoFields {
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_url: Option<String>,
    pub twitter_title: Option<String>,
    pub twitter_description: Option<String>,
}

/// Content body shared by new and persisted posts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostBody {
    pub resumo: Option<String>,
    pub conclusao: Option<String>,
    pub imagem_principal: Option<String>,
    pub imagem_principal_alt: Option<String>,
    /// 1-based legacy section slots, sparse.
    pub legacy_sections: BTreeMap<u8, LegacySection>,
    pub cta: CtaSection,
    /// 1-based dynamic (subtitle, paragraph) slots, sparse.
    pub dynamic_sections: BTreeMap<u8, DynamicSection>,
    pub recipe: RecipeFields,
    /// News-only source citation.
    pub fonte: Option<String>,
}

/// A fully-normalized post ready for insertion. Identity and timestamps are
/// assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub slug: String,
    pub titulo: String,
    pub post_type: Option<PostType>,
    pub body: PostBody,
    pub seo: SeoFields,
    pub modo: GenerationMode,
    pub status: PostStatus,
}

/// A persisted post as read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct PostRecord {
    pub id: i64,
    pub slug: String,
    pub titulo: String,
    pub post_type: Option<PostType>,
    pub body: PostBody,
    pub seo: SeoFields,
    pub modo: GenerationMode,
    pub status: PostStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Light projection for sidebar/related-post rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: i64,
    pub titulo: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}
