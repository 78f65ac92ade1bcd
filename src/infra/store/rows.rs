//! Mapping between domain entities and the flat persisted row schema.
//!
//! The store keeps the legacy column layout: numbered optional columns per
//! field group (`ingrediente_1..15`, `subtitulo_1..10`/`paragrafo_1..10`,
//! `subtitulo_secao_1..7` with images on sections 3 and 6 only). Absent
//! fields are absent keys, never nulls, and every index is probed
//! independently when reading back.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::application::repos::{PostPatch, RepoError};
use crate::domain::entities::{
    DYNAMIC_SECTION_SLOTS, DynamicSection, INGREDIENT_SLOTS, LEGACY_IMAGE_SLOTS,
    LEGACY_SECTION_SLOTS, LegacySection, NewPost, PostBody, PostRecord, PostSummary, STEP_SLOTS,
    SeoFields,
};
use crate::domain::schedule::ScheduleConfig;
use crate::domain::types::{GenerationMode, PostStatus, PostType};

fn ingrediente_col(index: u8) -> String {
    format!("ingrediente_{index}")
}

fn preparo_col(index: u8) -> String {
    format!("modo_de_preparo_{index}")
}

fn dynamic_subtitulo_col(index: u8) -> String {
    format!("subtitulo_{index}")
}

fn dynamic_paragrafo_col(index: u8) -> String {
    format!("paragrafo_{index}")
}

fn secao_subtitulo_col(index: u8) -> String {
    format!("subtitulo_secao_{index}")
}

fn secao_texto_col(index: u8) -> String {
    format!("texto_secao_{index}")
}

fn secao_imagem_col(index: u8) -> String {
    format!("imagem_secao_{index}")
}

fn secao_imagem_alt_col(index: u8) -> String {
    format!("imagem_secao_{index}_alt")
}

fn put(row: &mut Map<String, Value>, key: impl Into<String>, value: &Option<String>) {
    if let Some(value) = value {
        row.insert(key.into(), Value::String(value.clone()));
    }
}

/// Insert body for a normalized post. Identity and timestamps stay with the
/// store.
pub fn new_post_to_row(post: &NewPost) -> Map<String, Value> {
    let mut row = Map::new();
    row.insert("slug".into(), Value::String(post.slug.clone()));
    row.insert("titulo".into(), Value::String(post.titulo.clone()));
    if let Some(post_type) = post.post_type {
        row.insert("post_type".into(), Value::String(post_type.as_str().into()));
    }
    row.insert("modo".into(), Value::String(post.modo.as_str().into()));
    row.insert("status".into(), Value::String(post.status.as_str().into()));

    body_into_row(&mut row, &post.body);
    seo_into_row(&mut row, &post.seo);
    row
}

/// Full row for a persisted post; this is also the public API shape.
pub fn post_to_row(record: &PostRecord) -> Map<String, Value> {
    let mut row = new_post_to_row(&NewPost {
        slug: record.slug.clone(),
        titulo: record.titulo.clone(),
        post_type: record.post_type,
        body: record.body.clone(),
        seo: record.seo.clone(),
        modo: record.modo,
        status: record.status,
    });
    row.insert("id".into(), Value::from(record.id));
    row.insert(
        "created_at".into(),
        Value::String(record.created_at.to_rfc3339()),
    );
    row.insert(
        "updated_at".into(),
        Value::String(record.updated_at.to_rfc3339()),
    );
    row
}

fn body_into_row(row: &mut Map<String, Value>, body: &PostBody) {
    put(row, "resumo", &body.resumo);
    put(row, "conclusao", &body.conclusao);
    put(row, "imagem_principal", &body.imagem_principal);
    put(row, "imagem_principal_alt", &body.imagem_principal_alt);
    put(row, "fonte", &body.fonte);
    put(row, "cta_titulo", &body.cta.titulo);
    put(row, "cta_texto", &body.cta.texto);

    put(
        row,
        "titulo_ingredientes",
        &body.recipe.titulo_ingredientes,
    );
    put(
        row,
        "titulo_modo_de_preparo",
        &body.recipe.titulo_modo_de_preparo,
    );
    for (index, value) in body.recipe.ingredientes.iter() {
        row.insert(ingrediente_col(index), Value::String(value.into()));
    }
    for (index, value) in body.recipe.modo_de_preparo.iter() {
        row.insert(preparo_col(index), Value::String(value.into()));
    }

    for (index, section) in &body.dynamic_sections {
        put(row, dynamic_subtitulo_col(*index), &section.subtitulo);
        put(row, dynamic_paragrafo_col(*index), &section.paragrafo);
    }

    for (index, section) in &body.legacy_sections {
        put(row, secao_subtitulo_col(*index), &section.subtitulo);
        put(row, secao_texto_col(*index), &section.texto);
        put(row, secao_imagem_col(*index), &section.imagem);
        put(row, secao_imagem_alt_col(*index), &section.imagem_alt);
    }
}

fn seo_into_row(row: &mut Map<String, Value>, seo: &SeoFields) {
    put(row, "meta_description", &seo.meta_description);
    put(row, "meta_keywords", &seo.meta_keywords);
    put(row, "og_title", &seo.og_title);
    put(row, "og_description", &seo.og_description);
    put(row, "og_url", &seo.og_url);
    put(row, "twitter_title", &seo.twitter_title);
    put(row, "twitter_description", &seo.twitter_description);
}

pub fn row_to_post(row: &Map<String, Value>) -> Result<PostRecord, RepoError> {
    let id = require_i64(row, "id")?;
    let slug = require_text(row, "slug")?;
    let titulo = require_text(row, "titulo")?;
    let post_type = text(row, "post_type")
        .as_deref()
        .and_then(PostType::parse);
    let modo = text(row, "modo")
        .as_deref()
        .and_then(GenerationMode::parse)
        .unwrap_or(GenerationMode::Automatico);
    let status = text(row, "status")
        .as_deref()
        .and_then(PostStatus::parse)
        .unwrap_or(PostStatus::Publicado);

    let mut body = PostBody {
        resumo: text(row, "resumo"),
        conclusao: text(row, "conclusao"),
        imagem_principal: text(row, "imagem_principal"),
        imagem_principal_alt: text(row, "imagem_principal_alt"),
        fonte: text(row, "fonte"),
        ..PostBody::default()
    };
    body.cta.titulo = text(row, "cta_titulo");
    body.cta.texto = text(row, "cta_texto");
    body.recipe.titulo_ingredientes = text(row, "titulo_ingredientes");
    body.recipe.titulo_modo_de_preparo = text(row, "titulo_modo_de_preparo");

    for index in 1..=INGREDIENT_SLOTS {
        if let Some(value) = text(row, &ingrediente_col(index)) {
            body.recipe.ingredientes.set(index, INGREDIENT_SLOTS, value);
        }
    }
    for index in 1..=STEP_SLOTS {
        if let Some(value) = text(row, &preparo_col(index)) {
            body.recipe.modo_de_preparo.set(index, STEP_SLOTS, value);
        }
    }
    for index in 1..=DYNAMIC_SECTION_SLOTS {
        let section = DynamicSection {
            subtitulo: text(row, &dynamic_subtitulo_col(index)),
            paragrafo: text(row, &dynamic_paragrafo_col(index)),
        };
        if !section.is_empty() {
            body.dynamic_sections.insert(index, section);
        }
    }
    for index in 1..=LEGACY_SECTION_SLOTS {
        let mut section = LegacySection {
            subtitulo: text(row, &secao_subtitulo_col(index)),
            texto: text(row, &secao_texto_col(index)),
            ..LegacySection::default()
        };
        if LEGACY_IMAGE_SLOTS.contains(&index) {
            section.imagem = text(row, &secao_imagem_col(index));
            section.imagem_alt = text(row, &secao_imagem_alt_col(index));
        }
        if !section.is_empty() {
            body.legacy_sections.insert(index, section);
        }
    }

    let seo = SeoFields {
        meta_description: text(row, "meta_description"),
        meta_keywords: text(row, "meta_keywords"),
        og_title: text(row, "og_title"),
        og_description: text(row, "og_description"),
        og_url: text(row, "og_url"),
        twitter_title: text(row, "twitter_title"),
        twitter_description: text(row, "twitter_description"),
    };

    Ok(PostRecord {
        id,
        slug,
        titulo,
        post_type,
        body,
        seo,
        modo,
        status,
        created_at: require_timestamp(row, "created_at")?,
        updated_at: require_timestamp(row, "updated_at")?,
    })
}

pub fn row_to_summary(row: &Map<String, Value>) -> Result<PostSummary, RepoError> {
    Ok(PostSummary {
        id: require_i64(row, "id")?,
        titulo: require_text(row, "titulo")?,
        slug: require_text(row, "slug")?,
        created_at: require_timestamp(row, "created_at")?,
    })
}

/// PATCH body for a field-level admin edit; refreshes `updated_at`.
pub fn patch_to_row(patch: &PostPatch, updated_at: DateTime<Utc>) -> Map<String, Value> {
    let mut row = Map::new();
    put(&mut row, "titulo", &patch.titulo);
    put(&mut row, "resumo", &patch.resumo);
    put(&mut row, "conclusao", &patch.conclusao);
    put(&mut row, "imagem_principal", &patch.imagem_principal);
    put(&mut row, "imagem_principal_alt", &patch.imagem_principal_alt);
    put(&mut row, "fonte", &patch.fonte);
    put(&mut row, "meta_description", &patch.meta_description);
    put(&mut row, "meta_keywords", &patch.meta_keywords);
    if let Some(status) = patch.status {
        row.insert("status".into(), Value::String(status.as_str().into()));
    }
    if let Some(post_type) = patch.post_type {
        row.insert("post_type".into(), Value::String(post_type.as_str().into()));
    }
    row.insert(
        "updated_at".into(),
        Value::String(updated_at.to_rfc3339()),
    );
    row
}

pub fn config_to_row(config: &ScheduleConfig) -> Map<String, Value> {
    let mut row = Map::new();
    row.insert("is_enabled".into(), Value::Bool(config.is_enabled));
    row.insert("start_hour".into(), Value::from(config.start_hour));
    row.insert("end_hour".into(), Value::from(config.end_hour));
    row.insert("modo".into(), Value::String(config.modo.as_str().into()));
    put(&mut row, "tema", &config.tema);
    put(&mut row, "publico_alvo", &config.publico_alvo);
    row.insert(
        "updated_at".into(),
        Value::String(config.updated_at.to_rfc3339()),
    );
    row
}

pub fn row_to_config(row: &Map<String, Value>) -> Result<ScheduleConfig, RepoError> {
    let hour = |key: &str| -> Result<u8, RepoError> {
        let value = row
            .get(key)
            .and_then(Value::as_u64)
            .ok_or_else(|| RepoError::from_persistence(format!("config row missing `{key}`")))?;
        u8::try_from(value)
            .map_err(|_| RepoError::from_persistence(format!("config `{key}` out of range")))
    };

    Ok(ScheduleConfig {
        is_enabled: row
            .get("is_enabled")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        start_hour: hour("start_hour")?,
        end_hour: hour("end_hour")?,
        modo: text(row, "modo")
            .as_deref()
            .and_then(GenerationMode::parse)
            .unwrap_or(GenerationMode::Automatico),
        tema: text(row, "tema"),
        publico_alvo: text(row, "publico_alvo"),
        updated_at: require_timestamp(row, "updated_at")?,
    })
}

fn text(row: &Map<String, Value>, key: &str) -> Option<String> {
    match row.get(key) {
        Some(Value::String(value)) if !value.is_empty() => Some(value.clone()),
        _ => None,
    }
}

fn require_text(row: &Map<String, Value>, key: &str) -> Result<String, RepoError> {
    text(row, key).ok_or_else(|| RepoError::from_persistence(format!("row missing `{key}`")))
}

fn require_i64(row: &Map<String, Value>, key: &str) -> Result<i64, RepoError> {
    row.get(key)
        .and_then(Value::as_i64)
        .ok_or_else(|| RepoError::from_persistence(format!("row missing numeric `{key}`")))
}

fn require_timestamp(row: &Map<String, Value>, key: &str) -> Result<DateTime<Utc>, RepoError> {
    let raw = require_text(row, key)?;
    parse_timestamp(&raw)
        .ok_or_else(|| RepoError::from_persistence(format!("row `{key}` is not a timestamp: {raw}")))
}

/// The managed store emits RFC 3339 with offset, but older rows carry bare
/// naive timestamps; both parse here.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
