//! Field normalization: loosely-shaped generator payloads → the fixed
//! persisted post schema.
//!
//! The upstream generator emits whatever key names its prompt template
//! produced, several of them resembling serialized HTML tags and attributes
//! (`meta name="description"`, `h2_3`, `img_6`). The whole external-key
//! contract lives in [`keys`] so the boundary stays auditable in one place.
//!
//! Normalization is a best-effort structural copy, not a validating parser:
//! it never fails, performs no sanitization, and leaves absent fields
//! absent. An empty payload still yields a record with the placeholder
//! title and its derived slug.

use serde_json::{Map, Value};
use url::Url;

use crate::domain::entities::{
    DYNAMIC_SECTION_SLOTS, DynamicSection, INGREDIENT_SLOTS, LEGACY_IMAGE_SLOTS,
    LEGACY_SECTION_SLOTS, LegacySection, NewPost, PostBody, STEP_SLOTS, SeoFields,
};
use crate::domain::slug::slug_for_title;
use crate::domain::types::{GenerationMode, PostStatus, PostType};

/// Title used when the payload carries none.
pub const PLACEHOLDER_TITLE: &str = "Post sem título";

/// External-key contract of the upstream generator. Every key the
/// normalizer reads is named here and nowhere else.
pub mod keys {
    pub const TITULO: &str = "titulo";
    pub const POST_TYPE: &str = "post_type";
    pub const MODO: &str = "modo";
    pub const RESUMO: &str = "resumo";
    pub const CONCLUSAO: &str = "conclusao";
    pub const IMAGEM_PRINCIPAL: &str = "imagem_principal";
    pub const IMAGEM_PRINCIPAL_ALT: &str = "imagem_principal_alt";

    // SEO keys arrive as serialized HTML attribute strings.
    pub const META_DESCRIPTION: &str = "meta name=\"description\"";
    pub const META_KEYWORDS: &str = "meta name=\"keywords\"";
    pub const OG_TITLE: &str = "meta property=\"og:title\"";
    pub const OG_DESCRIPTION: &str = "meta property=\"og:description\"";
    pub const OG_URL: &str = "meta property=\"og:url\"";
    pub const TWITTER_TITLE: &str = "meta name=\"twitter:title\"";
    pub const TWITTER_DESCRIPTION: &str = "meta name=\"twitter:description\"";

    // Recipe group.
    pub const TITULO_INGREDIENTES: &str = "titulo_ingredientes";
    pub const TITULO_MODO_DE_PREPARO: &str = "titulo_modo_de_preparo";

    // News group.
    pub const FONTE: &str = "fonte";

    // CTA block.
    pub const CTA_TITULO: &str = "cta_titulo";
    pub const CTA_TEXTO: &str = "cta_texto";

    pub fn ingrediente(index: u8) -> String {
        format!("ingrediente_{index}")
    }

    pub fn modo_de_preparo(index: u8) -> String {
        format!("modo_de_preparo_{index}")
    }

    pub fn subtitulo(index: u8) -> String {
        format!("subtitulo_{index}")
    }

    pub fn paragrafo(index: u8) -> String {
        format!("paragrafo_{index}")
    }

    // Legacy section keys mimic the HTML tags they once rendered into.
    pub fn legacy_title(index: u8) -> String {
        format!("h2_{index}")
    }

    pub fn legacy_text(index: u8) -> String {
        format!("p_{index}")
    }

    pub fn legacy_image(index: u8) -> String {
        format!("img_{index}")
    }

    pub fn legacy_image_alt(index: u8) -> String {
        format!("alt_img_{index}")
    }
}

/// Per-run context the normalizer cannot read from the payload itself.
#[derive(Debug, Clone)]
pub struct NormalizeContext<'a> {
    /// Mode declared by the trigger; recorded on every resulting post.
    pub modo: GenerationMode,
    /// Public site base used to build the canonical `og:url` default.
    pub site_base_url: &'a Url,
}

/// Convert one raw payload object into an insert-ready post.
pub fn normalize(raw: &Map<String, Value>, ctx: &NormalizeContext<'_>) -> NewPost {
    let titulo = text(raw, keys::TITULO)
        .unwrap_or_else(|| PLACEHOLDER_TITLE.to_string());
    let slug = slug_for_title(&titulo);
    let post_type = text(raw, keys::POST_TYPE)
        .as_deref()
        .and_then(PostType::parse);
    let modo = text(raw, keys::MODO)
        .as_deref()
        .and_then(GenerationMode::parse)
        .unwrap_or(ctx.modo);

    let mut body = PostBody {
        resumo: text(raw, keys::RESUMO),
        conclusao: text(raw, keys::CONCLUSAO),
        imagem_principal: text(raw, keys::IMAGEM_PRINCIPAL),
        imagem_principal_alt: text(raw, keys::IMAGEM_PRINCIPAL_ALT),
        ..PostBody::default()
    };

    match post_type {
        Some(PostType::Receita) => {
            copy_recipe_fields(raw, &mut body);
            copy_dynamic_sections(raw, &mut body);
        }
        Some(PostType::Noticia) => {
            body.fonte = text(raw, keys::FONTE);
            copy_dynamic_sections(raw, &mut body);
        }
        None => {}
    }

    // Legacy posts predate the type discriminator, so this sweep runs for
    // every payload regardless of `post_type`.
    copy_legacy_sections(raw, &mut body);
    body.cta.titulo = text(raw, keys::CTA_TITULO);
    body.cta.texto = text(raw, keys::CTA_TEXTO);

    let seo = resolve_seo(raw, &titulo, body.resumo.as_deref(), &slug, ctx);

    NewPost {
        slug,
        titulo,
        post_type,
        body,
        seo,
        modo,
        status: PostStatus::Publicado,
    }
}

fn copy_recipe_fields(raw: &Map<String, Value>, body: &mut PostBody) {
    body.recipe.titulo_ingredientes = text(raw, keys::TITULO_INGREDIENTES);
    body.recipe.titulo_modo_de_preparo = text(raw, keys::TITULO_MODO_DE_PREPARO);

    for index in 1..=INGREDIENT_SLOTS {
        if let Some(value) = text(raw, &keys::ingrediente(index)) {
            body.recipe.ingredientes.set(index, INGREDIENT_SLOTS, value);
        }
    }
    for index in 1..=STEP_SLOTS {
        if let Some(value) = text(raw, &keys::modo_de_preparo(index)) {
            body.recipe.modo_de_preparo.set(index, STEP_SLOTS, value);
        }
    }
}

fn copy_dynamic_sections(raw: &Map<String, Value>, body: &mut PostBody) {
    for index in 1..=DYNAMIC_SECTION_SLOTS {
        let section = DynamicSection {
            subtitulo: text(raw, &keys::subtitulo(index)),
            paragrafo: text(raw, &keys::paragrafo(index)),
        };
        if !section.is_empty() {
            body.dynamic_sections.insert(index, section);
        }
    }
}

fn copy_legacy_sections(raw: &Map<String, Value>, body: &mut PostBody) {
    for index in 1..=LEGACY_SECTION_SLOTS {
        let mut section = LegacySection {
            subtitulo: text(raw, &keys::legacy_title(index)),
            texto: text(raw, &keys::legacy_text(index)),
            ..LegacySection::default()
        };
        if LEGACY_IMAGE_SLOTS.contains(&index) {
            section.imagem = text(raw, &keys::legacy_image(index));
            section.imagem_alt = text(raw, &keys::legacy_image_alt(index));
        }
        if !section.is_empty() {
            body.legacy_sections.insert(index, section);
        }
    }
}

/// Resolve each SEO field through its fallback chain: explicit key →
/// content-equivalent field → computed default.
fn resolve_seo(
    raw: &Map<String, Value>,
    titulo: &str,
    resumo: Option<&str>,
    slug: &str,
    ctx: &NormalizeContext<'_>,
) -> SeoFields {
    let resumo_owned = resumo.map(str::to_string);

    SeoFields {
        meta_description: text(raw, keys::META_DESCRIPTION).or_else(|| resumo_owned.clone()),
        meta_keywords: text(raw, keys::META_KEYWORDS),
        og_title: text(raw, keys::OG_TITLE).or_else(|| Some(titulo.to_string())),
        og_description: text(raw, keys::OG_DESCRIPTION).or_else(|| resumo_owned.clone()),
        og_url: text(raw, keys::OG_URL).or_else(|| canonical_url(ctx.site_base_url, slug)),
        twitter_title: text(raw, keys::TWITTER_TITLE).or_else(|| Some(titulo.to_string())),
        twitter_description: text(raw, keys::TWITTER_DESCRIPTION).or_else(|| resumo_owned),
    }
}

fn canonical_url(base: &Url, slug: &str) -> Option<String> {
    base.join(&format!("blog/{slug}"))
        .map(|url| url.to_string())
        .ok()
}

/// Non-empty string value at `key`; everything else reads as absent.
fn text(raw: &Map<String, Value>, key: &str) -> Option<String> {
    match raw.get(key) {
        Some(Value::String(value)) if !value.trim().is_empty() => Some(value.clone()),
        _ => None,
    }
}
