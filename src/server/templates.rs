//! Template rendering using minijinja with embedded templates.

use minijinja::{Environment, Error as JinjaError, ErrorKind};
use rust_embed::Embed;
use serde::Serialize;

use crate::share_service::{DEFAULT_PAGE_LIMIT, MAX_CONTENT_LENGTH};
use crate::storage::SharedItem;

/// Embedded HTML templates.
#[derive(Embed)]
#[folder = "templates/"]
pub struct Templates;

/// A template engine for rendering pages.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create a new template engine with embedded templates.
    pub fn new() -> Result<Self, JinjaError> {
        let mut env = Environment::new();

        for file in Templates::iter() {
            let filename = file.to_string();
            if let Some(content) = Templates::get(&filename) {
                let template_str = std::str::from_utf8(content.data.as_ref())
                    .map_err(|_| JinjaError::from(ErrorKind::InvalidOperation))?;
                env.add_template_owned(filename, template_str.to_string())?;
            }
        }

        Ok(Self { env })
    }

    /// Render the home page: submission form plus the session's list.
    pub fn render_index(&self) -> Result<String, JinjaError> {
        let template = self.env.get_template("index.html")?;
        template.render(minijinja::context! {
            max_content_length => MAX_CONTENT_LENGTH,
            page_limit => DEFAULT_PAGE_LIMIT,
        })
    }

    /// Render a share page, locked or unlocked.
    pub fn render_share(&self, view: &ShareView) -> Result<String, JinjaError> {
        let template = self.env.get_template("share.html")?;
        template.render(minijinja::context! { share => view })
    }

    /// Render the page shown for an unknown slug.
    pub fn render_not_found(&self) -> Result<String, JinjaError> {
        let template = self.env.get_template("not_found.html")?;
        template.render(minijinja::context! {})
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new().expect("failed to initialize template engine")
    }
}

/// A view model for rendering a share page.
///
/// `content` is only filled in once the share is unlocked, so a locked page
/// never carries the text.
#[derive(Debug, Clone, Serialize)]
pub struct ShareView {
    pub slug: String,
    pub content: Option<String>,
    pub created_at: String,
    pub created_at_display: String,
    pub protected: bool,
    pub locked: bool,
    /// A wrong password was just submitted
    pub incorrect: bool,
}

impl ShareView {
    /// Build the view for `item`; `unlocked` is true once a matching password
    /// has been submitted.
    pub fn new(item: &SharedItem, unlocked: bool, incorrect: bool) -> Self {
        let locked = item.has_password() && !unlocked;

        Self {
            slug: item.slug.clone(),
            content: (!locked).then(|| item.content.clone()),
            created_at: item.created_at.to_rfc3339(),
            created_at_display: item.created_at.format("%b %-d, %Y, %H:%M UTC").to_string(),
            protected: item.has_password(),
            locked,
            incorrect,
        }
    }
}
