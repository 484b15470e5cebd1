use std::path::Path;

use minijinja::Environment;
use minijinja::context;
use serde::Serialize;
use url::Url;

use crate::TypfigError;
use crate::TypfigResult;
use crate::extract::FigureRecord;

const GALLERY_TEMPLATE_NAME: &str = "gallery.html";

const GALLERY_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Typst Figure Gallery</title>
<style>
body { font-family: system-ui, sans-serif; padding: 20px; margin: 0; }
h1 { font-size: 1.2rem; border-bottom: 1px solid #ccc; padding-bottom: 10px; }
.gallery { display: grid; grid-template-columns: repeat(auto-fill, minmax(200px, 1fr)); gap: 16px; }
.card { border: 1px solid #ddd; border-radius: 6px; overflow: hidden; display: flex; flex-direction: column; }
.image-container { height: 150px; display: flex; align-items: center; justify-content: center; background: #f4f4f4; }
.image-container img { max-width: 100%; max-height: 100%; object-fit: contain; }
.caption { padding: 10px; font-size: 0.9em; }
.figure-number { font-weight: 600; margin-right: 6px; }
.label-id { font-family: monospace; color: #666; }
.line-number { display: block; font-size: 0.75em; color: #666; font-family: monospace; }
.caption p { margin: 4px 0 0; }
</style>
</head>
<body>
<h1>Figure Gallery ({{ figures | length }})</h1>
{% if figures %}
<div class="gallery">
{%- for fig in figures %}
<div class="card" data-path="{{ fig.source_path }}" data-line="{{ fig.line }}">
<div class="image-container"><img src="{{ fig.image_url }}" alt="{{ fig.caption }}"></div>
<div class="caption">
<span class="figure-number">Figure {{ fig.ordinal }}{% if fig.label %} <span class="label-id">{{ fig.label }}</span>{% endif %}</span>
<span class="line-number">{{ fig.source_file }}:{{ fig.line }}</span>
<p>{{ fig.caption }}</p>
</div>
</div>
{%- endfor %}
</div>
{% else %}
<p>No figures found in this file.</p>
{% endif %}
</body>
</html>
"#;

#[derive(Debug, Serialize)]
struct CardView<'a> {
	ordinal: usize,
	label: &'a str,
	caption: &'a str,
	source_file: &'a str,
	source_path: String,
	line: usize,
	image_url: String,
}

impl<'a> From<&'a FigureRecord> for CardView<'a> {
	fn from(figure: &'a FigureRecord) -> Self {
		Self {
			ordinal: figure.ordinal,
			label: &figure.label,
			caption: &figure.caption,
			source_file: &figure.source_file,
			source_path: figure.source_path.display().to_string(),
			line: figure.line,
			image_url: file_url(&figure.resolved_image),
		}
	}
}

/// Render a self-contained HTML page showing every figure as a card.
///
/// All figure text is HTML-escaped, so labels such as `<fig:plot>` show up
/// literally.
pub fn render_gallery_html(figures: &[FigureRecord]) -> TypfigResult<String> {
	let mut env = Environment::new();
	env.add_template(GALLERY_TEMPLATE_NAME, GALLERY_TEMPLATE)
		.map_err(|e| TypfigError::TemplateRender(e.to_string()))?;
	let template = env
		.get_template(GALLERY_TEMPLATE_NAME)
		.map_err(|e| TypfigError::TemplateRender(e.to_string()))?;

	let cards: Vec<CardView<'_>> = figures.iter().map(CardView::from).collect();
	template
		.render(context! { figures => cards })
		.map_err(|e| TypfigError::TemplateRender(e.to_string()))
}

/// A percent-encoded `file://` URL for `path`. Relative paths are emitted as
/// a relative reference.
fn file_url(path: &Path) -> String {
	Url::from_file_path(path).map_or_else(
		|()| path.to_string_lossy().replace('\\', "/"),
		String::from,
	)
}
