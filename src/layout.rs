//! Page layout wrapper

use maud::{DOCTYPE, Markup, PreEscaped, html};

/// Wraps rendered page body with standard HTML structure
///
/// # Arguments
///
/// * `title`: Page title text
/// * `site_name`: Site name appended to the title
/// * `body`: Rendered HTML body, inserted without escaping
///
/// # Returns
///
/// Complete HTML document
pub fn page(title: &str, site_name: &str, body: &str) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " - " (site_name) }
            }
            body {
                main class="container markdown-body" {
                    (PreEscaped(body))
                }
            }
        }
    }
}
