//! Embedded static assets

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// Serve an embedded asset by path, relative to the asset root
pub fn serve(path: &str) -> Response {
    let content_type = guess_content_type(path);

    match path.trim_start_matches('/') {
        "logo.svg" => serve_embedded(LOGO_SVG, content_type),
        "counter.js" => serve_embedded(COUNTER_JS, content_type),
        _ => (StatusCode::NOT_FOUND, "File not found").into_response(),
    }
}

fn guess_content_type(path: &str) -> &'static str {
    if path.ends_with(".js") {
        "application/javascript"
    } else if path.ends_with(".css") {
        "text/css"
    } else if path.ends_with(".svg") {
        "image/svg+xml"
    } else {
        "application/octet-stream"
    }
}

fn serve_embedded(content: &'static str, content_type: &'static str) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type)],
        content,
    )
        .into_response()
}

const LOGO_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="128" height="128" viewBox="0 0 128 128">
  <circle cx="64" cy="64" r="56" fill="#facc15"/>
  <circle cx="64" cy="64" r="46" fill="#fef08a"/>
  <g stroke="#facc15" stroke-width="4" stroke-linecap="round">
    <line x1="64" y1="22" x2="64" y2="106"/>
    <line x1="22" y1="64" x2="106" y2="64"/>
    <line x1="34" y1="34" x2="94" y2="94"/>
    <line x1="94" y1="34" x2="34" y2="94"/>
  </g>
  <path d="M64 120 q-6 -10 0 -16 q6 6 0 16z" fill="#facc15"/>
</svg>
"##;

// Counter island. Mirrors `crate::counter`: decrement clamps at 1, values
// below 1 are pulled back up, and the title follows the plural rule.
const COUNTER_JS: &str = r#"(function () {
  var root = document.querySelector('[data-island="counter"]');
  if (!root) return;
  var display = root.querySelector('.tabular-nums');
  var count = parseInt(root.getAttribute('data-count'), 10);
  if (isNaN(count)) count = 3;

  function title(c) {
    return c + ' Fresh Counter' + (Math.abs(c) === 1 ? '' : 's');
  }

  function set(next) {
    count = next < 1 ? 1 : next;
    display.textContent = String(count);
    document.title = title(count);
  }

  root.querySelector('#increment').addEventListener('click', function () {
    set(count + 1);
  });
  root.querySelector('#decrement').addEventListener('click', function () {
    set(Math.max(1, count - 1));
  });

  set(count);
})();
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_types() {
        assert_eq!(guess_content_type("counter.js"), "application/javascript");
        assert_eq!(guess_content_type("logo.svg"), "image/svg+xml");
        assert_eq!(guess_content_type("styles.css"), "text/css");
        assert_eq!(guess_content_type("blob"), "application/octet-stream");
    }

    #[test]
    fn test_serve_known_and_unknown() {
        assert_eq!(serve("logo.svg").status(), StatusCode::OK);
        assert_eq!(serve("/counter.js").status(), StatusCode::OK);
        assert_eq!(serve("missing.js").status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_island_script_clamps_at_one() {
        assert!(COUNTER_JS.contains("Math.max(1, count - 1)"));
        assert!(COUNTER_JS.contains("Math.abs(c) === 1 ? '' : 's'"));
    }
}
