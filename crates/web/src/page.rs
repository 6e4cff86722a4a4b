//! Home page rendering

use crate::counter::Counter;

const BUTTON_CLASS: &str =
    "px-2 py-1 border-gray-500 border-2 rounded-sm bg-white hover:bg-gray-200 transition-colors";

/// Render the home page with the counter island at `counter`'s value
pub fn render_home(counter: &Counter) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title}</title>
  <style>{STYLE}</style>
</head>
<body>
  <div class="px-4 py-8 mx-auto fresh-gradient">
    <div class="max-w-screen-md mx-auto flex flex-col items-center justify-center">
      <img class="my-6" src="/logo.svg" width="128" height="128" alt="the Fresh logo: a sliced lemon dripping with juice">
      <h1 class="text-4xl font-bold">Welcome to Fresh</h1>
      <p class="my-4">
        Try updating this message in the
        <code class="mx-2">./routes/index.tsx</code> file, and refresh.
      </p>
      {island}
    </div>
  </div>
  <script src="/static/counter.js"></script>
</body>
</html>
"#,
        title = counter.title(),
        STYLE = STYLE,
        island = render_counter(counter),
    )
}

fn render_counter(counter: &Counter) -> String {
    format!(
        r#"<div class="flex gap-8 py-6" data-island="counter" data-count="{count}">
        <button id="decrement" class="{BUTTON_CLASS}">-1</button>
        <p class="text-3xl tabular-nums">{count}</p>
        <button id="increment" class="{BUTTON_CLASS}">+1</button>
      </div>"#,
        count = counter.value(),
        BUTTON_CLASS = BUTTON_CLASS,
    )
}

const STYLE: &str = "\
body{margin:0;font-family:system-ui,sans-serif}\
.fresh-gradient{background:linear-gradient(to right bottom,#86efac,#bbf7d0)}\
.px-4{padding-left:1rem;padding-right:1rem}.py-8{padding-top:2rem;padding-bottom:2rem}\
.mx-auto{margin-left:auto;margin-right:auto}.max-w-screen-md{max-width:768px}\
.flex{display:flex}.flex-col{flex-direction:column}.items-center{align-items:center}\
.justify-center{justify-content:center}.my-6{margin:1.5rem 0}.my-4{margin:1rem 0}\
.mx-2{margin:0 .5rem}.text-4xl{font-size:2.25rem}.font-bold{font-weight:700}\
.gap-8{gap:2rem}.py-6{padding:1.5rem 0}.text-3xl{font-size:1.875rem}\
.tabular-nums{font-variant-numeric:tabular-nums}\
.px-2{padding-left:.5rem;padding-right:.5rem}.py-1{padding-top:.25rem;padding-bottom:.25rem}\
.border-2{border-style:solid;border-width:2px}.border-gray-500{border-color:#6b7280}\
.rounded-sm{border-radius:.125rem}.bg-white{background:#fff}\
.hover\\:bg-gray-200:hover{background:#e5e7eb}";
