//! Playwright browser automation
//!
//! A scenario becomes one Node script driving a single page, so state such as
//! the counter value carries across steps. The script reports each step as a
//! JSON line on stdout.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tokio::process::Command as TokioCommand;
use tracing::{debug, info};

use crate::error::{E2eError, E2eResult};
use crate::spec::{TestSpec, TestStep};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }

    pub fn parse(name: &str) -> Self {
        match name {
            "firefox" => Browser::Firefox,
            "webkit" => Browser::Webkit,
            _ => Browser::Chromium,
        }
    }
}

/// Result of executing a test step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,
    pub step_name: String,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
}

/// One line of script output
#[derive(Debug, Deserialize)]
struct StepReport {
    index: usize,
    ok: bool,
    duration_ms: u64,
    #[serde(default)]
    error: Option<String>,
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub base_url: String,
    pub browser: Browser,
    pub headless: bool,
    /// Pass `--no-sandbox` (needed in most CI containers)
    pub no_sandbox: bool,
    /// Directory holding the `playwright` node module, exported as `NODE_PATH`
    pub node_modules: Option<PathBuf>,
    /// Upper bound for one scenario
    pub script_timeout: Duration,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            browser: Browser::Chromium,
            headless: true,
            no_sandbox: false,
            node_modules: None,
            script_timeout: Duration::from_secs(120),
        }
    }
}

/// Playwright browser driver
pub struct PlaywrightDriver {
    config: PlaywrightConfig,
}

impl PlaywrightDriver {
    /// Create a driver after checking Playwright is available
    pub fn new(config: PlaywrightConfig) -> E2eResult<Self> {
        Self::check_playwright_installed()?;
        Ok(Self::without_check(config))
    }

    /// Create a driver without probing for Playwright (script generation only)
    pub fn without_check(config: PlaywrightConfig) -> Self {
        Self { config }
    }

    fn check_playwright_installed() -> E2eResult<()> {
        let status = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    /// Run every step of `spec` in one browser page, stopping at the first failure
    pub async fn run_spec(&self, spec: &TestSpec) -> E2eResult<SpecResult> {
        let start = Instant::now();
        info!("Running scenario: {}", spec.name);

        let script = self.build_script(spec);
        let stdout = self.run_script(&script).await;

        let (stdout, script_error) = match stdout {
            Ok(out) => (out, None),
            Err(E2eError::Playwright(msg)) => (String::new(), Some(msg)),
            Err(e) => return Err(e),
        };

        let mut steps = Vec::new();
        let mut error = None;
        for line in stdout.lines() {
            let Ok(report) = serde_json::from_str::<StepReport>(line) else {
                debug!("[playwright] {}", line);
                continue;
            };
            let step_name = spec
                .steps
                .get(report.index)
                .map(TestStep::label)
                .unwrap_or_else(|| format!("step {}", report.index));
            if !report.ok && error.is_none() {
                error = Some(format!(
                    "{} failed: {}",
                    step_name,
                    report.error.as_deref().unwrap_or("unknown error")
                ));
            }
            steps.push(StepResult {
                success: report.ok,
                step_name,
                duration_ms: report.duration_ms,
                error: report.error,
            });
        }

        if error.is_none() {
            error = script_error;
        }
        if error.is_none() && steps.len() != spec.steps.len() {
            error = Some(format!(
                "only {} of {} steps reported",
                steps.len(),
                spec.steps.len()
            ));
        }

        Ok(SpecResult {
            name: spec.name.clone(),
            success: error.is_none(),
            duration_ms: start.elapsed().as_millis() as u64,
            steps,
            error,
        })
    }

    /// Build the Playwright script for a scenario
    pub fn build_script(&self, spec: &TestSpec) -> String {
        let launch_args = if self.config.no_sandbox {
            "['--no-sandbox']"
        } else {
            "[]"
        };

        let mut script = format!(
            r#"
const {{ chromium, firefox, webkit }} = require('playwright');

async function step(index, body) {{
  const started = Date.now();
  try {{
    await body();
    console.log(JSON.stringify({{ index, ok: true, duration_ms: Date.now() - started }}));
  }} catch (error) {{
    console.log(JSON.stringify({{ index, ok: false, duration_ms: Date.now() - started, error: error.message }}));
    throw error;
  }}
}}

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless}, args: {launch_args} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
  const page = await context.newPage();
  const baseUrl = {base_url};

  try {{
"#,
            browser = self.config.browser.as_str(),
            headless = self.config.headless,
            launch_args = launch_args,
            width = spec.viewport.width,
            height = spec.viewport.height,
            base_url = js_string(&self.config.base_url),
        );

        for (i, step) in spec.steps.iter().enumerate() {
            script.push_str(&format!("\n    // Step {}: {}\n", i + 1, step.label()));
            script.push_str(&format!("    await step({}, async () => {{\n", i));
            script.push_str(&step_to_js(step));
            script.push_str("\n    });\n");
        }

        script.push_str(
            r#"
  } catch (error) {
    process.exitCode = 1;
  } finally {
    await browser.close();
  }
})();
"#,
        );

        script
    }

    /// Execute a script with node and return its stdout
    pub async fn run_script(&self, script: &str) -> E2eResult<String> {
        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("scenario.js");
        std::fs::write(&script_path, script)?;

        debug!("Running Playwright script: {}", script_path.display());

        let mut cmd = TokioCommand::new("node");
        cmd.arg(&script_path).kill_on_drop(true);
        if let Some(modules) = &self.config.node_modules {
            cmd.env("NODE_PATH", modules);
        }

        let output = tokio::time::timeout(self.config.script_timeout, cmd.output())
            .await
            .map_err(|_| {
                E2eError::Playwright(format!(
                    "script exceeded {}s",
                    self.config.script_timeout.as_secs()
                ))
            })??;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // Step failures are reported on stdout; keep them for the caller.
            if stdout.lines().any(|l| l.contains("\"ok\":false")) {
                return Ok(stdout);
            }
            return Err(E2eError::Playwright(format!(
                "Script failed:\nstdout: {}\nstderr: {}",
                stdout, stderr
            )));
        }

        Ok(stdout)
    }
}

/// Quote a Rust string as a JavaScript string literal
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

fn step_to_js(step: &TestStep) -> String {
    match step {
        TestStep::Navigate {
            url,
            wait_for_selector,
        } => {
            let wait = wait_for_selector
                .as_ref()
                .map(|s| format!("\n      await page.waitForSelector({});", js_string(s)))
                .unwrap_or_default();
            format!(
                "      await page.goto(baseUrl + {}, {{ waitUntil: 'networkidle' }});{}",
                js_string(url),
                wait
            )
        }
        TestStep::Click {
            selector,
            timeout_ms,
        } => format!(
            "      await page.click({}, {{ timeout: {} }});",
            js_string(selector),
            timeout_ms.unwrap_or(5000)
        ),
        TestStep::Sleep { ms } => format!("      await page.waitForTimeout({});", ms),
        TestStep::Assert {
            selector,
            visible,
            text,
            text_contains,
            attribute,
            count,
        } => {
            let sel = js_string(selector);
            let mut lines = vec![format!("      const loc = page.locator({});", sel)];

            if let Some(c) = count {
                lines.push(format!(
                    "      const n = await loc.count();\n      if (n !== {c}) throw new Error(`expected {c} match(es) for ` + {sel} + `, got ${{n}}`);"
                ));
            } else {
                lines.push(format!(
                    "      if ((await loc.count()) === 0) throw new Error('no element matches ' + {sel});"
                ));
            }

            if let Some(vis) = visible {
                lines.push(format!(
                    "      if ((await loc.first().isVisible()) !== {vis}) throw new Error({sel} + ' visible !== {vis}');"
                ));
            }

            if let Some(t) = text {
                lines.push(format!(
                    "      const text = (await loc.first().innerText()).trim();\n      if (text !== {exp}) throw new Error(`expected text ${{JSON.stringify({exp})}}, got ${{JSON.stringify(text)}}`);",
                    exp = js_string(t)
                ));
            }

            if let Some(tc) = text_contains {
                lines.push(format!(
                    "      const haystack = await loc.first().innerText();\n      if (!haystack.includes({exp})) throw new Error(`text ${{JSON.stringify(haystack)}} lacks ${{JSON.stringify({exp})}}`);",
                    exp = js_string(tc)
                ));
            }

            if let Some(attr) = attribute {
                lines.push(format!(
                    "      const attr = await loc.first().getAttribute({});",
                    js_string(&attr.name)
                ));
                if let Some(val) = &attr.value {
                    lines.push(format!(
                        "      if (attr !== {exp}) throw new Error(`attribute {name} is ${{JSON.stringify(attr)}}`);",
                        exp = js_string(val),
                        name = attr.name
                    ));
                }
                if let Some(part) = &attr.contains {
                    lines.push(format!(
                        "      if (attr === null || !attr.includes({exp})) throw new Error(`attribute {name} ${{JSON.stringify(attr)}} lacks ${{JSON.stringify({exp})}}`);",
                        exp = js_string(part),
                        name = attr.name
                    ));
                }
            }

            lines.join("\n")
        }
        TestStep::AssertTitle { title } => format!(
            "      const title = await page.title();\n      if (title !== {exp}) throw new Error(`expected title ${{JSON.stringify({exp})}}, got ${{JSON.stringify(title)}}`);",
            exp = js_string(title)
        ),
        TestStep::Evaluate { script, expected } => {
            let mut js = format!(
                "      const value = await page.evaluate(async () => {{ {} }});",
                script
            );
            if let Some(exp) = expected {
                js.push_str(&format!(
                    "\n      const expected = {};\n      if (JSON.stringify(value) !== JSON.stringify(expected)) throw new Error(`expected ${{JSON.stringify(expected)}}, got ${{JSON.stringify(value)}}`);",
                    exp
                ));
            }
            js
        }
        TestStep::Log { message } => {
            format!("      console.error('[TEST] ' + {});", js_string(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver() -> PlaywrightDriver {
        PlaywrightDriver::without_check(PlaywrightConfig {
            no_sandbox: true,
            ..Default::default()
        })
    }

    #[test]
    fn test_browser_parse() {
        assert_eq!(Browser::parse("firefox"), Browser::Firefox);
        assert_eq!(Browser::parse("webkit"), Browser::Webkit);
        assert_eq!(Browser::parse("anything"), Browser::Chromium);
    }

    #[test]
    fn test_js_string_escapes_quotes() {
        assert_eq!(js_string("it's \"x\""), r#""it's \"x\"""#);
    }

    #[test]
    fn test_script_has_one_block_per_step() {
        let spec = TestSpec::from_yaml(
            r#"
name: increments
steps:
  - action: navigate
    url: /
  - action: click
    selector: '#increment'
  - action: assert_title
    title: 4 Fresh Counters
"#,
        )
        .unwrap();

        let script = driver().build_script(&spec);
        assert!(script.contains("args: ['--no-sandbox']"));
        assert!(script.contains(r#"const baseUrl = "http://localhost:8000";"#));
        assert!(script.contains("await step(0, async () => {"));
        assert!(script.contains("await step(2, async () => {"));
        assert!(!script.contains("await step(3,"));
        assert!(script.contains(r##"await page.click("#increment", { timeout: 5000 });"##));
        assert!(script.contains(r#"if (title !== "4 Fresh Counters")"#));
    }

    #[test]
    fn test_assert_step_checks_attribute_and_text() {
        let step = TestStep::Assert {
            selector: "#increment".into(),
            visible: None,
            text: Some("+1".into()),
            text_contains: None,
            attribute: Some(crate::spec::AttributeAssertion {
                name: "class".into(),
                value: None,
                contains: Some("rounded-sm".into()),
            }),
            count: None,
        };
        let js = step_to_js(&step);
        assert!(js.contains(r#"if (text !== "+1")"#));
        assert!(js.contains(r#"attr.includes("rounded-sm")"#));
    }

    #[test]
    fn test_evaluate_compares_expected_json() {
        let step = TestStep::Evaluate {
            script: "return fetch('/api/a').then((r) => r.text());".into(),
            expected: Some(serde_json::json!("Hello, A!")),
        };
        let js = step_to_js(&step);
        assert!(js.contains("page.evaluate(async () => { return fetch('/api/a')"));
        assert!(js.contains(r#"const expected = "Hello, A!";"#));
    }
}
