//! Prompt catalog
//!
//! Every route has a named template. Route templates embed the shared
//! persona through `${agent_prompt}`. Substitution is "safe": placeholders
//! without a value stay in the text verbatim, and `$$` is a literal `$`.

use crate::classifier::Intent;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

const BUILTIN: [(&str, &str); 9] = [
    ("agent", include_str!("../prompts/agent.txt")),
    ("intent", include_str!("../prompts/intent.txt")),
    ("greet", include_str!("../prompts/greet.txt")),
    ("question", include_str!("../prompts/question.txt")),
    ("schedule", include_str!("../prompts/schedule.txt")),
    ("review", include_str!("../prompts/review.txt")),
    ("reschedule", include_str!("../prompts/reschedule.txt")),
    ("cancel", include_str!("../prompts/cancel.txt")),
    ("leave", include_str!("../prompts/leave.txt")),
];

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("failed to read prompt {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Rendered system prompts, one per LLM call site
#[derive(Debug, Clone)]
pub struct Prompts {
    intent: String,
    greet: String,
    routes: HashMap<Intent, String>,
}

impl Prompts {
    /// Built-in templates only
    pub fn builtin() -> Self {
        Self::render(&BUILTIN.iter().map(|(k, v)| (*k, (*v).to_string())).collect())
    }

    /// Built-in templates, each replaced by `<dir>/<name>.txt` when present
    pub fn load(dir: Option<&Path>) -> Result<Self, PromptError> {
        let mut templates: HashMap<&str, String> =
            BUILTIN.iter().map(|(k, v)| (*k, (*v).to_string())).collect();

        if let Some(dir) = dir {
            for (name, _) in BUILTIN {
                let path = dir.join(format!("{name}.txt"));
                match std::fs::read_to_string(&path) {
                    Ok(text) => {
                        tracing::info!(prompt = name, path = %path.display(), "Prompt override loaded");
                        templates.insert(name, text);
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(source) => return Err(PromptError::Io { path, source }),
                }
            }
        }

        Ok(Self::render(&templates))
    }

    fn render(templates: &HashMap<&str, String>) -> Self {
        let get = |name: &str| templates.get(name).map_or("", String::as_str);

        let agent = safe_substitute(get("agent"), &HashMap::new());
        let vars = HashMap::from([("agent_prompt", agent.as_str())]);

        let routes = Intent::ALL
            .into_iter()
            .map(|intent| {
                let text = match intent {
                    // no template of its own: the persona alone
                    Intent::Unclear => agent.clone(),
                    other => safe_substitute(get(other.as_str()), &vars),
                };
                (intent, text)
            })
            .collect();

        Self {
            intent: safe_substitute(get("intent"), &HashMap::new()),
            greet: safe_substitute(get("greet"), &vars),
            routes,
        }
    }

    /// Classifier prompt
    pub fn intent(&self) -> &str {
        &self.intent
    }

    pub fn greet(&self) -> &str {
        &self.greet
    }

    /// System prompt of the route bound to `intent`
    pub fn route(&self, intent: Intent) -> &str {
        self.routes.get(&intent).map_or("", String::as_str)
    }
}

/// `$name` / `${name}` substitution that leaves unknown placeholders intact
pub fn safe_substitute(template: &str, vars: &HashMap<&str, &str>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }

        match chars.peek().map(|(_, c)| *c) {
            Some('$') => {
                chars.next();
                out.push('$');
            }
            Some('{') => {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                match vars.get(name.as_str()) {
                    Some(value) if closed && is_identifier(&name) => out.push_str(value),
                    _ => {
                        out.push_str("${");
                        out.push_str(&name);
                        if closed {
                            out.push('}');
                        }
                    }
                }
            }
            Some(c) if c == '_' || c.is_ascii_alphabetic() => {
                let mut name = String::new();
                while let Some((_, c)) = chars.peek().copied() {
                    if c == '_' || c.is_ascii_alphanumeric() {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match vars.get(name.as_str()) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('$');
                        out.push_str(&name);
                    }
                }
            }
            _ => out.push('$'),
        }
    }

    out
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}
