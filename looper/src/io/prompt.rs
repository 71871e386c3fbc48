//! Prompt templates for the delegated executor.

use anyhow::Result;
use minijinja::{Environment, context};

const PERSONA_TEMPLATE: &str = include_str!("prompts/persona.md");
const SEED_TEMPLATE: &str = include_str!("prompts/seed.md");

/// Template engine wrapper around minijinja.
pub struct PromptSet {
    env: Environment<'static>,
}

impl PromptSet {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("persona", PERSONA_TEMPLATE)
            .expect("persona template should be valid");
        env.add_template("seed", SEED_TEMPLATE)
            .expect("seed template should be valid");
        Self { env }
    }

    /// System prompt framing the executor persona around the objective.
    pub fn render_persona(&self, objective: &str) -> Result<String> {
        let template = self.env.get_template("persona")?;
        Ok(template.render(context! { objective => objective.trim() })?)
    }

    /// System prompt asking the provider for the initial task list.
    pub fn render_seed(&self, objective: &str) -> Result<String> {
        let template = self.env.get_template("seed")?;
        Ok(template.render(context! { objective => objective.trim() })?)
    }
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persona_interpolates_the_objective() {
        let prompts = PromptSet::new();
        let rendered = prompts
            .render_persona("  Ship the release  ")
            .expect("render");
        assert!(rendered.contains("Objective: Ship the release"));
    }

    #[test]
    fn seed_asks_for_a_numbered_list() {
        let prompts = PromptSet::new();
        let rendered = prompts.render_seed("Ship the release").expect("render");
        assert!(rendered.contains("numbered list"));
        assert!(rendered.contains("Ship the release"));
    }
}
