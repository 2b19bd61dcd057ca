use factstrip_contracts::{PanelRole, Style};

const FRAGMENT_MAX_CHARS: usize = 320;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelPrompt {
    pub prompt: String,
    pub negative_prompt: Option<String>,
}

fn role_scene(role: PanelRole, statement: &str) -> String {
    match role {
        PanelRole::Introduction => {
            format!(
                "Curious character asking a question about '{statement}', thoughtful expression"
            )
        }
        PanelRole::Investigation => {
            "Character investigating with scientific tools, examining clues, focused expression"
                .to_string()
        }
        PanelRole::Evidence => {
            "Character demonstrating details, showing evidence, visual aids".to_string()
        }
        PanelRole::Conclusion => {
            "Character giving the conclusion, satisfied expression, successful resolution"
                .to_string()
        }
    }
}

fn topic_characters(statement: &str) -> &'static str {
    let topic = statement.to_lowercase();
    if topic.contains("bee") || topic.contains("insect") {
        "cute cartoon bees, garden setting, flowers"
    } else if topic.contains("animal") {
        "friendly animals, natural habitat"
    } else if topic.contains("science") || topic.contains("tech") {
        "scientists, researchers, lab setting"
    } else {
        "diverse people, educational setting"
    }
}

fn clean_fragment(fragment: Option<&str>) -> Option<String> {
    let collapsed = fragment?.split_whitespace().collect::<Vec<&str>>().join(" ");
    let trimmed = collapsed.trim_end_matches(['.', ' ']);
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(FRAGMENT_MAX_CHARS).collect())
}

/// Prompt for one independently generated panel. `fragment` is the
/// topic-specific visual description supplied by the text service, if any.
pub fn panel_prompt(
    style: Style,
    statement: &str,
    role: PanelRole,
    fragment: Option<&str>,
) -> PanelPrompt {
    let mut parts = vec![
        style.prompt_base().to_string(),
        role_scene(role, statement),
        topic_characters(statement).to_string(),
    ];
    if let Some(fragment) = clean_fragment(fragment) {
        parts.push(fragment);
    }
    parts.push("Space for speech bubble at the top. Single comic panel".to_string());
    PanelPrompt {
        prompt: format!("{}, {}", parts.join(". "), style.prompt_suffix()),
        negative_prompt: style.negative_prompt().map(str::to_string),
    }
}

/// Prompt for one wide image holding all four panels side by side.
pub fn strip_prompt(
    style: Style,
    statement: &str,
    fragments: &[Option<&str>; 4],
) -> PanelPrompt {
    let mut parts = vec![
        style.prompt_base().to_string(),
        "Four-panel comic strip in a single horizontal row, four panels of equal width read left to right, the same characters in every panel".to_string(),
    ];
    for role in PanelRole::ALL {
        let mut beat = format!("{}: {}", role.label(), role_scene(role, statement));
        if let Some(fragment) = clean_fragment(fragments[role.index()]) {
            beat.push_str("; ");
            beat.push_str(&fragment);
        }
        parts.push(beat);
    }
    parts.push(topic_characters(statement).to_string());
    parts.push(
        "Leave space for a speech bubble at the top of each panel, no text or lettering"
            .to_string(),
    );
    PanelPrompt {
        prompt: format!("{}, {}", parts.join(". "), style.prompt_suffix()),
        negative_prompt: style.negative_prompt().map(str::to_string),
    }
}
