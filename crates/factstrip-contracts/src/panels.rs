use serde::{Deserialize, Serialize};

/// One of the four fixed narrative beats. The index is the grid position and
/// never changes for the lifetime of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelRole {
    Introduction,
    Investigation,
    Evidence,
    Conclusion,
}

impl PanelRole {
    pub const ALL: [PanelRole; 4] = [
        PanelRole::Introduction,
        PanelRole::Investigation,
        PanelRole::Evidence,
        PanelRole::Conclusion,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::Introduction => 0,
            Self::Investigation => 1,
            Self::Evidence => 2,
            Self::Conclusion => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Human-facing label, 1-based.
    pub fn label(self) -> String {
        format!("Panel {}", self.index() + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialogue {
    pub role: PanelRole,
    pub text: String,
}

/// Exactly four dialogues in role order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelScript {
    dialogues: [Dialogue; 4],
}

impl PanelScript {
    pub fn new(texts: [String; 4]) -> Self {
        let [a, b, c, d] = texts;
        Self {
            dialogues: [
                Dialogue {
                    role: PanelRole::Introduction,
                    text: a,
                },
                Dialogue {
                    role: PanelRole::Investigation,
                    text: b,
                },
                Dialogue {
                    role: PanelRole::Evidence,
                    text: c,
                },
                Dialogue {
                    role: PanelRole::Conclusion,
                    text: d,
                },
            ],
        }
    }

    pub fn get(&self, role: PanelRole) -> &Dialogue {
        &self.dialogues[role.index()]
    }

    pub fn text(&self, role: PanelRole) -> &str {
        self.get(role).text.as_str()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dialogue> {
        self.dialogues.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{PanelRole, PanelScript};

    #[test]
    fn roles_round_trip_through_index() {
        for (idx, role) in PanelRole::ALL.iter().enumerate() {
            assert_eq!(role.index(), idx);
            assert_eq!(PanelRole::from_index(idx), Some(*role));
        }
        assert_eq!(PanelRole::from_index(4), None);
        assert_eq!(PanelRole::Conclusion.label(), "Panel 4");
    }

    #[test]
    fn script_keeps_assignment_order() {
        let script = PanelScript::new([
            "hook".to_string(),
            "dig".to_string(),
            "proof".to_string(),
            "verdict".to_string(),
        ]);
        let roles: Vec<PanelRole> = script.iter().map(|dialogue| dialogue.role).collect();
        assert_eq!(roles, PanelRole::ALL.to_vec());
        assert_eq!(script.text(PanelRole::Introduction), "hook");
        assert_eq!(script.text(PanelRole::Conclusion), "verdict");
    }
}
