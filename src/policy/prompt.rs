//! Prompt selection for policy generation.

use crate::domain::SAFE_CO2_BAND;

/// Which prompt a CO2 level calls for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PromptKind {
    /// No usable level: general urban carbon-management advice.
    General,
    /// Level inside the safe band: a single positive acknowledgement.
    Acknowledgement { co2_ppm: f64 },
    /// Level outside the safe band: recommendations targeting that level.
    Targeted { co2_ppm: f64 },
}

impl PromptKind {
    /// Choose the prompt for `co2_level`; `None` and NaN select `General`.
    pub fn select(co2_level: Option<f64>) -> Self {
        let Some(level) = co2_level.filter(|v| v.is_finite()) else {
            return PromptKind::General;
        };
        let (low, high) = SAFE_CO2_BAND;
        if (low..=high).contains(&level) {
            PromptKind::Acknowledgement { co2_ppm: level }
        } else {
            PromptKind::Targeted { co2_ppm: level }
        }
    }

    /// Whether the model is expected to answer with a numbered list.
    pub fn expects_list(self) -> bool {
        !matches!(self, PromptKind::Acknowledgement { .. })
    }

    pub fn render(self) -> String {
        match self {
            PromptKind::General => "Generate 5 concise policy recommendations for urban carbon management. \
                 Each recommendation should be a single sentence, numbered 1 to 5."
                .to_string(),
            PromptKind::Acknowledgement { co2_ppm } => format!(
                "The measured CO2 level in this urban area is {co2_ppm} ppm, which is within the healthy \
                 range of {low} to {high} ppm. Write one short, positive sentence acknowledging this and \
                 encouraging residents to keep it that way. Do not write a numbered list.",
                low = SAFE_CO2_BAND.0,
                high = SAFE_CO2_BAND.1,
            ),
            PromptKind::Targeted { co2_ppm } => format!(
                "The measured CO2 level in this urban area is {co2_ppm} ppm. Generate 5 concise policy \
                 recommendations that specifically address a CO2 level of {co2_ppm} ppm. Each \
                 recommendation should be a single sentence, numbered 1 to 5."
            ),
        }
    }
}
