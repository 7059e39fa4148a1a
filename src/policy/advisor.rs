//! Policy recommendations for a CO2 level.

use std::sync::Arc;

use crate::domain::PolicyList;
use crate::error::FetchError;
use crate::policy::gemini::TextGenerator;
use crate::policy::parse::parse_policies;
use crate::policy::prompt::PromptKind;

pub struct PolicyAdvisor {
    generator: Arc<dyn TextGenerator>,
}

impl PolicyAdvisor {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Generate recommendations for `co2_level`.
    ///
    /// Makes exactly one generator call. A failed call, or output that parses
    /// to nothing, is a `PolicyGeneration` error; never an empty list.
    pub async fn recommend(&self, co2_level: Option<f64>) -> Result<PolicyList, FetchError> {
        let kind = PromptKind::select(co2_level);
        tracing::info!(?kind, "generating policy recommendations");

        let text = self.generator.generate(&kind.render()).await.inspect_err(|e| {
            tracing::error!("policy generation failed: {e}");
        })?;

        let policies = parse_policies(&text);
        if policies.is_empty() {
            return Err(FetchError::PolicyGeneration(
                "model output contained no recommendations".to_string(),
            ));
        }
        if kind.expects_list() && policies.len() == 1 {
            tracing::debug!("expected a numbered list but model answered with one paragraph");
        }
        Ok(policies)
    }
}
