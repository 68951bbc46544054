//! Multi-turn intake conversations against a stub LLM.

use std::sync::Arc;

use async_trait::async_trait;

use vitta::chat::{ChatAssistant, Session};
use vitta::config::DEFAULT_SYSTEM_PROMPT;
use vitta::error::LlmError;
use vitta::llm::{CompletionRequest, CompletionResponse, LlmProvider, Role};
use vitta::profile::{IncomeLevel, KeywordExtractor};
use vitta::recommend::{NO_MATCH_MESSAGE, ProductCatalog};

/// Stub LLM provider (no real API calls).
struct StubLlm;

#[async_trait]
impl LlmProvider for StubLlm {
    fn model_name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        Ok(CompletionResponse {
            content: "Baik, ceritakan lebih lanjut.".to_string(),
            input_tokens: 0,
            output_tokens: 0,
        })
    }
}

fn assistant_with(catalog: ProductCatalog) -> ChatAssistant {
    ChatAssistant::new(
        Arc::new(StubLlm),
        Arc::new(KeywordExtractor::default_rules()),
        Arc::new(catalog),
        DEFAULT_SYSTEM_PROMPT,
    )
}

#[tokio::test]
async fn profile_builds_up_over_turns_until_recommendation() {
    let assistant = assistant_with(ProductCatalog::builtin().unwrap());
    let mut session = Session::new();

    let script = [
        "Halo, saya mau tanya soal asuransi",
        "Saya pedagang di pasar",
        "Penghasilan sebulan sekitar 7 juta",
        "Saya punya 1 anak",
        "Saya khawatir soal biaya sekolah anak nanti",
    ];
    for line in script {
        let outcome = assistant.process_turn(&mut session, line).await;
        assert!(outcome.recommendation.is_none(), "too early at: {line}");
    }
    assert_eq!(session.profile.income_level, Some(IncomeLevel::Medium));
    assert_eq!(session.profile.missing_fields().len(), 1);

    let outcome = assistant
        .process_turn(&mut session, "Kalau bisa yang syariah ya")
        .await;
    let result = outcome.recommendation.expect("profile is complete now");
    assert!(
        result
            .recommendations
            .iter()
            .any(|r| r.product.name == "Asuransi Pendidikan Anak")
    );
    assert!(result.recommendations.iter().all(|r| r.product.is_sharia_compliant));

    // user + reply per turn, plus the rendered recommendation
    assert_eq!(session.history().len(), 6 * 2 + 1);
    assert_eq!(session.history().last().unwrap().role, Role::Assistant);
}

#[tokio::test]
async fn changed_profile_gets_fresh_recommendation() {
    let assistant = assistant_with(ProductCatalog::builtin().unwrap());
    let mut session = Session::new();

    let first = assistant
        .process_turn(
            &mut session,
            "saya kurir, gaji kecil, belum punya anak, takut hp rusak, konvensional saja",
        )
        .await;
    assert!(first.recommendation.is_some());

    let second = assistant
        .process_turn(&mut session, "oh iya, saya juga takut kecelakaan")
        .await;
    let result = second.recommendation.expect("new concern re-runs the engine");
    assert!(
        result
            .recommendations
            .iter()
            .any(|r| r.product.name == "Asuransi Kecelakaan Diri")
    );
}

#[tokio::test]
async fn empty_catalog_renders_no_match_message() {
    let assistant = assistant_with(ProductCatalog::new(vec![]).unwrap());
    let mut session = Session::new();

    let outcome = assistant
        .process_turn(
            &mut session,
            "saya kurir, gaji kecil, belum punya anak, takut kecelakaan, konvensional saja",
        )
        .await;

    let result = outcome.recommendation.unwrap();
    assert!(result.recommendations.is_empty());
    assert_eq!(session.history().last().unwrap().content, NO_MATCH_MESSAGE);
}
